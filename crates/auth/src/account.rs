use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskflow_core::{DomainResult, Entity, UserId, Validator};

use crate::{Principal, Role};

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_EMAIL_CHARS: usize = 254;

/// A registered account. The email is the principal identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// A fresh `User`-role account. `email` must already be normalized.
    pub fn register(email: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            email,
            password_hash,
            role: Role::User,
            enabled: true,
            locked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            identity: self.email.clone(),
            role: self.role,
            enabled: self.enabled,
            locked: self.locked,
        }
    }

    pub fn can_log_in(&self) -> bool {
        self.enabled && !self.locked
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Canonical form of an email identity: trimmed, lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Registration input checks. `email` is expected normalized.
pub fn validate_registration(email: &str, password: &str) -> DomainResult<()> {
    let mut v = Validator::new();
    v.check(!email.is_empty(), "email", "must not be blank")
        .check(
            email.is_empty() || is_plausible_email(email),
            "email",
            "must be a valid email address",
        )
        .check(email.chars().count() <= MAX_EMAIL_CHARS, "email", "is too long");
    check_password(&mut v, "password", password);
    v.finish()
}

/// New-password checks used on registration and password change.
pub fn validate_new_password(field: &str, password: &str) -> DomainResult<()> {
    let mut v = Validator::new();
    check_password(&mut v, field, password);
    v.finish()
}

fn check_password(v: &mut Validator, field: &str, password: &str) {
    if password.trim().is_empty() {
        v.check(false, field, "must not be blank");
    } else {
        v.check(
            password.chars().count() >= MIN_PASSWORD_CHARS,
            field,
            "must be at least 8 characters",
        );
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
