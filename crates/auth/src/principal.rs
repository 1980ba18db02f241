use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// The acting identity for one request.
///
/// Built from the account store after a token resolves; carries only what the
/// authorization policy needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub identity: String,
    pub role: Role,
    pub enabled: bool,
    pub locked: bool,
}

impl Principal {
    /// An enabled, unlocked principal.
    pub fn active(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
            enabled: true,
            locked: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.locked
    }

    pub fn is(&self, identity: &str) -> bool {
        self.identity == identity
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("principal store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to principals by identity.
///
/// Lookups may block; they are the only I/O in principal resolution.
pub trait PrincipalStore: Send + Sync {
    fn find_principal(&self, identity: &str) -> Result<Option<Principal>, LookupError>;
}
