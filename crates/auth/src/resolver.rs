use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::principal::{LookupError, Principal, PrincipalStore};
use crate::token::TokenVerifier;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme prefix is matched exactly (case-sensitive, single space).
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() { None } else { Some(token) }
}

/// Turns an `Authorization` header into the acting principal, if any.
///
/// Stateless: every call re-validates the token and re-reads the store.
#[derive(Clone)]
pub struct PrincipalResolver {
    tokens: Arc<dyn TokenVerifier>,
    principals: Arc<dyn PrincipalStore>,
}

impl PrincipalResolver {
    pub fn new(tokens: Arc<dyn TokenVerifier>, principals: Arc<dyn PrincipalStore>) -> Self {
        Self { tokens, principals }
    }

    pub fn resolve(&self, header: Option<&str>) -> Result<Option<Principal>, ResolveError> {
        self.resolve_at(header, Utc::now())
    }

    /// `Ok(None)` means anonymous: no header, another scheme, or an invalid token.
    pub fn resolve_at(&self, header: Option<&str>, now: DateTime<Utc>) -> Result<Option<Principal>, ResolveError> {
        let Some(token) = extract_bearer(header) else {
            tracing::debug!("no bearer token; resolving as anonymous");
            return Ok(None);
        };

        let identity = match self.tokens.subject_of_at(token, now) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(reason = %e, "invalid bearer token; resolving as anonymous");
                return Ok(None);
            }
        };

        match self.principals.find_principal(&identity)? {
            Some(principal) => {
                tracing::debug!(identity = %principal.identity, role = %principal.role, "resolved principal");
                Ok(Some(principal))
            }
            None => {
                tracing::warn!(identity = %identity, "token subject has no account");
                Err(ResolveError::PrincipalNotFound(identity))
            }
        }
    }
}

impl core::fmt::Debug for PrincipalResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrincipalResolver").finish_non_exhaustive()
    }
}
