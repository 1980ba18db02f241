use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims carried by a session token.
///
/// Times are whole seconds since the Unix epoch, as registered by RFC 7519.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the principal identity (email).
    pub sub: String,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

impl TokenClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this, in [`crate::TokenService`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims { sub: "a@example.com".into(), iat, exp }
    }

    #[test]
    fn inside_window_is_valid() {
        let c = claims(1_000, 1_060);
        assert_eq!(validate_claims(&c, at(1_000)), Ok(()));
        assert_eq!(validate_claims(&c, at(1_059)), Ok(()));
    }

    #[test]
    fn expiry_is_exclusive() {
        let c = claims(1_000, 1_060);
        assert_eq!(validate_claims(&c, at(1_060)), Err(TokenValidationError::Expired));
        assert_eq!(validate_claims(&c, at(5_000)), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issue_time_is_rejected() {
        let c = claims(1_000, 1_060);
        assert_eq!(validate_claims(&c, at(999)), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn empty_or_inverted_window_is_rejected() {
        assert_eq!(
            validate_claims(&claims(1_000, 1_000), at(1_000)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
        assert_eq!(
            validate_claims(&claims(1_000, 900), at(950)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn timestamps_convert_to_datetimes() {
        let c = claims(1_700_000_000, 1_700_003_600);
        assert_eq!(c.issued_at(), Some(at(1_700_000_000)));
        assert_eq!(c.expires_at(), Some(at(1_700_003_600)));
    }
}
