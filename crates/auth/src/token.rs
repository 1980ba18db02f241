use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};

/// Minimum HMAC key length accepted by [`TokenService::new`] (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("token secret must be at least {min} bytes (got {len})")]
    SecretTooShort { len: usize, min: usize },

    #[error("token lifetime must be at least one second")]
    TtlTooShort,
}

/// Why a token could not be issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("token could not be encoded: {0}")]
    Encode(String),

    #[error("token lifetime falls outside the representable time range")]
    OutOfRange,
}

/// Why a token was not accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedTokenError {
    #[error("token signature does not verify")]
    BadSignature,

    #[error("token could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Result of [`TokenService::issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Verification seam consumed by the principal resolver.
pub trait TokenVerifier: Send + Sync {
    fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool;

    fn subject_of_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, MalformedTokenError>;
}

/// Issues and validates HS512-signed session tokens.
///
/// The secret is fixed at construction; the service holds no mutable state and
/// can be shared behind an `Arc` across request handlers.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("algorithm", &ALGORITHM)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenConfigError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(TokenConfigError::SecretTooShort {
                len: secret.len(),
                min: MIN_SECRET_BYTES,
            });
        }

        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenConfigError::TtlTooShort)?;
        if ttl_secs < 1 {
            return Err(TokenConfigError::TtlTooShort);
        }

        // Time checks are done by `validate_claims` so that the clock can be injected.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unsigned_abs())
    }

    pub fn issue(&self, subject: &str) -> Result<IssuedToken, IssueError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now` (truncated to seconds).
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, IssueError> {
        let iat = now.timestamp();
        let exp = iat.saturating_add(self.ttl_secs);
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| IssueError::Encode(e.to_string()))?;

        let issued_at = claims.issued_at().ok_or(IssueError::OutOfRange)?;
        let expires_at = claims.expires_at().ok_or(IssueError::OutOfRange)?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    pub fn subject_of(&self, token: &str) -> Result<String, MalformedTokenError> {
        self.subject_of_at(token, Utc::now())
    }

    /// Verify signature, algorithm and time window; return the decoded claims.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, MalformedTokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => MalformedTokenError::BadSignature,
                _ => MalformedTokenError::Decode(e.to_string()),
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl TokenVerifier for TokenService {
    fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.verify_at(token, now) {
            Ok(_) => true,
            Err(MalformedTokenError::BadSignature) => {
                tracing::warn!("rejected token: signature does not verify");
                false
            }
            Err(e) => {
                tracing::debug!(reason = %e, "rejected token");
                false
            }
        }
    }

    fn subject_of_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, MalformedTokenError> {
        self.verify_at(token, now).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use proptest::prelude::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef-test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::from_secs(3600)).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn flip_signature_bit(token: &str, bit: usize) -> String {
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(sig).unwrap();
        bytes[bit / 8] ^= 1 << (bit % 8);
        format!("{head}.{}", URL_SAFE_NO_PAD.encode(bytes))
    }

    #[test]
    fn rejects_short_secret() {
        let err = TokenService::new("too-short", Duration::from_secs(60)).unwrap_err();
        assert_eq!(err, TokenConfigError::SecretTooShort { len: 9, min: 32 });
    }

    #[test]
    fn rejects_sub_second_ttl() {
        assert_eq!(
            TokenService::new(SECRET, Duration::from_millis(999)).unwrap_err(),
            TokenConfigError::TtlTooShort
        );
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", service());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn issuing_past_the_calendar_end_is_an_issue_error() {
        let err = service().issue_at("a@example.com", DateTime::<Utc>::MAX_UTC).unwrap_err();
        assert_eq!(err, IssueError::OutOfRange);
    }

    #[test]
    fn issued_token_is_valid_until_expiry() {
        let svc = service();
        let issued = svc.issue_at("alice@example.com", at(1_700_000_000)).unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(issued.issued_at, at(1_700_000_000));
        assert_eq!(issued.expires_at, at(1_700_003_600));

        assert!(svc.validate_at(&issued.token, at(1_700_000_000)));
        assert!(svc.validate_at(&issued.token, at(1_700_003_599)));
        assert!(!svc.validate_at(&issued.token, at(1_700_003_600)));
        assert!(!svc.validate_at(&issued.token, at(1_800_000_000)));
    }

    #[test]
    fn freshly_issued_token_validates_now() {
        let svc = service();
        let issued = svc.issue("alice@example.com").unwrap();
        assert!(svc.validate(&issued.token));
        assert_eq!(svc.subject_of(&issued.token).unwrap(), "alice@example.com");
    }

    #[test]
    fn token_from_the_future_is_rejected() {
        let svc = service();
        let issued = svc.issue_at("a@example.com", at(2_000)).unwrap();
        assert!(!svc.validate_at(&issued.token, at(1_999)));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = TokenService::new("another-secret-that-is-long-enough!!", Duration::from_secs(60)).unwrap();
        let issued = other.issue_at("a@example.com", at(1_000)).unwrap();
        let svc = service();
        assert!(!svc.validate_at(&issued.token, at(1_010)));
        assert_eq!(
            svc.subject_of_at(&issued.token, at(1_010)),
            Err(MalformedTokenError::BadSignature)
        );
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let claims = TokenClaims {
            sub: "a@example.com".into(),
            iat: 1_000,
            exp: 2_000,
        };
        let hs256 = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(!service().validate_at(&hs256, at(1_500)));
    }

    #[test]
    fn garbage_is_rejected() {
        let svc = service();
        for token in ["", "abc", "a.b.c", "....", "Bearer x.y.z"] {
            assert!(!svc.validate_at(token, at(1_000)), "{token:?}");
            assert!(matches!(
                svc.subject_of_at(token, at(1_000)),
                Err(MalformedTokenError::Decode(_))
            ));
        }
    }

    #[test]
    fn expired_token_has_no_subject() {
        let svc = service();
        let issued = svc.issue_at("a@example.com", at(1_000)).unwrap();
        assert_eq!(
            svc.subject_of_at(&issued.token, at(1_000 + 3_600)),
            Err(MalformedTokenError::Claims(TokenValidationError::Expired))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, ..ProptestConfig::default() })]

        /// Property: any single bit flipped in the signature invalidates the token.
        #[test]
        fn single_bit_flip_in_signature_invalidates(bit in 0usize..512) {
            let svc = service();
            let issued = svc.issue_at("bob@example.com", at(1_700_000_000)).unwrap();
            let tampered = flip_signature_bit(&issued.token, bit);
            prop_assert_ne!(&tampered, &issued.token);
            prop_assert!(!svc.validate_at(&tampered, at(1_700_000_001)));
        }

        /// Property: the subject survives issuance for arbitrary identities.
        #[test]
        fn subject_round_trips(identity in "\\PC{0,64}") {
            let svc = service();
            let issued = svc.issue_at(&identity, at(1_700_000_000)).unwrap();
            prop_assert_eq!(svc.subject_of_at(&issued.token, at(1_700_000_010)).unwrap(), identity);
        }

        /// Property: validity flips exactly at `exp`.
        #[test]
        fn validity_ends_at_expiry(iat in 0i64..4_000_000_000, offset in 0i64..7_200) {
            let svc = service();
            let issued = svc.issue_at("c@example.com", at(iat)).unwrap();
            let now = iat + offset;
            prop_assert_eq!(svc.validate_at(&issued.token, at(now)), now < iat + 3_600);
        }
    }
}
