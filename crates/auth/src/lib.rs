//! `taskflow-auth`: authentication and authorization core.
//!
//! - token issuance and validation (HS512 JWT)
//! - per-request principal resolution from a bearer header
//! - the role hierarchy and the ownership-based authorization policy
//! - accounts and the password hashing seam
//!
//! Nothing here knows about HTTP or storage engines.

pub mod account;
pub mod claims;
pub mod password;
pub mod policy;
pub mod principal;
pub mod resolver;
pub mod roles;
pub mod token;

pub use account::{UserAccount, normalize_email, validate_new_password, validate_registration};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
pub use policy::{
    AuthorizationPolicy, CommentOp, CommentSnapshot, CommentThread, CommentThreadOp, Decision, DenialReason,
    Resource, TaskBoard, TaskBoardOp, TaskOp, TaskSnapshot, UserDirectory, UserDirectoryOp,
};
pub use principal::{LookupError, Principal, PrincipalStore};
pub use resolver::{PrincipalResolver, ResolveError, extract_bearer};
pub use roles::{Role, UnknownRoleError};
pub use token::{IssueError, IssuedToken, MalformedTokenError, TokenConfigError, TokenService, TokenVerifier};
