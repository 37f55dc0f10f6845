//! Signed access credentials: issue, validate, revoke, propagate.
//!
//! # Architecture
//!
//! ```text
//! login
//!   -> TokenIssuer.issue
//!        -> RevocationStore.save(jti -> user id, ttl)   register first
//!        -> KeyMaterial.sign(claims)                     then sign
//!
//! request
//!   -> IdentityPropagator.derive_context
//!        -> bearer_token(Authorization header)
//!        -> TokenValidator.validate
//!             -> KeyMaterial.verify        MalformedOrForged
//!             -> exp > now                 Expired
//!             -> RevocationStore.load      RevokedOrUnknown / StoreUnavailable
//!        -> AuthenticatedContext into request extensions
//! ```
//!
//! A credential is trusted only if all three validator checks pass. The
//! revocation entry is the source of truth for "still a valid session": an
//! operator deleting it revokes the credential before its signed expiry.

pub mod audit;
pub mod claims;
pub mod context;
pub mod error;
pub mod issuer;
pub mod keys;
pub mod redis_store;
pub mod store;
pub mod validator;

pub use claims::{Claims, Credential, Role, Subject, SubjectId};
pub use context::{AuthenticatedContext, IdentityPropagator, bearer_token};
pub use error::{AuthorizationDenied, IssueError, KeyLoadError, StoreError, ValidationError};
pub use issuer::TokenIssuer;
pub use keys::KeyMaterial;
pub use redis_store::RedisRevocationStore;
pub use store::{InMemoryRevocationStore, RevocationStore, spawn_reaper};
pub use validator::{TokenValidator, ValidatedCredential};
