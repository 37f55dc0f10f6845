//! Error taxonomy for credential issuance, validation and authorization.

use thiserror::Error;

use super::claims::Role;

/// Key material could not be loaded. Fatal at startup.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    /// The private signing key is not a usable RSA PEM.
    #[error("private key: {0}")]
    PrivateKey(#[source] jsonwebtoken::errors::Error),

    /// The public verification key is not a usable RSA PEM.
    #[error("public key: {0}")]
    PublicKey(#[source] jsonwebtoken::errors::Error),

    /// The keys parsed but a probe signature did not round-trip.
    #[error("key pair self-test failed: {0}")]
    SelfTest(String),

    /// A key file could not be read.
    #[error("failed to read key file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Revocation store failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No live entry for the credential ID.
    #[error("no entry for {0:?}")]
    NotFound(String),

    /// The backend is unreachable or returned an error.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Issuance failures. No credential is returned when any of these occur.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The validity window is not a positive whole number of seconds.
    #[error("validity window must be a positive whole number of seconds, got {0:?}")]
    InvalidValidity(std::time::Duration),

    /// The revocation entry could not be written; nothing was signed.
    #[error("failed to register credential: {0}")]
    Store(#[source] StoreError),

    /// Signing the claims failed.
    #[error("failed to sign credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Reasons an inbound credential is not trusted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The request carried no bearer credential.
    #[error("missing bearer credential")]
    MissingCredential,

    /// Signature invalid, unparseable, or claims do not fit the schema.
    #[error("malformed or forged credential: {0}")]
    MalformedOrForged(String),

    /// Signed expiry is not after the current time.
    #[error("credential expired")]
    Expired,

    /// No live revocation entry exists for the credential ID.
    #[error("credential {0:?} revoked or unknown")]
    RevokedOrUnknown(String),

    /// The revocation store could not be consulted.
    #[error("revocation store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ValidationError {
    /// Whether this is an infrastructure fault rather than a refusal of the caller.
    #[must_use]
    pub fn is_store_fault(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Authenticated, but the role does not satisfy the route.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("role {actual} does not satisfy required role {required}")]
pub struct AuthorizationDenied {
    /// Role the route requires.
    pub required: Role,
    /// Role the caller holds.
    pub actual: Role,
}
