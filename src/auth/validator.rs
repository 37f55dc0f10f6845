//! Credential validation: signature, expiry, then liveness.
//!
//! Checks run cheapest first and short-circuit:
//!
//! 1. signature and claim shape → [`ValidationError::MalformedOrForged`]
//! 2. `exp > now` → [`ValidationError::Expired`]
//! 3. revocation entry present → [`ValidationError::RevokedOrUnknown`] /
//!    [`ValidationError::StoreUnavailable`]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::claims::{Credential, SubjectId};
use super::error::{StoreError, ValidationError};
use super::keys::KeyMaterial;
use super::store::RevocationStore;

/// A credential that passed all three checks, plus the subject its
/// revocation entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCredential {
    /// Verified claims.
    pub credential: Credential,
    /// Subject ID from the live revocation entry.
    pub subject: SubjectId,
}

/// Verifies inbound credentials against key material and the revocation store.
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<KeyMaterial>,
    store: Arc<dyn RevocationStore>,
    issuer: String,
}

impl TokenValidator {
    /// Create a validator accepting credentials from `issuer`.
    #[must_use]
    pub fn new(keys: Arc<KeyMaterial>, store: Arc<dyn RevocationStore>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            store,
            issuer: issuer.into(),
        }
    }

    /// Validate raw credential bytes at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`ValidationError`].
    pub async fn validate(&self, raw: &[u8], now: DateTime<Utc>) -> Result<ValidatedCredential, ValidationError> {
        let token = std::str::from_utf8(raw)
            .map_err(|_| ValidationError::MalformedOrForged("credential is not UTF-8".to_string()))?;

        let claims = self
            .keys
            .verify(token)
            .map_err(|e| ValidationError::MalformedOrForged(e.to_string()))?;
        if claims.iss != self.issuer {
            return Err(ValidationError::MalformedOrForged(format!(
                "unexpected issuer: {}",
                claims.iss
            )));
        }
        let credential = Credential::try_from(claims).map_err(ValidationError::MalformedOrForged)?;

        if !credential.is_live_at(now) {
            debug!(jti = %credential.id, exp = %credential.expires_at, "Credential expired");
            return Err(ValidationError::Expired);
        }

        let subject = match self.store.load(&credential.id).await {
            Ok(subject) => subject,
            Err(StoreError::NotFound(_)) => return Err(ValidationError::RevokedOrUnknown(credential.id)),
            Err(StoreError::Backend(e)) => return Err(ValidationError::StoreUnavailable(e)),
        };

        Ok(ValidatedCredential { credential, subject })
    }
}
