//! Credential issuance: register, then sign.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::audit::{self, AuditEvent};
use super::claims::{ACCESS_TOKEN_SUBJECT, Claims, Subject};
use super::error::IssueError;
use super::keys::KeyMaterial;
use super::store::RevocationStore;

/// Builds, registers and signs access credentials.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterial>,
    store: Arc<dyn RevocationStore>,
    issuer: String,
}

impl TokenIssuer {
    /// Create an issuer stamping `issuer` into every credential.
    #[must_use]
    pub fn new(keys: Arc<KeyMaterial>, store: Arc<dyn RevocationStore>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            store,
            issuer: issuer.into(),
        }
    }

    /// Issue a credential for `subject`, valid from `now` for `validity`.
    ///
    /// The revocation entry is written before signing, so a signed credential
    /// never exists without a live entry.
    ///
    /// # Errors
    ///
    /// [`IssueError::InvalidValidity`] if `validity` is under a second or
    /// has a fractional part, [`IssueError::Store`] if the entry cannot be
    /// written (nothing is signed), [`IssueError::Signing`] if signing fails.
    pub async fn issue(&self, subject: &Subject, now: DateTime<Utc>, validity: Duration) -> Result<String, IssueError> {
        // `exp` is whole seconds; a truncated window could be expired on arrival.
        if validity.as_secs() == 0 || validity.subsec_nanos() != 0 {
            return Err(IssueError::InvalidValidity(validity));
        }

        let jti = uuid::Uuid::new_v4().to_string();
        let iat = now.timestamp();
        let exp = iat.saturating_add(i64::try_from(validity.as_secs()).unwrap_or(i64::MAX));

        let claims = Claims {
            jti,
            iss: self.issuer.clone(),
            sub: ACCESS_TOKEN_SUBJECT.to_string(),
            iat,
            exp,
            role: subject.role,
            user_name: subject.name.clone(),
        };

        if let Err(e) = self.store.save(&claims.jti, subject.id, validity).await {
            error!(jti = %claims.jti, subject = %subject.id, error = %e, "Failed to register credential");
            return Err(IssueError::Store(e));
        }

        let signed = self.keys.sign(&claims).map_err(IssueError::Signing)?;
        debug!(jti = %claims.jti, subject = %subject.id, exp = claims.exp, "Issued credential");
        audit::emit(&AuditEvent::issued(&claims.jti, subject.id, subject.role));

        Ok(signed)
    }
}
