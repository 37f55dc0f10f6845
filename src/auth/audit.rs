//! Audit logging for credential lifecycle events.
//!
//! Every event is emitted via `tracing::info!` with the serialized event in
//! a single `audit` field, so a log aggregator can query it directly.
//!
//! | Event | When |
//! |-------|------|
//! | `token.issued` | A credential was registered and signed |
//! | `token.used` | A credential passed validation for a request |
//! | `token.rejected` | A credential failed signature, expiry or liveness checks |
//! | `token.store_unavailable` | Liveness could not be determined |
//! | `token.forbidden` | An authenticated caller lacked the route's role |

use serde::Serialize;

use super::claims::{Role, SubjectId};
use super::error::ValidationError;

/// Structured audit event.
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// Event type string (e.g. `"token.issued"`).
    pub event: &'static str,
    /// Credential ID, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Subject the credential speaks for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectId>,
    /// Role claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Human-readable reason for rejection events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEvent {
    /// `token.issued`
    #[must_use]
    pub fn issued(jti: &str, subject: SubjectId, role: Role) -> Self {
        Self {
            event: "token.issued",
            jti: Some(jti.to_string()),
            subject: Some(subject),
            role: Some(role),
            reason: None,
        }
    }

    /// `token.used`
    #[must_use]
    pub fn used(jti: &str, subject: SubjectId, role: Role) -> Self {
        Self {
            event: "token.used",
            jti: Some(jti.to_string()),
            subject: Some(subject),
            role: Some(role),
            reason: None,
        }
    }

    /// `token.rejected` or `token.store_unavailable`, depending on the error.
    #[must_use]
    pub fn rejected(err: &ValidationError) -> Self {
        let jti = match err {
            ValidationError::RevokedOrUnknown(jti) => Some(jti.clone()),
            _ => None,
        };
        Self {
            event: if err.is_store_fault() {
                "token.store_unavailable"
            } else {
                "token.rejected"
            },
            jti,
            subject: None,
            role: None,
            reason: Some(err.to_string()),
        }
    }

    /// `token.forbidden`
    #[must_use]
    pub fn forbidden(subject: SubjectId, role: Role, required: Role) -> Self {
        Self {
            event: "token.forbidden",
            jti: None,
            subject: Some(subject),
            role: Some(role),
            reason: Some(format!("requires role {required}")),
        }
    }
}

/// Emit an audit event.
pub fn emit(event: &AuditEvent) {
    match serde_json::to_string(event) {
        Ok(ref json) => tracing::info!(audit = %json, "credential audit"),
        Err(ref e) => tracing::warn!(error = %e, "Failed to serialize audit event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_revoked_event_carries_jti() {
        let event = AuditEvent::rejected(&ValidationError::RevokedOrUnknown("abc".to_string()));
        assert_eq!(event.event, "token.rejected");
        assert_eq!(event.jti.as_deref(), Some("abc"));
    }

    #[test]
    fn store_fault_has_its_own_event() {
        let event = AuditEvent::rejected(&ValidationError::StoreUnavailable("down".to_string()));
        assert_eq!(event.event, "token.store_unavailable");
        assert!(event.reason.unwrap().contains("down"));
    }

    #[test]
    fn issued_event_serializes_without_empty_fields() {
        let event = AuditEvent::issued("abc", SubjectId(7), Role::Admin);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "token.issued");
        assert_eq!(json["subject"], 7);
        assert_eq!(json["role"], "admin");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn emit_does_not_panic() {
        emit(&AuditEvent::forbidden(SubjectId(1), Role::Standard, Role::Admin));
    }
}
