//! Identity propagation from a validated credential into the request.
//!
//! The authenticated identity travels as a typed [`AuthenticatedContext`]
//! in the request's extensions; downstream handlers read it with
//! `Extension<AuthenticatedContext>` instead of re-validating.

use std::sync::Arc;

use axum::http::{HeaderMap, Request, header};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::audit::{self, AuditEvent};
use super::claims::{Role, SubjectId};
use super::error::ValidationError;
use super::validator::TokenValidator;
use crate::clock::Clock;

/// Request-scoped identity derived from a validated credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticatedContext {
    /// Subject the credential speaks for.
    pub subject: SubjectId,
    /// Role claim.
    pub role: Role,
}

impl AuthenticatedContext {
    /// Whether the caller holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extract the bearer credential from an `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
}

/// Validates a request's credential and attaches the resulting identity.
#[derive(Clone)]
pub struct IdentityPropagator {
    validator: TokenValidator,
    clock: Arc<dyn Clock>,
}

impl IdentityPropagator {
    /// Create a propagator reading time from `clock`.
    #[must_use]
    pub fn new(validator: TokenValidator, clock: Arc<dyn Clock>) -> Self {
        Self { validator, clock }
    }

    /// Validate `request`'s credential at the clock's current time.
    ///
    /// # Errors
    ///
    /// As [`IdentityPropagator::derive_context`].
    pub async fn authenticate<B>(&self, request: Request<B>) -> Result<(Request<B>, AuthenticatedContext), ValidationError> {
        let now = self.clock.now();
        self.derive_context(request, now).await
    }

    /// Validate `request`'s credential at `now`.
    ///
    /// On success returns the request with an [`AuthenticatedContext`]
    /// inserted into its extensions, plus the context itself. On failure the
    /// request is dropped, so an unauthenticated request cannot be forwarded
    /// by mistake.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingCredential`] if no bearer credential is
    /// present, otherwise whatever [`TokenValidator::validate`] reports.
    pub async fn derive_context<B>(
        &self,
        mut request: Request<B>,
        now: DateTime<Utc>,
    ) -> Result<(Request<B>, AuthenticatedContext), ValidationError> {
        let result = match bearer_token(request.headers()) {
            Some(token) => self.validator.validate(token.as_bytes(), now).await,
            None => Err(ValidationError::MissingCredential),
        };

        let validated = match result {
            Ok(validated) => validated,
            Err(e) => {
                audit::emit(&AuditEvent::rejected(&e));
                return Err(e);
            }
        };

        let context = AuthenticatedContext {
            subject: validated.subject,
            role: validated.credential.role,
        };
        debug!(subject = %context.subject, role = %context.role, "Authenticated request");
        audit::emit(&AuditEvent::used(&validated.credential.id, context.subject, context.role));

        request.extensions_mut().insert(context);
        Ok((request, context))
    }
}
