//! Authorization gates.
//!
//! - **Gate A** [`require_auth`]: runs the [`IdentityPropagator`]; on success
//!   the request continues with an [`AuthenticatedContext`] attached, on
//!   failure the wrapped handler never runs.
//! - **Gate B** [`require_role`]: only meaningful behind Gate A; compares the
//!   attached role against the route's required [`Role`].
//!
//! Compose with `route_layer`, adding Gate B first so Gate A wraps it:
//!
//! ```ignore
//! Router::new()
//!     .route("/admin", get(handler))
//!     .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
//!     .route_layer(middleware::from_fn_with_state(propagator, require_auth));
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use super::response::ErrResponse;
use crate::auth::{
    AuthenticatedContext, AuthorizationDenied, IdentityPropagator, Role,
    audit::{self, AuditEvent},
};

/// Gate A: the request must carry a valid, live credential.
pub async fn require_auth(State(propagator): State<IdentityPropagator>, request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match propagator.authenticate(request).await {
        Ok((request, _context)) => next.run(request).await,
        Err(e) if e.is_store_fault() => {
            error!(path = %path, error = %e, "Revocation store unavailable");
            ErrResponse::new("credential store unavailable")
                .with_detail(e.to_string())
                .respond(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Rejected credential");
            ErrResponse::new("not find auth info")
                .with_detail(e.to_string())
                .unauthorized()
        }
    }
}

/// Gate B: the authenticated caller must hold `required`.
pub async fn require_role(State(required): State<Role>, request: Request<Body>, next: Next) -> Response {
    let Some(context) = request.extensions().get::<AuthenticatedContext>().copied() else {
        warn!(path = %request.uri().path(), "Role gate reached without an authenticated context");
        return ErrResponse::new("not find auth info").unauthorized();
    };

    match authorize(&context, required) {
        Ok(()) => next.run(request).await,
        Err(denied) => {
            warn!(subject = %context.subject, role = %context.role, required = %required, "Role check failed");
            audit::emit(&AuditEvent::forbidden(context.subject, context.role, required));
            let message = if required == Role::Admin {
                "not admin"
            } else {
                "insufficient role"
            };
            ErrResponse::new(message)
                .with_detail(denied.to_string())
                .respond(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Check `context` against `required`.
///
/// # Errors
///
/// [`AuthorizationDenied`] if the role is insufficient.
pub fn authorize(context: &AuthenticatedContext, required: Role) -> Result<(), AuthorizationDenied> {
    if context.role.satisfies(required) {
        Ok(())
    } else {
        Err(AuthorizationDenied {
            required,
            actual: context.role,
        })
    }
}
