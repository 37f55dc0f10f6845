//! HTTP router and handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::AppState;
use super::login::login_handler;
use super::middleware::{require_auth, require_role};
use crate::auth::{AuthenticatedContext, Role};

/// Create the router.
///
/// | Route | Gates |
/// |-------|-------|
/// | `GET /health` | none |
/// | `POST /login` | none |
/// | `GET /whoami` | A |
/// | `GET /admin` | A, then B (admin) |
///
/// `request_timeout` bounds each request; a timed-out request drops its
/// in-flight store call with it.
pub fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let propagator = state.propagator.clone();

    let authenticated: Router<Arc<AppState>> = Router::new()
        .route("/whoami", get(whoami_handler))
        .route_layer(middleware::from_fn_with_state(propagator.clone(), require_auth));

    let admin: Router<Arc<AppState>> = Router::new()
        .route("/admin", get(admin_handler))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
        .route_layer(middleware::from_fn_with_state(propagator, require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .merge(authenticated)
        .merge(admin)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /health`
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /whoami`
async fn whoami_handler(Extension(context): Extension<AuthenticatedContext>) -> Json<AuthenticatedContext> {
    Json(context)
}

/// `GET /admin`
async fn admin_handler() -> Json<Value> {
    Json(json!({ "message": "admin only" }))
}
