//! HTTP surface: login, authorization gates, router and server.

pub mod login;
pub mod middleware;
pub mod response;
mod router;
mod server;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{IdentityPropagator, KeyMaterial, RevocationStore, TokenIssuer, TokenValidator};
use crate::clock::Clock;

pub use login::{LoginService, StaticUserDirectory, UserDirectory};
pub use middleware::{authorize, require_auth, require_role};
pub use response::ErrResponse;
pub use router::create_router;
pub use server::Server;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Gate A's credential check
    pub propagator: IdentityPropagator,
    /// `/login` backend
    pub login: LoginService,
}

impl AppState {
    /// Wire issuer, validator, propagator and login service around shared
    /// keys, store and clock.
    #[must_use]
    pub fn build(
        keys: Arc<KeyMaterial>,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn UserDirectory>,
        issuer_name: &str,
        token_ttl: Duration,
    ) -> Self {
        let issuer = TokenIssuer::new(Arc::clone(&keys), Arc::clone(&store), issuer_name);
        let validator = TokenValidator::new(keys, store, issuer_name);
        Self {
            propagator: IdentityPropagator::new(validator, Arc::clone(&clock)),
            login: LoginService::new(directory, issuer, clock, token_ttl),
        }
    }
}
