//! Credential Gate Library
//!
//! Stateful bearer-credential authentication for HTTP services.
//!
//! # Features
//!
//! - **Signed credentials**: RS256 tokens carrying subject, role and expiry
//! - **Server-side revocation**: every credential must also be present in a
//!   revocation store (in-memory or Redis) to be accepted
//! - **Two gates**: authentication (Gate A) attaches an
//!   [`auth::AuthenticatedContext`] to the request; authorization (Gate B)
//!   checks its role
//! - **Injectable clock**: expiry is decided against a [`clock::Clock`], so
//!   tests pin time with [`clock::FixedClock`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string()))?,
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string()))?,
    }

    Ok(())
}
