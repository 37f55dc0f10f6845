//! Credential gate server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::AppState;
use super::login::StaticUserDirectory;
use super::router::create_router;
use crate::auth::{InMemoryRevocationStore, KeyMaterial, RedisRevocationStore, RevocationStore, spawn_reaper};
use crate::clock::SystemClock;
use crate::config::{Config, StoreBackend};
use crate::{Error, Result};

/// Credential gate server
pub struct Server {
    config: Config,
    state: Arc<AppState>,
    /// Present when the in-memory backend is used, for the reaper.
    memory_store: Option<Arc<InMemoryRevocationStore>>,
}

impl Server {
    /// Load keys, connect the revocation store and wire the services.
    ///
    /// # Errors
    ///
    /// Fails if the key pair cannot be loaded or the store is unreachable.
    pub async fn new(config: Config) -> Result<Self> {
        let keys = Arc::new(KeyMaterial::from_pem_files(
            &config.auth.private_key_path,
            &config.auth.public_key_path,
        )?);
        info!(
            private_key = %config.auth.private_key_path.display(),
            public_key = %config.auth.public_key_path.display(),
            "Loaded signing keys"
        );

        let mut memory_store = None;
        let store: Arc<dyn RevocationStore> = match config.store.backend {
            StoreBackend::Memory => {
                let store = Arc::new(InMemoryRevocationStore::new());
                memory_store = Some(Arc::clone(&store));
                store
            }
            StoreBackend::Redis => Arc::new(RedisRevocationStore::connect(&config.store.redis_url).await?),
        };

        let directory = StaticUserDirectory::from_config(&config.auth.users)?;
        if directory.is_empty() {
            warn!("No users configured - /login will reject every request");
        }

        let state = Arc::new(AppState::build(
            keys,
            store,
            Arc::new(SystemClock),
            Arc::new(directory),
            &config.auth.issuer,
            config.auth.token_ttl,
        ));

        Ok(Self {
            config,
            state,
            memory_store,
        })
    }

    /// Serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        let reaper = self.memory_store.as_ref().map(|store| {
            spawn_reaper(
                Arc::clone(store),
                self.config.store.reap_interval,
                shutdown_tx.subscribe(),
            )
        });

        let app = create_router(Arc::clone(&self.state), self.config.server.request_timeout);
        let listener = TcpListener::bind(addr).await?;

        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            store = ?self.config.store.backend,
            token_ttl_secs = self.config.auth.token_ttl.as_secs(),
            "Listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        if let Some(handle) = reaper {
            let _ = handle.await;
        }

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
