//! Application startup and lifecycle management.

use crate::config::GatewayConfig;
use crate::services::{InMemorySessionStore, KnowledgeRagAdapter, QueryService, RagAdapter, SessionStore};
use crate::{build_router, AppState};
use chrono::Utc;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application, initializing the adapter from configuration.
    ///
    /// Adapter failures are logged and leave the service degraded.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let adapter: Option<Arc<dyn RagAdapter>> =
            match KnowledgeRagAdapter::from_config(&config).await {
                Ok(adapter) => Some(Arc::new(adapter)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        provider = config.llm.provider.as_str(),
                        "Adapter initialization failed, serving in degraded mode"
                    );
                    None
                }
            };

        Self::build_with_adapter(config, adapter).await
    }

    /// Build the application around an already constructed adapter.
    pub async fn build_with_adapter(
        config: GatewayConfig,
        adapter: Option<Arc<dyn RagAdapter>>,
    ) -> Result<Self, AppError> {
        let sessions: Arc<dyn SessionStore> =
            Arc::new(InMemorySessionStore::new(config.sessions.max_sessions));
        let query_service = QueryService::new(sessions, adapter);

        let state = AppState {
            config: config.clone(),
            query_service,
        };

        // port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            provider = state.query_service.provider().unwrap_or("none"),
            "Query gateway listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let reaper = self.state.config.sessions.idle_timeout.map(|idle_timeout| {
            spawn_idle_reaper(self.state.query_service.sessions().clone(), idle_timeout)
        });

        let router = build_router(self.state);
        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(reaper) = reaper {
            reaper.abort();
        }

        result.map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}

/// Periodically drop sessions idle for longer than `idle_timeout`.
fn spawn_idle_reaper(sessions: Arc<dyn SessionStore>, idle_timeout: Duration) -> JoinHandle<()> {
    let period = (idle_timeout / 2).max(Duration::from_secs(1));
    tracing::info!(
        idle_timeout_secs = idle_timeout.as_secs(),
        "Starting idle session reaper"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Ok(idle) = chrono::Duration::from_std(idle_timeout) else {
                tracing::error!("Idle timeout out of range, stopping reaper");
                return;
            };
            sessions.evict_idle(Utc::now() - idle).await;
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
