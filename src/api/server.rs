//! API Server
//!
//! Router assembly, middleware stack and graceful shutdown.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, metrics_middleware, request_id_middleware},
    routes::create_router,
};
use crate::{casino::Casino, config::CasinoConfig};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Install the global `tracing` subscriber; `RUST_LOG` wins over `default_filter`
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Build the application with its middleware stack
pub fn create_app(casino: Arc<Casino>, config: &CasinoConfig) -> axum::Router {
    let state = Arc::new(AppState {
        casino,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics_enabled: config.monitoring.enable_metrics,
    });

    create_router(state.clone())
        .layer(axum::middleware::from_fn_with_state(state, metrics_middleware))
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS layer (before timeout to handle preflight)
        .layer(create_cors_layer(config.server.cors_origins.clone()))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    config: CasinoConfig,
    casino: Arc<Casino>,
}

impl ApiServer {
    pub fn new(config: CasinoConfig, casino: Arc<Casino>) -> Self {
        Self { config, casino }
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.socket_addr()?;
        let app = create_app(self.casino.clone(), &self.config);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("CancinHub API listening on http://{}", listener.local_addr()?);
        self.log_server_info();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }

    fn log_server_info(&self) {
        info!("   Data directory: {}", self.config.storage.data_dir.display());
        info!("   Settlement mode: {}", self.config.settlement.mode);
        info!("   CORS: {:?}", self.config.server.cors_origins);
        info!("   Request timeout: {}s", self.config.server.request_timeout_secs);
        info!("   Metrics enabled: {}", self.config.monitoring.enable_metrics);
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
