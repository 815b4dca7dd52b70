//! Application startup and lifecycle management.

use crate::config::{GistBackend, RelayConfig};
use crate::handlers::{
    create_gist, fetch_gist, health_check, metrics_endpoint, readiness_check,
};
use crate::services::{GistStore, GitHubGistClient, InMemoryGistStore};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gists: Arc<dyn GistStore>,
    /// Whether `POST /api` is routed.
    pub allow_create: bool,
}

impl AppState {
    pub fn new(gists: Arc<dyn GistStore>, allow_create: bool) -> Self {
        Self {
            gists,
            allow_create,
        }
    }
}

/// Build the gist store selected by configuration.
///
/// Fails when creation is enabled on the GitHub backend without a token.
pub fn build_gist_store(config: &RelayConfig) -> Result<Arc<dyn GistStore>, AppError> {
    match config.github.backend {
        GistBackend::Github => {
            let client = GitHubGistClient::new(&config.github)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

            if config.sharing.allow_create && !client.can_create() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Gist creation is enabled but no GitHub token is configured"
                )));
            }

            tracing::info!(
                api = %config.github.api_base_url,
                raw = %config.github.raw_base_url,
                "Initialized GitHub gist client"
            );
            Ok(Arc::new(client))
        }
        GistBackend::Memory => {
            tracing::warn!("Using in-memory gist store; shared notebooks are lost on restart");
            Ok(Arc::new(InMemoryGistStore::new()))
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = if state.allow_create {
        get(fetch_gist).post(create_gist)
    } else {
        get(fetch_gist)
    };

    Router::new()
        .route("/api", api)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        // Notebook size is bounded by the provider, not here.
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let gists = build_gist_store(&config)?;
        let state = AppState::new(gists, config.sharing.allow_create);
        Self::build_with_state(&config, state).await
    }

    /// Build the application around an already constructed state.
    pub async fn build_with_state(config: &RelayConfig, state: AppState) -> Result<Self, AppError> {
        if !state.allow_create {
            tracing::info!("Gist creation disabled; POST /api is not routed");
        }

        let address = config.common.bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Gist relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
