//! Application startup for the primary API.

use crate::config::{ApiSettings, ConfigStore};
use crate::handlers::{current_config, health_check, home, metrics_endpoint, notify, reload_config};
use crate::services::NotificationClient;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use service_core::registry::{HttpRegistryClient, RegistryClient};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ApiSettings>,
    pub config: Arc<ConfigStore>,
    pub registry: Arc<dyn RegistryClient>,
    pub notifier: NotificationClient,
}

impl AppState {
    pub fn new(settings: ApiSettings, config: ConfigStore) -> Self {
        let registry: Arc<dyn RegistryClient> = Arc::new(HttpRegistryClient::new(&settings.registry));
        let notifier = NotificationClient::new(settings.forward_timeout);

        Self {
            settings: Arc::new(settings),
            config: Arc::new(config),
            registry,
            notifier,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/config", get(current_config))
        .route("/config/reload", post(reload_config))
        .route("/notify", get(notify))
        .route("/metrics", get(metrics_endpoint))
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
    state: AppState,
}

impl Application {
    /// Load the YAML document and bind the listener.
    pub async fn build(settings: ApiSettings) -> Result<Self, AppError> {
        let config = ConfigStore::load(&settings.config_path).map_err(|e| {
            tracing::error!(
                path = %settings.config_path.display(),
                error = %e,
                "Failed to read configuration document"
            );
            e
        })?;

        Self::build_with_state(AppState::new(settings, config)).await
    }

    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            registry = state.registry.endpoint(),
            capability = %state.settings.notify_capability,
            "API service ready"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
