//! Application startup and lifecycle management.
//!
//! Startup binds the listener, registers with the registry and, when that
//! works, starts the liveness loop. Shutdown runs the reverse: stop serving,
//! stop the loop, release the registration.

use crate::config::NotificationConfig;
use crate::handlers::{
    health_check, home, metrics_endpoint, registration_status, send_notification,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use service_core::registry::{
    HttpRegistryClient, InertCheck, LivenessLoop, Registration, RegistrationState,
    RegistryClient, ServiceDescriptor,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
///
/// `registration_state` is settled before the router starts and never
/// changes afterwards.
#[derive(Clone)]
pub struct AppState {
    pub descriptor: Arc<ServiceDescriptor>,
    pub registration_state: RegistrationState,
    pub registry: Arc<dyn RegistryClient>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/status", get(registration_status))
        .route("/notify", post(send_notification))
        .route("/metrics", get(metrics_endpoint))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::REQUEST_ID_HEADER)
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
    registration: Option<Registration>,
    liveness: Option<LivenessLoop>,
}

impl Application {
    /// Build against the registry named in `config`.
    pub async fn build(config: NotificationConfig) -> Result<Self, AppError> {
        let registry: Arc<dyn RegistryClient> = Arc::new(HttpRegistryClient::new(&config.registry));
        Self::build_with_registry(config, registry).await
    }

    /// Build against any registry client.
    ///
    /// Blocks until registration succeeds or its attempts run out. A failed
    /// registration is logged and the service still serves its local routes.
    pub async fn build_with_registry(
        config: NotificationConfig,
        registry: Arc<dyn RegistryClient>,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let descriptor = Arc::new(config.descriptor(port));
        tracing::info!(
            service_id = %descriptor.service_id,
            name = %descriptor.name,
            address = %descriptor.address,
            port,
            registry = registry.endpoint(),
            "Registering with service registry"
        );

        let policy = config.lifecycle.retry_policy();
        let registration =
            match Registration::acquire(registry.clone(), descriptor.clone(), &policy).await {
                Ok(registration) => Some(registration),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Continuing without registry; only local endpoints are reachable"
                    );
                    None
                }
            };

        let registration_state = if registration.is_some() {
            RegistrationState::Registered
        } else {
            RegistrationState::Failed
        };

        let liveness = registration.as_ref().map(|_| {
            LivenessLoop::spawn(
                descriptor.clone(),
                config.lifecycle.liveness_interval,
                Arc::new(InertCheck),
            )
        });

        Ok(Self {
            port,
            listener,
            state: AppState {
                descriptor,
                registration_state,
                registry,
            },
            registration,
            liveness,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn service_id(&self) -> &str {
        &self.state.descriptor.service_id
    }

    pub fn registration_state(&self) -> RegistrationState {
        self.state.registration_state
    }

    pub fn liveness_running(&self) -> bool {
        self.liveness
            .as_ref()
            .map(LivenessLoop::is_running)
            .unwrap_or(false)
    }

    /// Serve until `shutdown` resolves, then stop the liveness loop and
    /// deregister exactly once.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        tracing::info!("Notification service listening on port {}", self.port);
        let served = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Err(e) = &served {
            tracing::error!("HTTP server error: {}", e);
        }

        if let Some(liveness) = self.liveness {
            liveness.stop().await;
        }
        if let Some(registration) = self.registration {
            registration.release().await;
        }

        served
    }
}
