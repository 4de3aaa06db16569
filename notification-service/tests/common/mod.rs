#![allow(dead_code)]

use notification_service::config::{LifecycleSettings, NotificationConfig, ServiceSettings};
use notification_service::startup::Application;
use service_core::config::{Config as CoreConfig, RegistrySettings};
use service_core::registry::RegistrationState;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub service_id: String,
    pub registration_state: RegistrationState,
    pub liveness_running: bool,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<std::io::Result<()>>,
}

pub fn test_config(registry_url: &str, max_attempts: u32) -> NotificationConfig {
    NotificationConfig {
        common: CoreConfig { port: 0 },
        registry: RegistrySettings::new(registry_url).with_timeout(Duration::from_secs(1)),
        service: ServiceSettings {
            name: "notify".to_string(),
            id: None,
            address: "127.0.0.1".to_string(),
            tags: vec!["notification".to_string()],
            check_interval_secs: 10,
            check_timeout_secs: 5,
        },
        lifecycle: LifecycleSettings {
            max_attempts,
            retry_delay: Duration::from_millis(10),
            liveness_interval: Duration::from_millis(20),
        },
    }
}

/// Registry that accepts registration and deregistration.
pub async fn healthy_registry() -> MockServer {
    let registry = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&registry)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v1/agent/service/deregister/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&registry)
        .await;
    registry
}

/// Number of requests the registry received for paths starting with `prefix`.
pub async fn requests_to(registry: &MockServer, prefix: &str) -> usize {
    registry
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path().starts_with(prefix))
        .count()
}

impl TestApp {
    pub async fn spawn(registry: &MockServer) -> Self {
        Self::spawn_with(test_config(&registry.uri(), 3)).await
    }

    pub async fn spawn_with(config: NotificationConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let service_id = app.service_id().to_string();
        let registration_state = app.registration_state();
        let liveness_running = app.liveness_running();

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(app.run_until_stopped(async move {
            rx.await.ok();
        }));

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            service_id,
            registration_state,
            liveness_running,
            shutdown: Some(tx),
            server,
        }
    }

    /// Trigger graceful shutdown and wait for the server task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        (&mut self.server)
            .await
            .expect("server task panicked")
            .expect("server returned an error");
    }
}
