#![allow(dead_code)]

use api_service::config::{ApiSettings, ConfigStore};
use api_service::startup::{AppState, Application};
use service_core::config::{Config as CoreConfig, RegistrySettings};
use std::path::Path;
use std::time::Duration;
use tokio::sync::oneshot;
use wiremock::MockServer;

pub struct TestApp {
    pub address: String,
    shutdown: Option<oneshot::Sender<()>>,
}

pub fn test_settings(registry_url: &str, config_path: &Path) -> ApiSettings {
    ApiSettings {
        common: CoreConfig { port: 0 },
        registry: RegistrySettings::new(registry_url).with_timeout(Duration::from_secs(2)),
        config_path: config_path.to_path_buf(),
        notify_capability: "notify".to_string(),
        lookup_timeout: Duration::from_millis(300),
        forward_timeout: Duration::from_secs(2),
    }
}

impl TestApp {
    /// App backed by `registry` and the YAML file at `config_path`.
    pub async fn spawn(registry: &MockServer, config_path: &Path) -> Self {
        let settings = test_settings(&registry.uri(), config_path);
        let config = ConfigStore::load(config_path).expect("Failed to load test configuration");
        Self::spawn_with(AppState::new(settings, config)).await
    }

    pub async fn spawn_with(state: AppState) -> Self {
        let app = Application::build_with_state(state)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(app.run_until_stopped(async move {
            rx.await.ok();
        }));

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
            shutdown: Some(tx),
        }
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let response = reqwest::Client::new()
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Failed to parse JSON"))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
    }
}

/// Temporary YAML configuration file.
pub fn yaml_config(contents: &str) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write yaml");
    file
}
