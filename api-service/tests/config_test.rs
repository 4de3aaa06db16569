mod common;

use common::{yaml_config, TestApp};
use wiremock::MockServer;

#[tokio::test]
async fn home_serves_configuration_document() {
    let registry = MockServer::start().await;
    let file = yaml_config(
        "app:\n  name: api-principal\n  maxRequestsPerMinute: 120\nfeatures:\n  notifications: true\n",
    );
    let app = TestApp::spawn(&registry, file.path()).await;

    let (status, body) = app.get_json("/").await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "API Principal funcionando");
    assert_eq!(body["config"]["app"]["name"], "api-principal");
    assert_eq!(body["config"]["app"]["maxRequestsPerMinute"], 120);
    assert_eq!(body["config"]["features"]["notifications"], true);
    assert_eq!(body["config_version"], 1);
}

#[tokio::test]
async fn reload_publishes_next_version() {
    let registry = MockServer::start().await;
    let file = yaml_config("mode: first\n");
    let app = TestApp::spawn(&registry, file.path()).await;

    std::fs::write(file.path(), "mode: second\n").expect("rewrite yaml");

    let response = reqwest::Client::new()
        .post(format!("{}/config/reload", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let reloaded: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(reloaded["version"], 2);

    let (_, body) = app.get_json("/config").await;
    assert_eq!(body["version"], 2);
    assert_eq!(body["config"]["mode"], "second");
}

#[tokio::test]
async fn broken_reload_keeps_serving_previous_snapshot() {
    let registry = MockServer::start().await;
    let file = yaml_config("mode: first\n");
    let app = TestApp::spawn(&registry, file.path()).await;

    std::fs::write(file.path(), "mode: [unterminated\n").expect("rewrite yaml");

    let response = reqwest::Client::new()
        .post(format!("{}/config/reload", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 500);

    let (_, body) = app.get_json("/config").await;
    assert_eq!(body["version"], 1);
    assert_eq!(body["config"]["mode"], "first");
}

#[tokio::test]
async fn health_check_works() {
    let registry = MockServer::start().await;
    let file = yaml_config("{}\n");
    let app = TestApp::spawn(&registry, file.path()).await;

    let (status, body) = app.get_json("/health").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "api-service");
}
