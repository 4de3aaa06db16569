use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use service_core::registry::ServiceInstance;
use std::time::Duration;

/// Forwards notification requests to a discovered instance.
#[derive(Clone)]
pub struct NotificationClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl NotificationClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// `POST {instance}/notify` and return the instance's JSON reply.
    pub async fn send(
        &self,
        instance: &ServiceInstance,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/notify", instance.base_url());

        let response = self
            .client
            .traced_post(&url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach notification service at {}: {}", url, e);
                if e.is_timeout() {
                    AppError::GatewayTimeout(format!("notification service at {}", url))
                } else {
                    AppError::BadGateway(format!("notification service unreachable: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Notification service refused");
            return Err(AppError::BadGateway(format!(
                "notification service returned {}",
                status
            )));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            AppError::BadGateway(format!("invalid notification service response: {}", e))
        })
    }
}
