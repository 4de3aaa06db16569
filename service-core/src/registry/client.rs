use super::descriptor::{AgentService, CatalogEntry, ServiceDescriptor};
use super::error::RegistryError;
use crate::config::RegistrySettings;
use crate::observability::TracedClientExt;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// The four registry calls the services rely on.
///
/// Every call is a single request: retrying is the caller's decision.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Base URL of the registry, for logs and status pages.
    fn endpoint(&self) -> &str;

    /// `PUT /v1/agent/service/register`. Re-registering an id overwrites it.
    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<(), RegistryError>;

    /// `PUT /v1/agent/service/deregister/{id}`.
    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError>;

    /// `GET /v1/agent/service/{id}`; `None` when the registry answers 404.
    async fn service(&self, service_id: &str) -> Result<Option<AgentService>, RegistryError>;

    /// `GET /v1/catalog/service/{name}`, in registry order.
    async fn catalog(&self, name: &str) -> Result<Vec<CatalogEntry>, RegistryError>;
}

/// [`RegistryClient`] over the Consul HTTP API.
#[derive(Clone)]
pub struct HttpRegistryClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRegistryClient {
    pub fn new(settings: &RegistrySettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: settings.request_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

async fn ensure_success(response: Response) -> Result<Response, RegistryError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<(), RegistryError> {
        let url = self.url("/agent/service/register");
        let response = self
            .client
            .traced_put(&url)
            .timeout(self.timeout)
            .json(&descriptor.to_registration())
            .send()
            .await?;

        ensure_success(response).await.map(|_| ())
    }

    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError> {
        let url = self.url(&format!("/agent/service/deregister/{}", service_id));
        let response = self
            .client
            .traced_put(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        ensure_success(response).await.map(|_| ())
    }

    async fn service(&self, service_id: &str) -> Result<Option<AgentService>, RegistryError> {
        let url = self.url(&format!("/agent/service/{}", service_id));
        let response = self
            .client
            .traced_get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let service = ensure_success(response).await?.json::<AgentService>().await?;
        Ok(Some(service))
    }

    async fn catalog(&self, name: &str) -> Result<Vec<CatalogEntry>, RegistryError> {
        let url = self.url(&format!("/catalog/service/{}", name));
        let response = self
            .client
            .traced_get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        let entries = ensure_success(response)
            .await?
            .json::<Vec<CatalogEntry>>()
            .await?;
        Ok(entries)
    }
}
