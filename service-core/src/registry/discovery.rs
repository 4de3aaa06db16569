use super::client::RegistryClient;
use super::descriptor::CatalogEntry;
use super::error::RegistryError;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// A concrete provider of a capability, as listed by the registry catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInstance {
    pub service_id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl ServiceInstance {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}

impl From<CatalogEntry> for ServiceInstance {
    fn from(entry: CatalogEntry) -> Self {
        // An empty ServiceAddress means the service listens on its node address.
        let address = if entry.service_address.is_empty() {
            entry.node_address
        } else {
            entry.service_address
        };

        Self {
            service_id: entry.service_id,
            name: entry.service_name,
            address,
            port: entry.service_port,
        }
    }
}

/// Resolve `capability` to the first instance the registry lists.
///
/// One catalog request bounded by `timeout`; no retries and no balancing.
/// `Ok(None)` means the registry answered with an empty catalog, which is not
/// an error.
pub async fn lookup(
    client: &dyn RegistryClient,
    capability: &str,
    timeout: Duration,
) -> Result<Option<ServiceInstance>, RegistryError> {
    let entries = tokio::time::timeout(timeout, client.catalog(capability))
        .await
        .map_err(|_| {
            RegistryError::Timeout(format!(
                "catalog lookup for '{}' exceeded {}ms",
                capability,
                timeout.as_millis()
            ))
        })??;

    debug!(capability, instances = entries.len(), "Catalog lookup");

    Ok(entries.into_iter().next().map(ServiceInstance::from))
}
