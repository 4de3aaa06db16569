//! What a service publishes about itself, and the registry's JSON records.
//!
//! The registry speaks the Consul agent/catalog API, so the wire structs use
//! its PascalCase field names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Identity and health-check contract of one running service instance.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub service_id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: BTreeSet<String>,
    pub health_check_url: String,
    pub check_interval_secs: u64,
    pub check_timeout_secs: u64,
}

impl ServiceDescriptor {
    pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 10;
    pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 5;

    /// A descriptor with a fresh per-process id (`<name>-<8 hex>`) whose
    /// health check points at `/health` on the advertised address.
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        let name = name.into();
        let address = address.into();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            service_id: format!("{}-{}", name, &suffix[..8]),
            health_check_url: format!("http://{}:{}/health", address, port),
            name,
            address,
            port,
            tags: BTreeSet::new(),
            check_interval_secs: Self::DEFAULT_CHECK_INTERVAL_SECS,
            check_timeout_secs: Self::DEFAULT_CHECK_TIMEOUT_SECS,
        }
    }

    pub fn with_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = service_id.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_check(mut self, interval_secs: u64, timeout_secs: u64) -> Self {
        self.check_interval_secs = interval_secs;
        self.check_timeout_secs = timeout_secs;
        self
    }

    /// Body for `PUT /v1/agent/service/register`.
    pub fn to_registration(&self) -> AgentServiceRegistration {
        AgentServiceRegistration {
            id: self.service_id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            port: self.port,
            tags: self.tags.iter().cloned().collect(),
            check: AgentServiceCheck {
                http: self.health_check_url.clone(),
                interval: format!("{}s", self.check_interval_secs),
                timeout: format!("{}s", self.check_timeout_secs),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub check: AgentServiceCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentServiceCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    pub interval: String,
    pub timeout: String,
}

/// Response of `GET /v1/agent/service/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Port", default)]
    pub port: u16,
    #[serde(rename = "Tags", default)]
    pub tags: Option<Vec<String>>,
}

/// One element of `GET /v1/catalog/service/{name}`.
///
/// Only `ServicePort` is required; everything else tolerates absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(rename = "ServiceName", default)]
    pub service_name: String,
    #[serde(rename = "ServiceAddress", default)]
    pub service_address: String,
    #[serde(rename = "ServicePort")]
    pub service_port: u16,
    /// Address of the node the service runs on.
    #[serde(rename = "Address", default)]
    pub node_address: String,
    #[serde(rename = "ServiceTags", default)]
    pub service_tags: Option<Vec<String>>,
}
