use service_core::config::{self as core_config, get_env, get_env_parsed, RegistrySettings};
use service_core::error::AppError;
use service_core::registry::{RetryPolicy, ServiceDescriptor};
use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8081;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub common: core_config::Config,
    pub registry: RegistrySettings,
    pub service: ServiceSettings,
    pub lifecycle: LifecycleSettings,
}

/// How the service describes itself to the registry.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Capability name other services look up.
    pub name: String,
    /// Fixed instance id; a random one is minted when unset.
    pub id: Option<String>,
    /// Address the registry and peers use to reach this instance.
    pub address: String,
    pub tags: Vec<String>,
    pub check_interval_secs: u64,
    pub check_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub liveness_interval: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            retry_delay: policy.retry_delay,
            liveness_interval: Duration::from_secs(30),
        }
    }
}

impl LifecycleSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }
}

impl NotificationConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load_with_default_port(DEFAULT_PORT)?;
        let is_prod = core_config::is_production();
        let defaults = LifecycleSettings::default();

        let tags = get_env("SERVICE_TAGS", Some("notification,v1"), false)?
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(NotificationConfig {
            common,
            registry: RegistrySettings::from_env(is_prod)?,
            service: ServiceSettings {
                name: get_env("SERVICE_NAME", Some("notify"), false)?,
                id: env::var("SERVICE_ID").ok().filter(|id| !id.is_empty()),
                address: get_env("SERVICE_ADDRESS", Some("notification-service"), is_prod)?,
                tags,
                check_interval_secs: get_env_parsed(
                    "HEALTH_CHECK_INTERVAL_SECS",
                    Some(ServiceDescriptor::DEFAULT_CHECK_INTERVAL_SECS),
                    false,
                )?,
                check_timeout_secs: get_env_parsed(
                    "HEALTH_CHECK_TIMEOUT_SECS",
                    Some(ServiceDescriptor::DEFAULT_CHECK_TIMEOUT_SECS),
                    false,
                )?,
            },
            lifecycle: LifecycleSettings {
                max_attempts: get_env_parsed(
                    "REGISTER_MAX_ATTEMPTS",
                    Some(defaults.max_attempts),
                    false,
                )?,
                retry_delay: Duration::from_secs(get_env_parsed(
                    "REGISTER_RETRY_DELAY_SECS",
                    Some(defaults.retry_delay.as_secs()),
                    false,
                )?),
                liveness_interval: Duration::from_secs(get_env_parsed(
                    "LIVENESS_INTERVAL_SECS",
                    Some(defaults.liveness_interval.as_secs()),
                    false,
                )?),
            },
        })
    }

    /// Descriptor for this process, advertising `port` (the port actually
    /// bound, which differs from the configured one when that is 0).
    pub fn descriptor(&self, port: u16) -> ServiceDescriptor {
        let descriptor = ServiceDescriptor::new(&self.service.name, &self.service.address, port)
            .with_tags(self.service.tags.iter().cloned())
            .with_check(
                self.service.check_interval_secs,
                self.service.check_timeout_secs,
            );

        match &self.service.id {
            Some(id) => descriptor.with_id(id.clone()),
            None => descriptor,
        }
    }
}
