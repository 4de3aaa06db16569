pub mod snapshot;

pub use snapshot::{ConfigSnapshot, ConfigStore};

use service_core::config::{self as core_config, get_env, get_env_parsed, RegistrySettings};
use service_core::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;

/// Process settings taken from the environment. The YAML document served by
/// the API lives separately in the [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub common: core_config::Config,
    pub registry: RegistrySettings,
    pub config_path: PathBuf,
    /// Capability to look up for notifications.
    pub notify_capability: String,
    pub lookup_timeout: Duration,
    pub forward_timeout: Duration,
}

impl ApiSettings {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load_with_default_port(DEFAULT_PORT)?;
        let is_prod = core_config::is_production();

        Ok(ApiSettings {
            common,
            registry: RegistrySettings::from_env(is_prod)?,
            config_path: PathBuf::from(get_env("CONFIG_PATH", Some("config.yaml"), false)?),
            notify_capability: get_env("NOTIFY_CAPABILITY", Some("notify"), false)?,
            lookup_timeout: Duration::from_secs(get_env_parsed(
                "LOOKUP_TIMEOUT_SECS",
                Some(3u64),
                false,
            )?),
            forward_timeout: Duration::from_secs(get_env_parsed(
                "FORWARD_TIMEOUT_SECS",
                Some(5u64),
                false,
            )?),
        })
    }
}
