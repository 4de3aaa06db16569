use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub port: u16,
}

impl Config {
    /// Load the listen settings, falling back to `port` when neither the
    /// `configuration` file nor `APP__PORT`/`PORT` provide one.
    pub fn load_with_default_port(port: u16) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .set_default("port", i64::from(port))?
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", env::var("PORT").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Where the registry lives and how long a single call may take.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl RegistrySettings {
    pub const DEFAULT_HOST: &'static str = "registry";
    pub const DEFAULT_PORT: u16 = 8500;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// `REGISTRY_URL` wins; otherwise the URL is assembled from
    /// `REGISTRY_HOST` and `REGISTRY_PORT`.
    pub fn from_env(is_prod: bool) -> Result<Self, AppError> {
        let base_url = match env::var("REGISTRY_URL") {
            Ok(url) => url,
            Err(_) => {
                let host = get_env("REGISTRY_HOST", Some(Self::DEFAULT_HOST), is_prod)?;
                let port: u16 = get_env_parsed("REGISTRY_PORT", Some(Self::DEFAULT_PORT), is_prod)?;
                format!("http://{}:{}", host, port)
            }
        };
        let timeout_secs: u64 = get_env_parsed(
            "REGISTRY_TIMEOUT_SECS",
            Some(Self::DEFAULT_TIMEOUT.as_secs()),
            false,
        )?;

        Ok(Self::new(base_url).with_timeout(Duration::from_secs(timeout_secs)))
    }
}

pub fn is_production() -> bool {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod"
}

/// Read a setting from the environment.
///
/// In production every key must be set explicitly; elsewhere `default` is used
/// when present.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigMissing(format!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigMissing(format!("{} is required but not set", key)))
            }
        }
    }
}

/// Like [`get_env`] but parses the value, reporting unparsable input as a
/// configuration error rather than silently using the default.
pub fn get_env_parsed<T>(key: &str, default: Option<T>, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    let default = default.map(|d| d.to_string());
    let raw = get_env(key, default.as_deref(), is_prod)?;
    raw.trim().parse::<T>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
