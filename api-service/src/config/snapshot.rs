//! Versioned, swap-on-reload view of the YAML configuration.
//!
//! Readers hold an `Arc<ConfigSnapshot>` that never changes under them; a
//! reload builds a complete new snapshot and replaces the shared reference.

use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub document: serde_json::Value,
}

pub struct ConfigStore {
    source: PathBuf,
    current: watch::Sender<Arc<ConfigSnapshot>>,
}

/// Parse the YAML file as-is; keys keep their original case.
fn read_document(path: &Path) -> Result<serde_json::Value, AppError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("cannot read {}: {}", path.display(), e))
    })?;

    serde_yaml::from_str::<serde_json::Value>(&contents).map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("invalid YAML in {}: {}", path.display(), e))
    })
}

impl ConfigStore {
    /// Read `path` as version 1. A missing or unparsable file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let source = path.into();
        let document = read_document(&source)?;
        Ok(Self::with_document(source, document))
    }

    /// Store seeded with an in-memory document; `source` is used on reload.
    pub fn with_document(source: impl Into<PathBuf>, document: serde_json::Value) -> Self {
        let (current, _) = watch::channel(Arc::new(ConfigSnapshot {
            version: 1,
            loaded_at: Utc::now(),
            document,
        }));

        Self {
            source: source.into(),
            current,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.borrow().clone()
    }

    /// Re-read the source file and publish it as the next version.
    ///
    /// On error the current snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<ConfigSnapshot>, AppError> {
        let document = read_document(&self.source)?;
        Ok(self.replace(document))
    }

    fn replace(&self, document: serde_json::Value) -> Arc<ConfigSnapshot> {
        self.current.send_modify(|current| {
            *current = Arc::new(ConfigSnapshot {
                version: current.version + 1,
                loaded_at: Utc::now(),
                document,
            });
        });

        let snapshot = self.snapshot();
        tracing::info!(
            version = snapshot.version,
            source = %self.source.display(),
            "Configuration reloaded"
        );
        snapshot
    }
}
