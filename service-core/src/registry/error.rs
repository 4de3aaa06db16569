use thiserror::Error;

/// Failures talking to the registry.
///
/// `Timeout` is kept apart from `Transport` so callers can tell a hung
/// registry from an unreachable one, and both from an empty answer.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry unreachable: {0}")]
    Transport(String),

    #[error("registry timed out: {0}")]
    Timeout(String),

    #[error("registry rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected registry response: {0}")]
    Decode(String),
}

impl RegistryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RegistryError::Timeout(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Transport(_) => "transport",
            RegistryError::Timeout(_) => "timeout",
            RegistryError::Rejected { .. } => "rejected",
            RegistryError::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout(err.to_string())
        } else if err.is_decode() {
            RegistryError::Decode(err.to_string())
        } else {
            RegistryError::Transport(err.to_string())
        }
    }
}
