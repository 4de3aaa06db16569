use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MESSAGE: &str = "Notificación de prueba";
pub const DEFAULT_RECIPIENT: &str = "sistema";

/// Body of `POST /notify`. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct NotifyRequest {
    pub message: Option<String>,
    pub recipient: Option<String>,
}

impl NotifyRequest {
    /// Lenient parse: an empty, non-JSON or wrongly shaped body is treated as
    /// `{}` so the caller still gets a notification with the defaults.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        match serde_json::from_slice::<NotifyRequest>(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable notify body, using defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub status: &'static str,
    pub notification_id: String,
    pub message: String,
    pub recipient: String,
    pub sent_at: DateTime<Utc>,
}

impl Notification {
    pub fn sent(request: NotifyRequest) -> Self {
        let sent_at = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();

        Self {
            status: "success",
            notification_id: format!("notif_{}_{}", sent_at.timestamp(), &suffix[..8]),
            message: request
                .message
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            recipient: request
                .recipient
                .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
            sent_at,
        }
    }
}
