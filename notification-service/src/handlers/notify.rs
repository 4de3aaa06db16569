use crate::models::{Notification, NotifyRequest};
use crate::services::record_notification;
use axum::{body::Bytes, Json};

/// Accepts any body. Malformed or missing JSON falls back to the default
/// message and recipient instead of failing the request.
#[tracing::instrument(skip(body), fields(body_len = body.len()))]
pub async fn send_notification(body: Bytes) -> Json<Notification> {
    let notification = Notification::sent(NotifyRequest::from_body(&body));

    tracing::info!(
        notification_id = %notification.notification_id,
        recipient = %notification.recipient,
        message = %notification.message,
        "Notification sent"
    );
    record_notification(notification.status);

    Json(notification)
}
