pub mod notification;

pub use notification::{Notification, NotifyRequest, DEFAULT_MESSAGE, DEFAULT_RECIPIENT};
