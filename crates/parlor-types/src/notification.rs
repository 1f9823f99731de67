use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text used when a "waiting" alert carries no message of its own
pub const DEFAULT_NOTIFICATION_TEXT: &str = "is waiting for you in the chat!";

/// Record of a "someone is waiting" alert sent to the room owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(sender: impl Into<String>, message: Option<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_TEXT.to_string()),
            timestamp: Utc::now(),
            read: false,
        }
    }
}
