use crate::RetentionPolicy;
use chrono::{DateTime, Utc};
use parlor_types::{Message, Notification};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

/// How many notification records the in-memory backend keeps
pub const NOTIFICATION_HISTORY: usize = 100;

/// Process-local message list. Contents are lost on restart.
pub struct MemoryStore {
    messages: Mutex<Vec<Message>>,
    notifications: Mutex<VecDeque<Notification>>,
    policy: RetentionPolicy,
}

impl MemoryStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            notifications: Mutex::new(VecDeque::new()),
            policy,
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub async fn append(&self, message: Message) {
        let mut messages = self.messages.lock().await;
        messages.push(message);
        self.sweep_locked(&mut messages, Utc::now());
    }

    /// Sweep, then return a copy of what is left
    pub async fn list(&self) -> Vec<Message> {
        self.list_at(Utc::now()).await
    }

    pub async fn list_at(&self, now: DateTime<Utc>) -> Vec<Message> {
        let mut messages = self.messages.lock().await;
        self.sweep_locked(&mut messages, now);
        messages.clone()
    }

    /// Number of held messages, without sweeping first
    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn clear(&self) {
        let mut messages = self.messages.lock().await;
        let removed = messages.len();
        messages.clear();
        debug!("Cleared {} messages", removed);
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut messages = self.messages.lock().await;
        self.sweep_locked(&mut messages, now)
    }

    pub async fn record_notification(&self, notification: Notification) {
        let mut notifications = self.notifications.lock().await;
        if notifications.len() == NOTIFICATION_HISTORY {
            notifications.pop_front();
        }
        notifications.push_back(notification);
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().await.iter().cloned().collect()
    }

    fn sweep_locked(&self, messages: &mut Vec<Message>, now: DateTime<Utc>) -> usize {
        let before = messages.len();
        messages.retain(|message| !self.policy.is_expired(message, now));
        before - messages.len()
    }
}
