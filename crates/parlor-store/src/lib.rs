//! Parlor Store - the room's message list and its retention policy
//!
//! Two backends share one contract:
//! - [`MemoryStore`]: a locked `Vec`, lost on restart
//! - [`SqliteStore`]: the same list persisted through `sqlx`
//!
//! Every backend sweeps expired messages on append and on list, and
//! [`spawn_sweeper`] adds a periodic sweep on top of that.

pub mod memory;
pub mod retention;
pub mod sqlite;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parlor_types::{Message, Notification};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use memory::MemoryStore;
pub use retention::RetentionPolicy;
pub use sqlite::SqliteStore;

/// Which backend holds the message list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Sqlite,
}

/// The room's message store
pub enum MessageStore {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl MessageStore {
    /// Open the configured backend. `database_path` is only used by SQLite.
    pub async fn open(
        backend: Backend,
        database_path: &str,
        policy: RetentionPolicy,
    ) -> Result<Self> {
        let store = match backend {
            Backend::Memory => Self::Memory(MemoryStore::new(policy)),
            Backend::Sqlite => Self::Sqlite(SqliteStore::connect(database_path, policy).await?),
        };

        info!(
            "Message store ready: backend={:?}, retention={}s",
            backend,
            store.policy().max_age().num_seconds()
        );
        Ok(store)
    }

    pub fn policy(&self) -> RetentionPolicy {
        match self {
            Self::Memory(store) => store.policy(),
            Self::Sqlite(store) => store.policy(),
        }
    }

    /// Append at the end of the list, sweeping afterwards
    pub async fn append(&self, message: Message) -> Result<()> {
        match self {
            Self::Memory(store) => {
                store.append(message).await;
                Ok(())
            }
            Self::Sqlite(store) => store.append(&message).await,
        }
    }

    /// Snapshot of all retained messages in insertion order
    pub async fn list(&self) -> Result<Vec<Message>> {
        match self {
            Self::Memory(store) => Ok(store.list().await),
            Self::Sqlite(store) => store.list().await,
        }
    }

    pub async fn clear(&self) -> Result<()> {
        match self {
            Self::Memory(store) => {
                store.clear().await;
                Ok(())
            }
            Self::Sqlite(store) => store.clear().await,
        }
    }

    /// Remove expired messages, returning how many went
    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        match self {
            Self::Memory(store) => Ok(store.sweep_at(now).await),
            Self::Sqlite(store) => store.sweep_at(now).await,
        }
    }

    pub async fn record_notification(&self, notification: Notification) -> Result<()> {
        match self {
            Self::Memory(store) => {
                store.record_notification(notification).await;
                Ok(())
            }
            Self::Sqlite(store) => store.record_notification(&notification).await,
        }
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        match self {
            Self::Memory(store) => Ok(store.notifications().await),
            Self::Sqlite(store) => store.notifications().await,
        }
    }
}

/// Run a retention sweep every `every` until `cancel` fires
pub fn spawn_sweeper(
    store: Arc<MessageStore>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Retention sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match store.sweep().await {
                        Ok(0) => {}
                        Ok(removed) => debug!("Retention sweep removed {} messages", removed),
                        Err(e) => warn!("Retention sweep failed: {}", e),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_types::PostRequest;

    #[tokio::test]
    async fn test_backends_share_contract() {
        for backend in [Backend::Memory, Backend::Sqlite] {
            let store = MessageStore::open(backend, sqlite::IN_MEMORY, RetentionPolicy::default())
                .await
                .unwrap();
            assert_eq!(store.policy(), RetentionPolicy::default());

            let message = PostRequest::text("A", "hi").into_message(Utc::now()).unwrap();
            store.append(message.clone()).await.unwrap();

            let listed = store.list().await.unwrap();
            assert_eq!(listed.len(), 1, "backend {:?}", backend);
            assert_eq!(listed[0].sender, "A");
            assert_eq!(listed[0].message, "hi");
            assert!(listed[0].media.is_none());

            store.clear().await.unwrap();
            assert!(store.list().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops() {
        let memory = MemoryStore::new(RetentionPolicy::from_secs(60));
        let t = Utc::now() - chrono::Duration::seconds(60) + chrono::Duration::milliseconds(100);
        memory
            .append(PostRequest::text("A", "hi").into_message(t).unwrap())
            .await;
        assert_eq!(memory.len().await, 1);

        let store = Arc::new(MessageStore::Memory(memory));
        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(store.clone(), Duration::from_millis(20), cancel.clone());

        tokio::time::sleep(Duration::from_millis(400)).await;
        match store.as_ref() {
            MessageStore::Memory(memory) => assert_eq!(memory.len().await, 0),
            MessageStore::Sqlite(_) => unreachable!(),
        }

        cancel.cancel();
        handle.await.unwrap();
    }
}
