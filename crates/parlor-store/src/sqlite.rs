use crate::RetentionPolicy;
use anyhow::Result;
use chrono::{DateTime, Utc};
use parlor_types::{Media, MediaKind, Message, MessageId, Notification};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info, warn};

/// Path that selects a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Message store backed by SQLite. Survives restarts; retention still applies.
pub struct SqliteStore {
    pool: SqlitePool,
    policy: RetentionPolicy,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_path` and migrate it
    pub async fn connect(database_path: &str, policy: RetentionPolicy) -> Result<Self> {
        let pool = if database_path == IN_MEMORY {
            // every connection to :memory: is its own database, so keep exactly one
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await?
        } else {
            let database_url = format!("sqlite:{}?mode=rwc", database_path);
            SqlitePool::connect(&database_url).await?
        };

        let store = Self { pool, policy };
        store.run_migrations().await?;

        info!("SQLite message store opened: {}", database_path);
        Ok(store)
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                sender TEXT NOT NULL,
                body TEXT NOT NULL,
                media_url TEXT,
                media_kind TEXT,
                created_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                sender TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL,
                read INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Database migrations completed");
        Ok(())
    }

    pub async fn append(&self, message: &Message) -> Result<()> {
        let (media_url, media_kind) = match &message.media {
            Some(media) => (Some(media.url.as_str()), Some(media.kind.as_str())),
            None => (None, None),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, sender, body, media_url, media_kind, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.id.as_str())
        .bind(&message.sender)
        .bind(&message.message)
        .bind(media_url)
        .bind(media_kind)
        .bind(message.timestamp.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM messages WHERE created_at_ms <= ?")
            .bind(self.cutoff_ms(Utc::now()))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Message>> {
        self.list_at(Utc::now()).await
    }

    pub async fn list_at(&self, now: DateTime<Utc>) -> Result<Vec<Message>> {
        self.sweep_at(now).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, sender, body, media_url, media_kind, created_at_ms
            FROM messages
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    pub async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await?;
        debug!("Cleared {} messages", result.rows_affected());
        Ok(())
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let result = sqlx::query("DELETE FROM messages WHERE created_at_ms <= ?")
            .bind(self.cutoff_ms(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    pub async fn record_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (sender, message, created_at_ms, read)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&notification.sender)
        .bind(&notification.message)
        .bind(notification.timestamp.timestamp_millis())
        .bind(notification.read)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT sender, message, created_at_ms, read
            FROM notifications
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let notifications = rows
            .iter()
            .map(|row| Notification {
                sender: row.get("sender"),
                message: row.get("message"),
                timestamp: timestamp_from_millis(row.get("created_at_ms")),
                read: row.get("read"),
            })
            .collect();

        Ok(notifications)
    }

    fn cutoff_ms(&self, now: DateTime<Utc>) -> i64 {
        self.policy.cutoff(now).timestamp_millis()
    }
}

fn message_from_row(row: &SqliteRow) -> Message {
    let media_url: Option<String> = row.get("media_url");
    let media_kind: Option<String> = row.get("media_kind");

    let media = match (media_url, media_kind) {
        (Some(url), Some(kind)) => match MediaKind::parse(&kind) {
            Some(kind) => Some(Media::new(url, kind)),
            None => {
                warn!("Unknown media kind '{}' in stored message", kind);
                None
            }
        },
        _ => None,
    };

    Message {
        id: MessageId::from(row.get::<String, _>("id")),
        sender: row.get("sender"),
        message: row.get("body"),
        media,
        timestamp: timestamp_from_millis(row.get("created_at_ms")),
    }
}

fn timestamp_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}
