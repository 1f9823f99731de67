use std::sync::Arc;

use anyhow::Result;
use parlor_relay::{MediaVault, Notifier};
use parlor_store::MessageStore;
use tracing::info;

use crate::{config::Config, gate::AccessGate};

/// Everything a request handler needs, shared across the server
pub struct AppState {
    pub config: Config,
    pub gate: AccessGate,
    pub store: Arc<MessageStore>,
    pub vault: MediaVault,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let store = MessageStore::open(
            config.database.backend,
            &config.database.path,
            config.retention.policy(),
        )
        .await?;

        let vault = MediaVault::new(&config.media.upload_dir, &config.media.url_prefix);
        vault.ensure_dir().await?;
        info!(
            "Uploads stored in {} and served under {}/",
            vault.upload_dir().display(),
            vault.url_prefix()
        );

        let notifier = Notifier::new(config.notify.clone())?;

        Ok(Arc::new(Self {
            gate: AccessGate::new(config.room.keyword.clone()),
            store: Arc::new(store),
            vault,
            notifier: Arc::new(notifier),
            config,
        }))
    }
}
