use crate::config::Config;
use crate::state::AppState;
use anyhow::{Context, Result};
use parlor_store::spawn_sweeper;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Chat service - owns the server lifecycle
pub struct ChatService {
    config: Config,
}

impl ChatService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        parlor_logging::init_logging(&self.config.logging.level, self.config.logging.format)?;
        info!("Starting Parlor chat service");

        info!(
            "Retention: max_age={}s, sweep_interval={}s",
            self.config.retention.max_age_secs, self.config.retention.sweep_interval_secs
        );

        let sweep_interval = self.config.retention.sweep_interval();
        let address = self.config.bind_address();

        let state = AppState::new(self.config).await?;

        let cancel = CancellationToken::new();
        let sweeper = spawn_sweeper(state.store.clone(), sweep_interval, cancel.clone());
        info!("Retention sweeper started");

        let app = crate::router(state);

        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;
        info!("Server running on {}", address);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        cancel.cancel();
        if let Err(e) = sweeper.await {
            warn!("Retention sweeper ended abnormally: {}", e);
        }

        served.context("HTTP server error")?;
        info!("Chat service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
