//! Parlor - a passcode-gated chat room served over HTTP
//!
//! Clients join with the shared keyword, post text or media, and poll
//! `/messages`. Messages live in a [`parlor_store::MessageStore`] that expires
//! them after a fixed age.
//!
//! | Method | Path | |
//! |---|---|---|
//! | POST | `/join` | check the keyword |
//! | POST | `/send` | post text, or a media reference |
//! | GET | `/messages` | retained messages, oldest first |
//! | POST | `/cleanup` | wipe the room |
//! | POST | `/media/send` | upload a file and post it |
//! | POST | `/notify` | email the room owner |
//!
//! Every route is also available under `/api`.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod gate;
pub mod routes;
pub mod service;
pub mod state;

use routes::{
    cleanup_handler, health_handler, join_handler, media_send_handler, messages_handler,
    notify_handler, send_handler,
};
use state::AppState;

/// Build the HTTP router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/join", post(join_handler))
        .route("/send", post(send_handler))
        .route("/messages", get(messages_handler))
        .route("/cleanup", post(cleanup_handler))
        .route("/media/send", post(media_send_handler))
        .route("/notify", post(notify_handler));

    let mut app = Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .route("/health", get(health_handler));

    // only serve uploads ourselves when the prefix is a local path
    let prefix = state.vault.url_prefix();
    let uploads = ServeDir::new(state.vault.upload_dir());
    if prefix.is_empty() {
        app = app.fallback_service(uploads);
    } else if prefix.starts_with('/') {
        app = app.nest_service(prefix, uploads);
    }

    app.layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
