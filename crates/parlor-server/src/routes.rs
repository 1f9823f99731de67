use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};
use chrono::Utc;
use parlor_relay::Notifier;
use parlor_store::MessageStore;
use parlor_types::{Message, Notification, PostRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{error::AppError, gate::Access, state::AppState};

#[derive(Deserialize)]
pub struct JoinRequest {
    keyword: String,
    #[serde(default)]
    sender: Option<String>,
}

#[derive(Deserialize)]
pub struct SendRequest {
    sender: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
pub struct NotifyRequest {
    sender: String,
    #[serde(default)]
    message: Option<String>,
}

fn payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))
}

pub async fn join_handler(
    State(state): State<Arc<AppState>>,
    request: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = payload(request)?;

    match state.gate.check(&request.keyword) {
        Access::Granted => {
            debug!("Join granted");
            if let Some(sender) = request.sender.filter(|s| !s.is_empty()) {
                if state.notifier.notifies_on_join() {
                    spawn_notification(
                        state.store.clone(),
                        state.notifier.clone(),
                        Notification::new(sender, None),
                    );
                }
            }
            Ok(Json(json!({ "status": "success" })))
        }
        Access::Denied => {
            info!("Join denied: keyword mismatch");
            Err(AppError::Unauthorized)
        }
    }
}

pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = payload(request)?;

    let message = PostRequest::from_tagged(
        request.sender,
        request.message,
        request.kind.as_deref(),
        request.url,
    )?
    .into_message(Utc::now())?;

    let id = message.id.clone();
    state.store.append(message).await?;
    debug!("Message {} posted", id);

    Ok(Json(json!({ "status": "success", "id": id })))
}

pub async fn messages_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.store.list().await?))
}

pub async fn cleanup_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    state.store.clear().await?;
    info!("Room purged");
    Ok(Json(json!({ "success": true })))
}

pub async fn media_send_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart =
        multipart.map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))?;

    let mut sender: Option<String> = None;
    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("sender") => {
                sender = Some(field.text().await?);
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (sender, (file_name, content_type, bytes)) = match (sender, file) {
        (Some(sender), Some(file)) if !sender.is_empty() => (sender, file),
        _ => {
            return Err(AppError::MalformedPayload(
                "Missing file or sender".to_string(),
            ))
        }
    };

    let stored = state
        .vault
        .store(file_name.as_deref(), content_type.as_deref(), &bytes)
        .await?;

    let message = PostRequest::media(sender, stored.media.clone())
        .into_message_with_id(stored.id.clone(), Utc::now())?;
    state.store.append(message).await?;

    Ok(Json(json!({
        "status": "success",
        "url": stored.media.url,
        "type": stored.media.kind,
        "id": stored.id,
    })))
}

pub async fn notify_handler(
    State(state): State<Arc<AppState>>,
    request: Result<Json<NotifyRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = payload(request)?;
    let notification = Notification::new(request.sender, request.message);
    info!("Notification requested by '{}'", notification.sender);

    if let Err(e) = state.store.record_notification(notification.clone()).await {
        warn!("Failed to record notification: {}", e);
    }

    let report = state.notifier.send(&notification).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Notification sent",
        "details": report,
    })))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Record and send a notification in the background; failures are only logged
fn spawn_notification(
    store: Arc<MessageStore>,
    notifier: Arc<Notifier>,
    notification: Notification,
) {
    tokio::spawn(async move {
        if let Err(e) = store.record_notification(notification.clone()).await {
            warn!("Failed to record notification: {}", e);
        }
        if let Err(e) = notifier.send(&notification).await {
            warn!("Join notification for '{}' failed: {}", notification.sender, e);
        }
    });
}
