//! Transactional email relay for "someone is waiting" alerts
//!
//! Speaks the EmailJS `email/send` API: a single JSON POST carrying the
//! service/template identifiers and the template parameters.

use crate::error::{RelayError, Result};
use parlor_types::Notification;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

fn default_endpoint() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Notification relay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    /// EmailJS-compatible send endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub service_id: String,

    #[serde(default)]
    pub template_id: String,

    /// Public key of the EmailJS account
    #[serde(default)]
    pub user_id: String,

    /// Private key, required when the account runs in strict mode
    #[serde(default)]
    pub private_key: String,

    /// Address the alerts are sent to
    #[serde(default)]
    pub recipient: String,

    /// Link included in the email body
    #[serde(default = "default_app_url")]
    pub app_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Alert the recipient whenever someone joins with a name
    #[serde(default)]
    pub on_join: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            service_id: String::new(),
            template_id: String::new(),
            user_id: String::new(),
            private_key: String::new(),
            recipient: String::new(),
            app_url: default_app_url(),
            timeout_secs: default_timeout_secs(),
            on_join: false,
        }
    }
}

impl NotifyConfig {
    /// All identifiers the relay needs are present
    pub fn is_configured(&self) -> bool {
        [
            &self.endpoint,
            &self.service_id,
            &self.template_id,
            &self.user_id,
            &self.recipient,
        ]
        .iter()
        .all(|value| !value.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "str::is_empty")]
    access_token: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    email: &'a str,
    from_name: &'a str,
    message: &'a str,
    app_url: &'a str,
}

/// Outcome of a delivered notification, echoed back to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub email_status: u16,
    pub email_response: String,
    pub recipient: String,
    pub sender: String,
}

/// Client for the notification relay
pub struct Notifier {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.is_configured() {
            info!("Notification relay configured for {}", config.recipient);
        } else {
            info!("Notification relay disabled (missing credentials or recipient)");
        }

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Whether a successful join should trigger an alert
    pub fn notifies_on_join(&self) -> bool {
        self.config.on_join && self.is_configured()
    }

    /// Send one alert. Not retried; callers decide whether a failure matters.
    pub async fn send(&self, notification: &Notification) -> Result<DeliveryReport> {
        if !self.is_configured() {
            return Err(RelayError::NotConfigured);
        }

        let payload = self.payload(notification);
        debug!(
            "Sending notification from '{}' via {}",
            notification.sender, self.config.endpoint
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Relay answered {}: {}", status, body);

        if !status.is_success() {
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Notification from '{}' delivered", notification.sender);
        Ok(DeliveryReport {
            email_status: status.as_u16(),
            email_response: body,
            recipient: self.config.recipient.clone(),
            sender: notification.sender.clone(),
        })
    }

    fn payload<'a>(&'a self, notification: &'a Notification) -> EmailPayload<'a> {
        EmailPayload {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.user_id,
            access_token: &self.config.private_key,
            template_params: TemplateParams {
                email: &self.config.recipient,
                from_name: &notification.sender,
                message: &notification.message,
                app_url: &self.config.app_url,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn configured(endpoint: String) -> NotifyConfig {
        NotifyConfig {
            endpoint,
            service_id: "service_x".into(),
            template_id: "template_x".into(),
            user_id: "user_x".into(),
            recipient: "owner@example.com".into(),
            ..NotifyConfig::default()
        }
    }

    /// Serve a fake relay on an ephemeral port, capturing request bodies
    async fn fake_relay(status: StatusCode, captured: Arc<Mutex<Vec<Value>>>) -> String {
        let app = Router::new().route(
            "/send",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(body);
                    (status, "OK")
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/send", address)
    }

    #[test]
    fn test_is_configured() {
        assert!(!NotifyConfig::default().is_configured());
        assert!(configured("http://relay".into()).is_configured());

        let mut config = configured("http://relay".into());
        config.recipient.clear();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_toml_defaults() {
        let config: NotifyConfig = toml::from_str(r#"service_id = "s""#).unwrap();
        assert_eq!(config.endpoint, default_endpoint());
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.on_join);
    }

    #[test]
    fn test_payload_shape() {
        let mut config = configured("http://relay".into());
        config.private_key = "secret".into();
        let notifier = Notifier::new(config).unwrap();
        let notification = Notification::new("A", None);

        let json = serde_json::to_value(notifier.payload(&notification)).unwrap();
        assert_eq!(json["service_id"], "service_x");
        assert_eq!(json["accessToken"], "secret");
        assert_eq!(json["template_params"]["email"], "owner@example.com");
        assert_eq!(json["template_params"]["from_name"], "A");
        assert_eq!(
            json["template_params"]["message"],
            parlor_types::DEFAULT_NOTIFICATION_TEXT
        );

        let notifier = Notifier::new(configured("http://relay".into())).unwrap();
        let json = serde_json::to_value(notifier.payload(&notification)).unwrap();
        assert!(json.get("accessToken").is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_relay_fails_fast() {
        let notifier = Notifier::new(NotifyConfig::default()).unwrap();
        let result = notifier.send(&Notification::new("A", None)).await;
        assert!(matches!(result, Err(RelayError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_send_delivers() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let endpoint = fake_relay(StatusCode::OK, captured.clone()).await;
        let notifier = Notifier::new(configured(endpoint)).unwrap();

        let report = notifier
            .send(&Notification::new("A", Some("ping".into())))
            .await
            .unwrap();
        assert_eq!(report.email_status, 200);
        assert_eq!(report.email_response, "OK");
        assert_eq!(report.recipient, "owner@example.com");
        assert_eq!(report.sender, "A");

        let bodies = captured.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["template_params"]["message"], "ping");
    }

    #[tokio::test]
    async fn test_send_surfaces_rejection() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let endpoint = fake_relay(StatusCode::BAD_REQUEST, captured).await;
        let notifier = Notifier::new(configured(endpoint)).unwrap();

        let result = notifier.send(&Notification::new("A", None)).await;
        match result {
            Err(RelayError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "OK");
            }
            other => panic!("Expected rejection, got {:?}", other.map(|r| r.email_status)),
        }
    }
}
