use anyhow::{anyhow, bail};
use parlor_logging::LogFormat;
use parlor_relay::NotifyConfig;
use parlor_store::{Backend, RetentionPolicy};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[room]
keyword = ""  # Set via PARLOR_KEYWORD env var

[retention]
max_age_secs = 300
sweep_interval_secs = 60

[database]
backend = "memory"  # or "sqlite"
path = "parlor.db"

[media]
upload_dir = "uploads"
url_prefix = "/uploads"
max_upload_bytes = 26214400

[notify]
service_id = ""  # Set via EMAILJS_SERVICE_ID env var
template_id = ""  # Set via EMAILJS_TEMPLATE_ID env var
user_id = ""  # Set via EMAILJS_USER_ID env var
private_key = ""  # Set via EMAILJS_PRIVATE_KEY env var
recipient = ""  # Set via RECIPIENT_EMAIL env var
on_join = false

[logging]
level = "info"  # trace, debug, info, warn, error
format = "pretty"  # or "json"
"#;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_age_secs() -> u64 {
    parlor_store::retention::DEFAULT_MAX_AGE_SECS
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_database_path() -> String {
    "parlor.db".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_url_prefix() -> String {
    "/uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoomConfig {
    /// Shared passcode checked by `/join`
    pub keyword: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetentionConfig {
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_secs(self.max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            url_prefix: default_url_prefix(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub room: RoomConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.parlor/parlor.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".parlor").join("parlor.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
            eprintln!("Please set the room keyword in this file or via PARLOR_KEYWORD.");
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.parlor/parlor.toml (auto-created if missing)
    /// 2. Local override: ./parlor.toml (optional)
    /// 3. Environment variables (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("parlor").required(false))
            .add_source(config::Environment::with_prefix("PARLOR").separator("__"));

        let overrides = [
            ("PARLOR_KEYWORD", "room.keyword"),
            ("PARLOR_PORT", "server.port"),
            ("DATABASE_PATH", "database.path"),
            ("RECIPIENT_EMAIL", "notify.recipient"),
            ("EMAILJS_SERVICE_ID", "notify.service_id"),
            ("EMAILJS_TEMPLATE_ID", "notify.template_id"),
            ("EMAILJS_USER_ID", "notify.user_id"),
            ("EMAILJS_PRIVATE_KEY", "notify.private_key"),
            ("APP_URL", "notify.app_url"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = env::var(var) {
                config_builder = config_builder.set_override(key, value)?;
            }
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.room.keyword.is_empty() {
            bail!(
                "Room keyword is empty. Set PARLOR_KEYWORD or edit [room] keyword in ~/.parlor/parlor.toml"
            );
        }
        if self.retention.max_age_secs == 0 {
            bail!("retention.max_age_secs must be greater than zero");
        }
        if RetentionPolicy::try_from_secs(self.retention.max_age_secs).is_none() {
            bail!(
                "retention.max_age_secs is too large: {}",
                self.retention.max_age_secs
            );
        }
        if self.retention.sweep_interval_secs == 0 {
            bail!("retention.sweep_interval_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config.validate().is_err());

        config.room.keyword = "1020".into();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database.backend, Backend::Memory);
        assert_eq!(config.media.max_upload_bytes, default_max_upload_bytes());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [room]
            keyword = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.retention.max_age_secs, 300);
        assert_eq!(config.retention.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.media.url_prefix, "/uploads");
        assert!(!config.notify.is_configured());
    }

    #[test]
    fn test_sqlite_and_json_logging() {
        let config: Config = toml::from_str(
            r#"
            [room]
            keyword = "secret"

            [database]
            backend = "sqlite"
            path = "/var/lib/parlor/chat.db"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.path, "/var/lib/parlor/chat.db");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_zero_retention_rejected() {
        let config: Config = toml::from_str(
            r#"
            [room]
            keyword = "secret"

            [retention]
            max_age_secs = 0
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unrepresentable_retention_rejected() {
        let config: Config = toml::from_str(
            r#"
            [room]
            keyword = "secret"

            [retention]
            max_age_secs = 10000000000000000
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_missing_room_section_fails() {
        assert!(toml::from_str::<Config>("[server]\nport = 8080").is_err());
    }
}
