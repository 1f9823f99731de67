use crate::error::{RelayError, Result};
use parlor_types::{Media, MediaKind, MessageId};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension used when the uploaded file name has no usable one
const FALLBACK_EXTENSION: &str = "bin";

/// Longest extension kept from an uploaded file name
const MAX_EXTENSION_LEN: usize = 10;

/// A file written by the vault, ready to be attached to a message
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub id: MessageId,
    pub media: Media,
    pub path: PathBuf,
}

/// Local upload directory served back under a URL prefix
#[derive(Debug, Clone)]
pub struct MediaVault {
    upload_dir: PathBuf,
    url_prefix: String,
}

impl MediaVault {
    /// A prefix of `/` (or empty) serves uploads from the site root and is
    /// kept as the empty string
    pub fn new(upload_dir: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let trimmed = url_prefix.trim_end_matches('/');
        let url_prefix = if trimmed.is_empty()
            || trimmed.starts_with('/')
            || trimmed.contains("://")
        {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        Self {
            upload_dir: upload_dir.into(),
            url_prefix,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        debug!("Upload directory ready: {}", self.upload_dir.display());
        Ok(())
    }

    /// Write `bytes` under a fresh id, classifying it by `content_type`
    pub async fn store(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredMedia> {
        if bytes.is_empty() {
            return Err(RelayError::EmptyUpload);
        }

        self.ensure_dir().await?;

        let id = MessageId::new();
        let file_name = format!("{}.{}", id, extension_for(file_name));
        let path = self.upload_dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        let kind = MediaKind::from_mime(content_type.unwrap_or_default());
        let url = format!("{}/{}", self.url_prefix, file_name);
        info!(
            "Stored {} upload of {} bytes at {}",
            kind.as_str(),
            bytes.len(),
            path.display()
        );

        Ok(StoredMedia {
            id,
            media: Media::new(url, kind),
            path,
        })
    }
}

/// Lower-cased extension of `file_name`, or the fallback when it is missing
/// or not plain ASCII alphanumerics
fn extension_for(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
