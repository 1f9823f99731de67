use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque message identifier: 32 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of an attached media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify an upload by its MIME type. Anything that is not an image is
    /// treated as video.
    pub fn from_mime(content_type: &str) -> Self {
        if content_type.starts_with("image") {
            Self::Image
        } else {
            Self::Video
        }
    }

    /// Parse the `type` tag sent with media posts (`image-message` / `video-message`)
    pub fn from_message_type(tag: &str) -> Result<Self, ValidationError> {
        match tag {
            "image-message" => Ok(Self::Image),
            "video-message" => Ok(Self::Video),
            other => Err(ValidationError::UnknownMessageType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Parse the stored representation produced by [`MediaKind::as_str`]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Reference to a file held by the media relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

impl Media {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// A chat entry as held by the store and returned to pollers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

/// A post as submitted by a client, before an id and timestamp are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct PostRequest {
    pub sender: String,
    pub text: Option<String>,
    pub media: Option<Media>,
}

impl PostRequest {
    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: Some(text.into()),
            media: None,
        }
    }

    pub fn media(sender: impl Into<String>, media: Media) -> Self {
        Self {
            sender: sender.into(),
            text: None,
            media: Some(media),
        }
    }

    /// Build a request from the loose `/send` body shape: plain text, or a
    /// `type` tag plus `url` describing an already uploaded file.
    pub fn from_tagged(
        sender: String,
        text: Option<String>,
        tag: Option<&str>,
        url: Option<String>,
    ) -> Result<Self, ValidationError> {
        let has_text = text.as_deref().is_some_and(|text| !text.is_empty());
        let url = url.filter(|url| !url.is_empty());

        let media = match (tag, url) {
            (Some(tag), Some(url)) => Some(Media::new(url, MediaKind::from_message_type(tag)?)),
            // half a media reference next to real text is ignored
            (_, None) | (None, _) if has_text => None,
            (Some(tag), None) => {
                MediaKind::from_message_type(tag)?;
                return Err(ValidationError::MissingField("url"));
            }
            (None, Some(_)) => {
                return Err(ValidationError::MissingField("type"));
            }
            (None, None) => None,
        };

        Ok(Self {
            sender,
            text,
            media,
        })
    }

    /// Assign identity and time, enforcing that the post carries text or media
    pub fn into_message(self, now: DateTime<Utc>) -> Result<Message, ValidationError> {
        self.into_message_with_id(MessageId::new(), now)
    }

    /// Like [`PostRequest::into_message`], reusing an id minted elsewhere
    /// (uploads name their file after the message)
    pub fn into_message_with_id(
        self,
        id: MessageId,
        now: DateTime<Utc>,
    ) -> Result<Message, ValidationError> {
        let text = self.text.unwrap_or_default();
        if text.is_empty() && self.media.is_none() {
            return Err(ValidationError::EmptyMessage);
        }

        Ok(Message {
            id,
            sender: self.sender,
            message: text,
            media: self.media,
            timestamp: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_post_is_rejected() {
        let request = PostRequest {
            sender: "A".to_string(),
            text: None,
            media: None,
        };
        assert_eq!(
            request.into_message(Utc::now()),
            Err(ValidationError::EmptyMessage)
        );

        let request = PostRequest::text("A", "");
        assert_eq!(
            request.into_message(Utc::now()),
            Err(ValidationError::EmptyMessage)
        );
    }

    #[test]
    fn test_text_post_becomes_message() {
        let now = Utc::now();
        let message = PostRequest::text("A", "hi").into_message(now).unwrap();
        assert_eq!(message.sender, "A");
        assert_eq!(message.message, "hi");
        assert_eq!(message.timestamp, now);
        assert!(!message.has_media());
        assert_eq!(message.id.as_str().len(), 32);
    }

    #[test]
    fn test_media_post_may_have_empty_text() {
        let media = Media::new("/uploads/a.png", MediaKind::Image);
        let message = PostRequest::media("B", media.clone())
            .into_message(Utc::now())
            .unwrap();
        assert_eq!(message.message, "");
        assert_eq!(message.media, Some(media));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_media_kind_classification() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/octet-stream"), MediaKind::Video);

        assert_eq!(
            MediaKind::from_message_type("image-message"),
            Ok(MediaKind::Image)
        );
        assert_eq!(
            MediaKind::from_message_type("video-message"),
            Ok(MediaKind::Video)
        );
        assert!(MediaKind::from_message_type("gif-message").is_err());
        assert_eq!(MediaKind::parse(MediaKind::Video.as_str()), Some(MediaKind::Video));
    }

    #[test]
    fn test_tagged_post_shapes() {
        let request =
            PostRequest::from_tagged("A".into(), Some("hi".into()), None, None).unwrap();
        assert_eq!(request.text.as_deref(), Some("hi"));
        assert!(request.media.is_none());

        let request = PostRequest::from_tagged(
            "A".into(),
            None,
            Some("video-message"),
            Some("https://cdn.example/v.mp4".into()),
        )
        .unwrap();
        assert_eq!(
            request.media,
            Some(Media::new("https://cdn.example/v.mp4", MediaKind::Video))
        );

        assert_eq!(
            PostRequest::from_tagged("A".into(), None, Some("image-message"), None),
            Err(ValidationError::MissingField("url"))
        );

        // stray media fields next to text leave a plain text post
        let request = PostRequest::from_tagged(
            "A".into(),
            Some("hi".into()),
            Some("image-message"),
            None,
        )
        .unwrap();
        assert_eq!(request.text.as_deref(), Some("hi"));
        assert!(request.media.is_none());

        let request = PostRequest::from_tagged(
            "A".into(),
            Some("hi".into()),
            None,
            Some("/x.png".into()),
        )
        .unwrap();
        assert!(request.media.is_none());
        assert_eq!(
            PostRequest::from_tagged("A".into(), None, None, Some("/x.png".into())),
            Err(ValidationError::MissingField("type"))
        );
        assert!(matches!(
            PostRequest::from_tagged("A".into(), None, Some("audio"), Some("/x".into())),
            Err(ValidationError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn test_wire_format() {
        let text = PostRequest::text("A", "hi").into_message(Utc::now()).unwrap();
        let json = serde_json::to_value(&text).unwrap();
        assert!(json.get("media").is_none());
        assert_eq!(json["sender"], "A");
        assert!(json["timestamp"].is_string());

        let media = PostRequest::media("A", Media::new("/uploads/x.png", MediaKind::Image))
            .into_message(Utc::now())
            .unwrap();
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["media"]["type"], "image");
        assert_eq!(json["media"]["url"], "/uploads/x.png");
    }
}
