use thiserror::Error;

/// Reasons an incoming post is refused before it reaches the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Neither text nor a media reference was supplied
    #[error("Invalid message")]
    EmptyMessage,

    /// A field the request shape requires is absent or blank
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// The `type` tag of a media post is not one we know
    #[error("Unknown message type '{0}'")]
    UnknownMessageType(String),
}
