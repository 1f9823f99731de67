//! Parlor Types - Core types for the Parlor chat room
//!
//! This module defines the data model shared by the store, the relays and the
//! HTTP surface: messages, media references and notification records.

pub mod error;
pub mod message;
pub mod notification;

pub use error::ValidationError;
pub use message::{Media, MediaKind, Message, MessageId, PostRequest};
pub use notification::{Notification, DEFAULT_NOTIFICATION_TEXT};
