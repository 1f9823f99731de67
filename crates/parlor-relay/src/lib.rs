//! Parlor Relay - collaborators outside the chat core
//!
//! - [`MediaVault`]: writes uploaded files and hands back a URL for the message
//! - [`Notifier`]: sends a "someone is waiting" email through an EmailJS-style API

pub mod error;
pub mod media;
pub mod notify;

pub use error::RelayError;
pub use media::{MediaVault, StoredMedia};
pub use notify::{DeliveryReport, NotifyConfig, Notifier};
