//! Direct-messaging client core: per-contact conversation sync with
//! deduplication, time-ordered merging, optimistic send and periodic polling.

pub mod api;
pub mod app;
pub mod chat;
pub mod error;
pub mod utils;

#[cfg(feature = "gtk")]
pub mod ui;

pub use api::client::{ApiClient, Transport};
pub use api::models::Contact;
pub use app::AppConfig;
pub use chat::engine::{SyncEngine, SyncState};
pub use chat::events::{EngineEvent, EngineHandle, Notice};
pub use chat::message::{Direction, Message};
pub use error::{ChatError, ConfigError, TransportError};
