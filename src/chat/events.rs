use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::api::models::{Contact, FetchResponse};
use crate::error::TransportError;

/// Everything the sync engine reacts to. UI triggers, timer ticks and
/// network completions all arrive through the same channel.
#[derive(Debug)]
pub enum EngineEvent {
    SelectContact(Contact),
    Submit(String),
    PollTick {
        generation: u64,
    },
    FetchCompleted {
        address: String,
        result: Result<FetchResponse, TransportError>,
    },
    SendCompleted {
        address: String,
        result: Result<(), TransportError>,
    },
    Shutdown,
}

/// Feedback surfaced to the user outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EmptyMessage,
    NoActiveContact,
    FetchFailed { address: String, reason: String },
    SendFailed { address: String, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyMessage => write!(f, "Message cannot be empty"),
            Notice::NoActiveContact => write!(f, "Select a contact first"),
            Notice::FetchFailed { address, reason } => {
                write!(f, "Failed to load messages for {}: {}", address, reason)
            }
            Notice::SendFailed { address, reason } => {
                write!(f, "Failed to send message to {}: {}", address, reason)
            }
        }
    }
}

/// Cloneable sender used by UI glue to drive a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    pub(crate) fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn select_contact(&self, contact: Contact) {
        self.dispatch(EngineEvent::SelectContact(contact));
    }

    pub fn submit(&self, text: impl Into<String>) {
        self.dispatch(EngineEvent::Submit(text.into()));
    }

    pub fn shutdown(&self) {
        self.dispatch(EngineEvent::Shutdown);
    }

    fn dispatch(&self, event: EngineEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("engine stopped, dropping event");
        }
    }
}
