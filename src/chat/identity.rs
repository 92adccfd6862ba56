use chrono::{DateTime, Utc};

use super::message::{Direction, Message};

/// Deduplication key of a message within one contact's conversation.
///
/// Derived only from the message itself and the contact address, never from
/// the time it was observed, so the same message fetched twice maps to the
/// same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageIdentity {
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub address: String,
    pub direction: Direction,
}

pub fn identity_of(message: &Message, address: &str) -> MessageIdentity {
    MessageIdentity {
        content: message.content.clone(),
        sent_at: message.sent_at,
        address: address.to_string(),
        direction: message.direction,
    }
}
