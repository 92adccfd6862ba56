use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message, seen from the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub direction: Direction,
}

impl Message {
    pub fn new(content: impl Into<String>, sent_at: DateTime<Utc>, direction: Direction) -> Self {
        Self {
            content: content.into(),
            sent_at,
            direction,
        }
    }

    pub fn sent(content: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self::new(content, sent_at, Direction::Sent)
    }

    pub fn received(content: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self::new(content, sent_at, Direction::Received)
    }
}
