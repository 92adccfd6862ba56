use crate::api::models::Contact;
use crate::utils::format_timestamp;

use super::cache::ConversationState;
use super::events::Notice;
use super::message::Direction;

pub const EMPTY_PLACEHOLDER: &str = "No messages available";

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub content: String,
    pub direction: Direction,
    pub timestamp: String,
    pub pending: bool,
}

pub fn bubbles(conversation: &ConversationState) -> Vec<Bubble> {
    conversation
        .messages()
        .iter()
        .map(|m| Bubble {
            content: m.content.clone(),
            direction: m.direction,
            timestamp: format_timestamp(&m.sent_at),
            pending: conversation.is_pending(m),
        })
        .collect()
}

/// Projects a conversation into the chat view.
///
/// `render` must be idempotent: rendering an unchanged conversation twice
/// leaves the view exactly as after the first call.
pub trait Renderer {
    fn render(&mut self, contact: &Contact, conversation: &ConversationState);

    /// User-facing feedback that is not part of the transcript.
    fn notify(&mut self, _notice: &Notice) {}
}

/// Headless renderer keeping the drawn view in memory.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    title: String,
    bubbles: Vec<Bubble>,
    scroll_anchor: Option<usize>,
    notices: Vec<Notice>,
    renders: usize,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Index of the bubble the view is scrolled to.
    pub fn scroll_anchor(&self) -> Option<usize> {
        self.scroll_anchor
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn lines(&self) -> Vec<String> {
        if self.bubbles.is_empty() {
            return vec![EMPTY_PLACEHOLDER.to_string()];
        }
        self.bubbles
            .iter()
            .map(|b| {
                let marker = match b.direction {
                    Direction::Sent => ">",
                    Direction::Received => "<",
                };
                let pending = if b.pending { " …" } else { "" };
                format!("{marker} {} [{}]{pending}", b.content, b.timestamp)
            })
            .collect()
    }
}

impl Renderer for TranscriptRenderer {
    fn render(&mut self, contact: &Contact, conversation: &ConversationState) {
        self.title = contact.name.clone();
        self.bubbles.clear();
        self.bubbles.extend(bubbles(conversation));
        self.scroll_anchor = self.bubbles.len().checked_sub(1);
        self.renders += 1;
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}
