use super::message::Message;

/// Stable merge of two message lists by `sent_at`.
///
/// On equal timestamps messages from `received` come before those from `sent`.
/// Inputs are expected in time order already; an unordered input is sorted
/// (stably) before merging.
pub fn merge_sorted(received: Vec<Message>, sent: Vec<Message>) -> Vec<Message> {
    merge_by_time(in_time_order(received), in_time_order(sent))
}

pub(crate) fn is_time_ordered(messages: &[Message]) -> bool {
    messages.windows(2).all(|w| w[0].sent_at <= w[1].sent_at)
}

fn in_time_order(mut messages: Vec<Message>) -> Vec<Message> {
    if !is_time_ordered(&messages) {
        messages.sort_by_key(|m| m.sent_at);
    }
    messages
}

/// Linear merge of two time-ordered lists; ties keep `left` first.
pub(crate) fn merge_by_time(left: Vec<Message>, right: Vec<Message>) -> Vec<Message> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.sent_at <= r.sent_at,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        out.extend(next);
    }
    out
}
