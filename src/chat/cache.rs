use std::collections::{HashMap, HashSet};

use chrono::Duration;

use super::identity::{identity_of, MessageIdentity};
use super::merge::{merge_by_time, merge_sorted};
use super::message::{Direction, Message};

// how far a server echo may be stamped before the local send
const EARLY_ECHO_SECS: i64 = 5;

/// Messages already known for one contact, time ordered and duplicate free.
#[derive(Debug, Clone)]
pub struct ConversationState {
    address: String,
    messages: Vec<Message>,
    seen_ids: HashSet<MessageIdentity>,
    // optimistic sends not yet echoed back by the server
    unconfirmed: Vec<MessageIdentity>,
}

impl ConversationState {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            messages: Vec::new(),
            seen_ids: HashSet::new(),
            unconfirmed: Vec::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_seen(&self, message: &Message) -> bool {
        self.seen_ids.contains(&identity_of(message, &self.address))
    }

    /// True for a local message the server has not echoed yet.
    pub fn is_pending(&self, message: &Message) -> bool {
        message.direction == Direction::Sent
            && self.unconfirmed.contains(&identity_of(message, &self.address))
    }

    /// Matches a server echo against the closest unconfirmed local message
    /// with the same content. The echo may trail the local send by up to
    /// `skew` but lead it by at most `EARLY_ECHO_SECS`, so older history with the
    /// same text is never taken for it. The matched entry stays where it is.
    fn confirm_echo(&mut self, echo: &MessageIdentity, skew: Duration) -> bool {
        let early = Duration::seconds(EARLY_ECHO_SECS).min(skew);
        let best = self
            .unconfirmed
            .iter()
            .enumerate()
            .filter(|(_, local)| local.content == echo.content)
            .map(|(idx, local)| (idx, echo.sent_at - local.sent_at))
            .filter(|(_, lag)| *lag >= -early && *lag <= skew)
            .min_by_key(|(_, lag)| lag.abs());
        match best {
            Some((idx, _)) => {
                self.unconfirmed.remove(idx);
                true
            }
            None => false,
        }
    }
}

fn tagged(batch: Vec<Message>, direction: Direction) -> Vec<Message> {
    batch
        .into_iter()
        .map(|m| Message { direction, ..m })
        .collect()
}

/// Per-contact conversation store, keyed by contact address.
#[derive(Debug)]
pub struct ConversationCache {
    conversations: HashMap<String, ConversationState>,
    echo_skew: Duration,
}

impl Default for ConversationCache {
    fn default() -> Self {
        Self::new(Duration::seconds(120))
    }
}

impl ConversationCache {
    pub fn new(echo_skew: Duration) -> Self {
        Self {
            conversations: HashMap::new(),
            echo_skew,
        }
    }

    /// Returns the conversation for `address`, creating an empty one if needed.
    pub fn get(&mut self, address: &str) -> &mut ConversationState {
        self.conversations
            .entry(address.to_string())
            .or_insert_with(|| ConversationState::new(address))
    }

    pub fn peek(&self, address: &str) -> Option<&ConversationState> {
        self.conversations.get(address)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Merges a fetched batch into the conversation. Returns how many
    /// messages were added; merging the same batch again adds none.
    pub fn merge(&mut self, address: &str, received: Vec<Message>, sent: Vec<Message>) -> usize {
        let skew = self.echo_skew;
        let state = self.get(address);
        let batch = merge_sorted(
            tagged(received, Direction::Received),
            tagged(sent, Direction::Sent),
        );

        let mut fresh = Vec::new();
        for message in batch {
            let id = identity_of(&message, address);
            if state.seen_ids.contains(&id) {
                if message.direction == Direction::Sent {
                    state.unconfirmed.retain(|local| local != &id);
                }
                continue;
            }
            if message.direction == Direction::Sent && state.confirm_echo(&id, skew) {
                state.seen_ids.insert(id);
                continue;
            }
            state.seen_ids.insert(id);
            fresh.push(message);
        }

        let added = fresh.len();
        if added > 0 {
            let existing = std::mem::take(&mut state.messages);
            state.messages = merge_by_time(existing, fresh);
        }
        added
    }

    /// Records an optimistic local send. Returns false if it was already known.
    pub fn append_local(&mut self, address: &str, message: Message) -> bool {
        let message = Message {
            direction: Direction::Sent,
            ..message
        };
        let state = self.get(address);
        let id = identity_of(&message, address);
        if !state.seen_ids.insert(id.clone()) {
            return false;
        }
        let pos = state
            .messages
            .partition_point(|m| m.sent_at <= message.sent_at);
        state.messages.insert(pos, message);
        state.unconfirmed.push(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::merge::is_time_ordered;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    const ALICE: &str = "alice@example.com";

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn contents(state: &ConversationState) -> Vec<&str> {
        state.messages().iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn get_creates_empty_state_lazily() {
        let mut cache = ConversationCache::default();
        assert!(cache.peek(ALICE).is_none());
        assert!(cache.get(ALICE).is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn merge_tags_direction_from_batch() {
        let mut cache = ConversationCache::default();
        cache.merge(
            ALICE,
            vec![Message::sent("from alice", at(1))],
            vec![Message::received("from me", at(2))],
        );
        let state = cache.get(ALICE);
        assert_eq!(state.messages()[0].direction, Direction::Received);
        assert_eq!(state.messages()[1].direction, Direction::Sent);
    }

    #[test]
    fn merge_twice_is_noop() {
        let mut cache = ConversationCache::default();
        let received = vec![Message::received("hi", at(0)), Message::received("there", at(2))];
        let sent = vec![Message::sent("hey", at(1))];
        assert_eq!(cache.merge(ALICE, received.clone(), sent.clone()), 3);
        let before = cache.get(ALICE).messages().to_vec();
        assert_eq!(cache.merge(ALICE, received, sent), 0);
        assert_eq!(cache.get(ALICE).messages(), before.as_slice());
    }

    #[test]
    fn later_arrivals_slot_into_time_order() {
        let mut cache = ConversationCache::default();
        cache.merge(ALICE, vec![Message::received("a", at(0)), Message::received("c", at(10))], vec![]);
        cache.merge(ALICE, vec![], vec![Message::sent("b", at(5))]);
        assert_eq!(contents(cache.get(ALICE)), ["a", "b", "c"]);
    }

    #[test]
    fn same_timestamp_keeps_arrival_order() {
        let mut cache = ConversationCache::default();
        cache.merge(ALICE, vec![], vec![Message::sent("first", at(3))]);
        cache.merge(ALICE, vec![Message::received("second", at(3))], vec![]);
        assert_eq!(contents(cache.get(ALICE)), ["first", "second"]);
    }

    #[test]
    fn conversations_are_isolated_by_address() {
        let mut cache = ConversationCache::default();
        cache.merge(ALICE, vec![Message::received("hi", at(0))], vec![]);
        cache.merge("bob@example.com", vec![Message::received("hi", at(0))], vec![]);
        assert_eq!(cache.get(ALICE).len(), 1);
        assert_eq!(cache.get("bob@example.com").len(), 1);
    }

    #[test]
    fn append_local_is_pending_until_echoed() {
        let mut cache = ConversationCache::default();
        let local = Message::sent("yo", at(100));
        assert!(cache.append_local(ALICE, local.clone()));
        assert!(!cache.append_local(ALICE, local.clone()));
        assert!(cache.get(ALICE).is_pending(&local));

        // server stamps the echo with its own clock
        let added = cache.merge(ALICE, vec![], vec![Message::sent("yo", at(103))]);
        assert_eq!(added, 0);
        let state = cache.get(ALICE);
        assert_eq!(contents(state), ["yo"]);
        assert!(!state.is_pending(&local));
        assert!(state.has_seen(&Message::sent("yo", at(103))));
    }

    #[test]
    fn echo_outside_skew_is_a_new_message() {
        let mut cache = ConversationCache::new(Duration::seconds(30));
        cache.append_local(ALICE, Message::sent("yo", at(0)));
        assert_eq!(cache.merge(ALICE, vec![], vec![Message::sent("yo", at(600))]), 1);
        assert_eq!(contents(cache.get(ALICE)), ["yo", "yo"]);
    }

    #[test]
    fn exact_echo_confirms_without_duplicate() {
        let mut cache = ConversationCache::default();
        let local = Message::sent("same", at(7));
        cache.append_local(ALICE, local.clone());
        assert_eq!(cache.merge(ALICE, vec![], vec![local.clone()]), 0);
        assert!(!cache.get(ALICE).is_pending(&local));
    }

    #[test]
    fn one_echo_confirms_one_local_copy() {
        let mut cache = ConversationCache::default();
        cache.append_local(ALICE, Message::sent("ok", at(0)));
        cache.append_local(ALICE, Message::sent("ok", at(1)));
        cache.merge(ALICE, vec![], vec![Message::sent("ok", at(2))]);
        let state = cache.get(ALICE);
        assert_eq!(state.len(), 2);
        assert!(state.is_pending(&Message::sent("ok", at(0))));
        assert!(!state.is_pending(&Message::sent("ok", at(1))));
    }

    #[test]
    fn older_history_with_same_text_is_not_an_echo() {
        let mut cache = ConversationCache::default();
        cache.append_local(ALICE, Message::sent("ok", at(100)));

        // history fetched after the send still holds an earlier "ok"
        assert_eq!(cache.merge(ALICE, vec![], vec![Message::sent("ok", at(40))]), 1);
        assert!(cache.get(ALICE).is_pending(&Message::sent("ok", at(100))));

        let added = cache.merge(
            ALICE,
            vec![],
            vec![Message::sent("ok", at(40)), Message::sent("ok", at(101))],
        );
        assert_eq!(added, 0);
        let state = cache.get(ALICE);
        let stamps: Vec<_> = state.messages().iter().map(|m| m.sent_at).collect();
        assert_eq!(stamps, [at(40), at(100)]);
        assert!(!state.is_pending(&Message::sent("ok", at(100))));
    }

    #[test]
    fn echo_slightly_behind_local_clock_still_confirms() {
        let mut cache = ConversationCache::default();
        let local = Message::sent("yo", at(100));
        cache.append_local(ALICE, local.clone());
        assert_eq!(cache.merge(ALICE, vec![], vec![Message::sent("yo", at(97))]), 0);
        assert!(!cache.get(ALICE).is_pending(&local));
    }

    fn batch_strategy() -> impl Strategy<Value = (Vec<(i64, u8)>, Vec<(i64, u8)>)> {
        (
            prop::collection::vec((0i64..40, 0u8..4), 0..12),
            prop::collection::vec((0i64..40, 0u8..4), 0..12),
        )
    }

    fn to_messages(raw: &[(i64, u8)], direction: Direction) -> Vec<Message> {
        raw.iter()
            .map(|(secs, tag)| Message::new(format!("m{tag}"), at(*secs), direction))
            .collect()
    }

    proptest! {
        #[test]
        fn merge_is_idempotent_and_sorted(batches in prop::collection::vec(batch_strategy(), 1..5)) {
            let mut cache = ConversationCache::default();
            for (received, sent) in &batches {
                let received = to_messages(received, Direction::Received);
                let sent = to_messages(sent, Direction::Sent);
                cache.merge(ALICE, received.clone(), sent.clone());
                let snapshot = cache.get(ALICE).messages().to_vec();
                prop_assert_eq!(cache.merge(ALICE, received, sent), 0);
                prop_assert_eq!(cache.get(ALICE).messages(), snapshot.as_slice());
                prop_assert!(is_time_ordered(&snapshot));
            }
            let state = cache.get(ALICE);
            let unique: HashSet<_> = state.messages().iter().map(|m| identity_of(m, ALICE)).collect();
            prop_assert_eq!(unique.len(), state.len());
            prop_assert!(state.messages().iter().all(|m| state.has_seen(m)));
        }
    }
}
