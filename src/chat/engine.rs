//! Conversation sync state machine.
//!
//! The engine is `Idle` until a contact is selected and `Active(contact)`
//! afterwards. Selecting a contact renders what is cached, fetches the
//! conversation and arms a repeating poll timer. Network calls and the timer
//! run on a tokio runtime and report back as [`EngineEvent`]s, which are
//! processed one at a time, so session state has a single writer.
//!
//! Responses are tagged with the address they were requested for and dropped
//! if that contact is no longer active when they arrive. Timer ticks carry the
//! generation of the selection that armed them and are ignored once a newer
//! selection exists.
//!
//! Optimistic sends are appended and rendered before the request is issued.
//! A failed send is reported but the message is not rolled back.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::client::Transport;
use crate::api::models::{Contact, FetchResponse, SendRequest};
use crate::app::AppConfig;
use crate::error::{ChatError, TransportError};
use crate::utils;

use super::cache::{ConversationCache, ConversationState};
use super::events::{EngineEvent, EngineHandle, Notice};
use super::message::Message;
use super::render::Renderer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Active(Contact),
}

#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub poll_period: Duration,
    pub echo_skew: chrono::Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SyncSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_period: config.poll_interval(),
            echo_skew: config.echo_skew(),
        }
    }
}

struct PollTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Session-wide state, written only by the engine.
pub struct SessionState {
    active_contact: Option<Contact>,
    conversations: ConversationCache,
    poll_timer: Option<PollTimer>,
    generation: u64,
}

pub struct SyncEngine<R: Renderer> {
    transport: Arc<dyn Transport>,
    renderer: R,
    runtime: Handle,
    events: UnboundedSender<EngineEvent>,
    poll_period: Duration,
    session: SessionState,
}

impl<R: Renderer> SyncEngine<R> {
    /// Builds an idle engine and the receiving end of its event channel.
    pub fn new(
        transport: Arc<dyn Transport>,
        renderer: R,
        runtime: Handle,
        settings: SyncSettings,
    ) -> (Self, UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            transport,
            renderer,
            runtime,
            events: tx,
            poll_period: settings.poll_period,
            session: SessionState {
                active_contact: None,
                conversations: ConversationCache::new(settings.echo_skew),
                poll_timer: None,
                generation: 0,
            },
        };
        (engine, rx)
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.events.clone())
    }

    pub fn state(&self) -> SyncState {
        match &self.session.active_contact {
            Some(contact) => SyncState::Active(contact.clone()),
            None => SyncState::Idle,
        }
    }

    pub fn active_contact(&self) -> Option<&Contact> {
        self.session.active_contact.as_ref()
    }

    pub fn conversation(&self, address: &str) -> Option<&ConversationState> {
        self.session.conversations.peek(address)
    }

    /// Generation of the current selection; bumped on every select and on shutdown.
    pub fn generation(&self) -> u64 {
        self.session.generation
    }

    pub fn is_polling(&self) -> bool {
        self.session
            .poll_timer
            .as_ref()
            .is_some_and(|t| t.generation == self.session.generation)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn select_contact(&mut self, contact: Contact) {
        self.session.poll_timer = None;
        self.session.generation += 1;
        let generation = self.session.generation;
        log::info!("Selected contact {} ({})", contact.name, contact.address);

        self.session.active_contact = Some(contact.clone());
        let state = self.session.conversations.get(&contact.address);
        self.renderer.render(&contact, state);

        self.fetch(contact);
        self.session.poll_timer = Some(self.arm_timer(generation));
    }

    /// Re-fetches the active conversation. Returns whether a fetch was issued;
    /// ticks armed for an earlier selection do nothing.
    pub fn poll(&mut self, generation: u64) -> bool {
        let Some(contact) = self.session.active_contact.clone() else {
            log::debug!("Poll tick while idle");
            return false;
        };
        if generation != self.session.generation {
            log::debug!(
                "Ignoring poll tick from generation {} (current {})",
                generation,
                self.session.generation
            );
            return false;
        }
        self.fetch(contact);
        true
    }

    /// Appends `text` optimistically and sends it to the active contact.
    pub fn send(&mut self, text: &str) -> Result<(), ChatError> {
        if text.trim().is_empty() {
            self.renderer.notify(&Notice::EmptyMessage);
            return Err(ChatError::EmptyMessage);
        }
        let Some(contact) = self.session.active_contact.clone() else {
            self.renderer.notify(&Notice::NoActiveContact);
            return Err(ChatError::NoActiveContact);
        };

        let message = Message::sent(text, utils::now());
        if !self.session.conversations.append_local(&contact.address, message) {
            log::debug!("Local echo already recorded for {}", contact.address);
        }
        let state = self.session.conversations.get(&contact.address);
        self.renderer.render(&contact, state);

        let request = SendRequest {
            recipient_address: contact.address,
            content: text.to_string(),
        };
        let transport = Arc::clone(&self.transport);
        let tx = self.events.clone();
        self.runtime.spawn(async move {
            let result = transport.send_message(&request).await;
            let _ = tx.send(EngineEvent::SendCompleted {
                address: request.recipient_address,
                result,
            });
        });
        Ok(())
    }

    pub fn apply_fetch(&mut self, address: &str, result: Result<FetchResponse, TransportError>) {
        let Some(contact) = self
            .session
            .active_contact
            .clone()
            .filter(|c| c.address == address)
        else {
            log::debug!("Discarding stale response for {}", address);
            return;
        };

        match result {
            Ok(resp) => {
                let (received, sent) = resp.into_batches();
                let added = self.session.conversations.merge(address, received, sent);
                log::debug!("Merged {} new messages for {}", added, address);
                let state = self.session.conversations.get(address);
                self.renderer.render(&contact, state);
            }
            Err(e) => {
                log::warn!("Failed to load messages for {}: {}", address, e);
                self.renderer.notify(&Notice::FetchFailed {
                    address: address.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn apply_send(&mut self, address: &str, result: Result<(), TransportError>) {
        match result {
            Ok(()) => log::info!("Message sent to {}", address),
            Err(e) => {
                log::error!("Failed to send message to {}: {}", address, e);
                self.renderer.notify(&Notice::SendFailed {
                    address: address.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn process(&mut self, event: EngineEvent) -> ControlFlow<()> {
        match event {
            EngineEvent::SelectContact(contact) => self.select_contact(contact),
            EngineEvent::Submit(text) => {
                if let Err(e) = self.send(&text) {
                    log::debug!("Send rejected: {}", e);
                }
            }
            EngineEvent::PollTick { generation } => {
                self.poll(generation);
            }
            EngineEvent::FetchCompleted { address, result } => self.apply_fetch(&address, result),
            EngineEvent::SendCompleted { address, result } => self.apply_send(&address, result),
            EngineEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Processes events until `Shutdown`, then tears the session down.
    pub async fn run(mut self, mut events: UnboundedReceiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            if self.process(event).is_break() {
                break;
            }
        }
        self.shutdown();
    }

    /// Cancels the poll timer and returns to `Idle`. Cached conversations are kept.
    pub fn shutdown(&mut self) {
        self.session.poll_timer = None;
        self.session.active_contact = None;
        self.session.generation += 1;
        log::debug!("Sync engine stopped");
    }

    fn fetch(&self, contact: Contact) {
        let transport = Arc::clone(&self.transport);
        let tx = self.events.clone();
        self.runtime.spawn(async move {
            let result = transport.fetch_messages(&contact).await;
            let _ = tx.send(EngineEvent::FetchCompleted {
                address: contact.address,
                result,
            });
        });
    }

    fn arm_timer(&self, generation: u64) -> PollTimer {
        let tx = self.events.clone();
        let period = self.poll_period;
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(EngineEvent::PollTick { generation }).is_err() {
                    break;
                }
            }
        });
        PollTimer { generation, task }
    }
}
