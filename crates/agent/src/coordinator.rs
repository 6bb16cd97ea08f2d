//! Wires gate, context store, orchestrator and transport together.
//!
//! ```text
//! inbound ─▶ gate ─▶ store.append ─▶ spawn ┬─ pre-delay
//!                                          ├─ typing
//!                                          ├─ orchestrator.respond
//!                                          ├─ store.append_if_present
//!                                          ├─ post-delay
//!                                          └─ stop_typing + message
//! ```
//!
//! The gate check and the user append run before `on_message` returns, so
//! messages from one session are recorded in arrival order. Everything
//! after that runs in its own task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chatrelay_config::{AppConfig, TypingConfig};
use chatrelay_core::message::{ChatEvent, ChatLine, HistoryEntry, InboundMessage, SessionHandle};
use chatrelay_core::random::RandomSource;
use chatrelay_core::transport::Transport;
use chatrelay_memory::ConversationContextStore;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gate::ResponseGate;
use crate::orchestrator::FallbackOrchestrator;

/// The reply sent when generation blows up unexpectedly.
pub fn apology(sender: &str) -> String {
    format!("Sorry {sender}, I'm having trouble processing that right now. Please try again! 🤖⚠️")
}

pub struct Coordinator {
    gate: ResponseGate,
    orchestrator: FallbackOrchestrator,
    store: Arc<ConversationContextStore>,
    transport: Arc<dyn Transport>,
    random: Arc<dyn RandomSource>,
    assistant_name: String,
    typing: TypingConfig,
}

impl Coordinator {
    pub fn new(
        orchestrator: FallbackOrchestrator,
        store: Arc<ConversationContextStore>,
        transport: Arc<dyn Transport>,
        random: Arc<dyn RandomSource>,
        config: &AppConfig,
    ) -> Self {
        Self {
            gate: ResponseGate::new(random.clone(), config.assistant.idle_chatter_probability),
            orchestrator,
            store,
            transport,
            random,
            assistant_name: config.assistant.name.clone(),
            typing: config.assistant.typing.clone(),
        }
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn store(&self) -> &Arc<ConversationContextStore> {
        &self.store
    }

    /// Handle one chat message.
    ///
    /// Returns the spawned reply task, or `None` when the gate declines.
    pub async fn on_message(self: &Arc<Self>, inbound: InboundMessage) -> Option<JoinHandle<()>> {
        if !self.gate.should_respond(&inbound.text, &inbound.sender) {
            debug!(session = %inbound.session, "Gate declined");
            return None;
        }

        let entry = HistoryEntry::user(inbound.text.clone(), inbound.sender.clone()).at(inbound.received_at);
        let mut snapshot = self.store.append(&inbound.session, entry).await;
        // The entry just appended is the message being answered.
        snapshot.history.pop();
        let history = snapshot.history;

        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.reply(inbound, history).await }))
    }

    /// Drop a session's context once its connection is gone.
    pub async fn end_session(&self, session: &SessionHandle) {
        if self.store.remove(session).await {
            debug!(%session, "Conversation context removed");
        }
    }

    async fn reply(&self, inbound: InboundMessage, history: Vec<HistoryEntry>) {
        tokio::time::sleep(self.typing.pre_delay()).await;
        self.emit(ChatEvent::Typing {
            username: self.assistant_name.clone(),
        })
        .await;

        let generation = self
            .orchestrator
            .respond(&inbound.text, &inbound.sender, &history);

        let text = match AssertUnwindSafe(generation).catch_unwind().await {
            Ok(text) => text,
            Err(panic) => {
                error!(session = %inbound.session, cause = %panic_message(&*panic), "Reply generation panicked");
                return self.fail(&inbound.sender).await;
            }
        };

        self.store
            .append_if_present(&inbound.session, HistoryEntry::assistant(text.clone()))
            .await;

        tokio::time::sleep(self.typing.post_delay(self.random.unit())).await;
        self.emit(ChatEvent::StopTyping).await;

        info!(to = %inbound.sender, reply = %text, "{} replied", self.assistant_name);
        self.emit(ChatEvent::Message(ChatLine::assistant(&self.assistant_name, text)))
            .await;
    }

    async fn fail(&self, sender: &str) {
        self.emit(ChatEvent::StopTyping).await;
        self.emit(ChatEvent::Message(ChatLine::assistant(
            &self.assistant_name,
            apology(sender),
        )))
        .await;
    }

    async fn emit(&self, event: ChatEvent) {
        if let Err(e) = self.transport.broadcast(event).await {
            warn!(error = %e, "Failed to deliver event");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatrelay_core::error::{ProviderError, TransportError};
    use chatrelay_core::message::Role;
    use chatrelay_core::provider::{GenerateRequest, Provider};
    use chatrelay_core::random::FixedRandom;
    use chatrelay_providers::FallbackChain;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ChatEvent>>);

    impl Recorder {
        fn events(&self) -> Vec<ChatEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn broadcast(&self, event: ChatEvent) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn broadcast(&self, _event: ChatEvent) -> Result<(), TransportError> {
            Err(TransportError::NoListeners)
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl Provider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<String, ProviderError> {
            Ok(self.0.into())
        }
    }

    struct Exploding;

    #[async_trait]
    impl Provider for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<String, ProviderError> {
            panic!("provider bug");
        }
    }

    fn coordinator(chain: FallbackChain, random: f64) -> (Arc<Coordinator>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let random: Arc<dyn RandomSource> = Arc::new(FixedRandom(random));
        let config = AppConfig::default();
        let coordinator = Coordinator::new(
            FallbackOrchestrator::new(chain, random.clone()),
            Arc::new(ConversationContextStore::new()),
            recorder.clone(),
            random,
            &config,
        );
        (Arc::new(coordinator), recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn declined_message_does_nothing() {
        let (c, recorder) = coordinator(FallbackChain::new(), 0.99);
        let handle = c.on_message(InboundMessage::new("ok", "Bob", "s1")).await;
        assert!(handle.is_none());
        assert!(recorder.events().is_empty());
        assert!(c.store().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_sequence_and_history() {
        let chain = FallbackChain::new().add_default(Arc::new(Fixed("Rust is great")));
        let (c, recorder) = coordinator(chain, 0.99);

        let handle = c
            .on_message(InboundMessage::new("what is rust?", "Alice", "s1"))
            .await
            .unwrap();
        handle.await.unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            ChatEvent::Typing {
                username: "ChatBot AI".into()
            }
        );
        assert_eq!(events[1], ChatEvent::StopTyping);
        match &events[2] {
            ChatEvent::Message(line) => {
                assert_eq!(line.sender, "ChatBot AI");
                assert_eq!(line.text, "Rust is great");
                assert!(line.is_assistant);
            }
            other => panic!("expected message, got {other:?}"),
        }

        let ctx = c.store().get(&"s1".into()).await;
        let roles: Vec<_> = ctx.history.iter().map(|e| e.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_delays_are_honored() {
        let (c, recorder) = coordinator(FallbackChain::new(), 0.0);
        let start = tokio::time::Instant::now();

        let handle = c.on_message(InboundMessage::new("hi", "Alice", "s1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(recorder.events().is_empty());

        handle.await.unwrap();
        // FixedRandom(0.0) gives the minimum post-typing delay.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500 + 1500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn panic_becomes_apology() {
        let chain = FallbackChain::new().add_default(Arc::new(Exploding));
        let (c, recorder) = coordinator(chain, 0.99);

        c.on_message(InboundMessage::new("what now?", "Dana", "s9"))
            .await
            .unwrap()
            .await
            .unwrap();

        let events = recorder.events();
        assert_eq!(events[1], ChatEvent::StopTyping);
        match &events[2] {
            ChatEvent::Message(line) => {
                assert_eq!(line.text, apology("Dana"));
                assert!(line.is_assistant);
            }
            other => panic!("expected apology, got {other:?}"),
        }

        // Only the user's turn was remembered.
        assert_eq!(c.store().get(&"s9".into()).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ended_session_is_not_resurrected() {
        let chain = FallbackChain::new().add_default(Arc::new(Fixed("late reply")));
        let (c, recorder) = coordinator(chain, 0.99);
        let session: SessionHandle = "gone".into();

        let handle = c
            .on_message(InboundMessage::new("hello", "Eve", "gone"))
            .await
            .unwrap();
        c.end_session(&session).await;
        handle.await.unwrap();

        assert!(!c.store().contains(&session).await);
        assert_eq!(recorder.events().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn same_session_appends_in_arrival_order() {
        let (c, _recorder) = coordinator(FallbackChain::new(), 0.99);
        let mut handles = Vec::new();
        for text in ["first?", "second?", "third?"] {
            handles.push(c.on_message(InboundMessage::new(text, "Al", "s1")).await.unwrap());
        }
        for h in handles {
            h.await.unwrap();
        }

        let users: Vec<_> = c
            .store()
            .get(&"s1".into())
            .await
            .history
            .into_iter()
            .filter(|e| e.role == Role::User)
            .map(|e| e.text)
            .collect();
        assert_eq!(users, ["first?", "second?", "third?"]);
    }

    #[tokio::test(start_paused = true)]
    async fn undeliverable_events_do_not_stop_the_reply() {
        let random: Arc<dyn RandomSource> = Arc::new(FixedRandom(0.99));
        let chain = FallbackChain::new().add_default(Arc::new(Fixed("still here")));
        let c = Arc::new(Coordinator::new(
            FallbackOrchestrator::new(chain, random.clone()),
            Arc::new(ConversationContextStore::new()),
            Arc::new(Unreachable),
            random,
            &AppConfig::default(),
        ));

        c.on_message(InboundMessage::new("anyone there?", "Finn", "s1"))
            .await
            .unwrap()
            .await
            .unwrap();

        let ctx = c.store().get(&"s1".into()).await;
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.history[1].text, "still here");
    }
}
