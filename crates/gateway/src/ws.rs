//! WebSocket relay: presence, chat lines and typing indicators.
//!
//! Protocol:
//! - Client → Server: `{"type": "join", "username": "..."}`,
//!   `{"type": "chat_message", "text": "..."}`, `{"type": "typing"}`,
//!   `{"type": "stop_typing"}`, `{"type": "leave"}`
//! - Server → Client: `ChatEvent` JSON frames

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chatrelay_core::message::{ChatEvent, ChatLine, InboundMessage, SessionHandle};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, info, warn};

use crate::GatewayState;
use crate::hub::Audience;

/// Frames a browser may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join { username: String },
    ChatMessage { text: String },
    Typing,
    StopTyping,
    Leave,
}

pub fn welcome_line(username: &str) -> ChatLine {
    ChatLine::system(format!("Welcome to the chat, {username}! 👋"))
}

pub fn assistant_welcome(assistant_name: &str, username: &str) -> ChatLine {
    ChatLine::assistant(
        assistant_name,
        format!(
            "Hi {username}! I'm your friendly AI assistant. Feel free to ask me questions or just chat! 🤖✨"
        ),
    )
}

/// One socket's view of the chat, independent of the socket itself.
pub struct Connection {
    id: SessionHandle,
    state: Arc<GatewayState>,
}

impl Connection {
    pub fn new(state: Arc<GatewayState>) -> Self {
        Self {
            id: SessionHandle::new(uuid::Uuid::new_v4().to_string()),
            state,
        }
    }

    pub fn id(&self) -> &SessionHandle {
        &self.id
    }

    pub async fn handle(&self, event: ClientEvent) {
        match event {
            ClientEvent::Join { username } => self.join(username.trim()).await,
            ClientEvent::ChatMessage { text } => self.chat(&text).await,
            ClientEvent::Typing => {
                if let Some(username) = self.state.presence.username(&self.id).await {
                    self.state
                        .hub
                        .send(Audience::AllExcept(self.id.clone()), ChatEvent::Typing { username });
                }
            }
            ClientEvent::StopTyping => {
                if self.state.presence.username(&self.id).await.is_some() {
                    self.state
                        .hub
                        .send(Audience::AllExcept(self.id.clone()), ChatEvent::StopTyping);
                }
            }
            ClientEvent::Leave => self.leave().await,
        }
    }

    /// Connection is gone; same as an explicit leave.
    pub async fn close(&self) {
        self.leave().await;
    }

    async fn join(&self, username: &str) {
        if username.is_empty() {
            debug!(connection = %self.id, "Ignoring join without a username");
            return;
        }

        let online_users = self.state.presence.join(&self.id, username).await;
        info!(connection = %self.id, username, online_users, "User joined the chat");

        let hub = &self.state.hub;
        hub.send(
            Audience::AllExcept(self.id.clone()),
            ChatEvent::UserJoined {
                username: username.to_string(),
                online_users,
            },
        );
        hub.send(Audience::Only(self.id.clone()), ChatEvent::OnlineUsers { count: online_users });
        hub.send(Audience::Only(self.id.clone()), ChatEvent::Message(welcome_line(username)));

        let state = self.state.clone();
        let target = self.id.clone();
        let username = username.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(state.config.assistant.welcome_delay()).await;
            let line = assistant_welcome(&state.config.assistant.name, &username);
            state.hub.send(Audience::Only(target), ChatEvent::Message(line));
        });
    }

    async fn chat(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(username) = self.state.presence.username(&self.id).await else {
            debug!(connection = %self.id, "Ignoring message before join");
            return;
        };

        info!(connection = %self.id, "{username}: {text}");
        self.state.hub.send(
            Audience::AllExcept(self.id.clone()),
            ChatEvent::Message(ChatLine::user(&username, text)),
        );

        // The reply runs in its own task; only the append is awaited here.
        let _ = self
            .state
            .coordinator
            .on_message(InboundMessage::new(text, username, self.id.clone()))
            .await;
    }

    async fn leave(&self) {
        let Some((participant, online_users)) = self.state.presence.leave(&self.id).await else {
            return;
        };
        info!(connection = %self.id, username = %participant.username, online_users, "User left the chat");

        self.state.hub.send(
            Audience::AllExcept(self.id.clone()),
            ChatEvent::UserLeft {
                username: participant.username,
                online_users,
            },
        );
        self.state.coordinator.end_session(&self.id).await;
    }
}

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>) {
    let connection = Connection::new(state.clone());
    let id = connection.id().clone();
    info!(connection = %id, "WebSocket connection established");

    let (mut sink, mut stream) = socket.split();

    // Subscribe before reading so replies to this connection's join are not missed.
    let mut events = BroadcastStream::new(state.hub.subscribe());
    let forward_id = id.clone();
    let mut forward = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            let envelope = match item {
                Ok(envelope) => envelope,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(connection = %forward_id, skipped, "Connection fell behind, events dropped");
                    continue;
                }
            };
            if !envelope.is_for(&forward_id) {
                continue;
            }
            let json = match serde_json::to_string(&envelope.event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(json.into())).await.is_err() {
                break; // client disconnected
            }
        }
    });

    loop {
        tokio::select! {
            msg = stream.next() => {
                let text = match msg {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue, // ignore binary, ping, pong
                };
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => connection.handle(event).await,
                    Err(e) => debug!(connection = %id, error = %e, "Ignoring malformed frame"),
                }
            }
            _ = &mut forward => break,
        }
    }

    forward.abort();
    connection.close().await;
    info!(connection = %id, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Envelope;
    use chatrelay_config::{AppConfig, TypingConfig};
    use chatrelay_core::random::FixedRandom;
    use chatrelay_providers::FallbackChain;
    use std::time::Duration;
    use tokio::sync::broadcast::Receiver;

    fn state_with(typing: TypingConfig) -> Arc<GatewayState> {
        let mut config = AppConfig::default();
        config.assistant.typing = typing;
        GatewayState::new(config, FallbackChain::new(), Arc::new(FixedRandom(0.99))).unwrap()
    }

    fn state() -> Arc<GatewayState> {
        state_with(TypingConfig::instant())
    }

    fn drain(rx: &mut Receiver<Arc<Envelope>>, connection: &SessionHandle) -> Vec<ChatEvent> {
        let mut out = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            if envelope.is_for(connection) {
                out.push(envelope.event.clone());
            }
        }
        out
    }

    #[test]
    fn client_frames_parse() {
        let join: ClientEvent = serde_json::from_str(r#"{"type":"join","username":"Ann"}"#).unwrap();
        assert_eq!(join, ClientEvent::Join { username: "Ann".into() });
        let chat: ClientEvent = serde_json::from_str(r#"{"type":"chat_message","text":"yo"}"#).unwrap();
        assert_eq!(chat, ClientEvent::ChatMessage { text: "yo".into() });
        let typing: ClientEvent = serde_json::from_str(r#"{"type":"typing"}"#).unwrap();
        assert_eq!(typing, ClientEvent::Typing);
    }

    #[tokio::test(start_paused = true)]
    async fn join_greets_joiner_and_notifies_others() {
        let state = state();
        let mut rx = state.hub.subscribe();
        let alice = Connection::new(state.clone());
        let bob = Connection::new(state.clone());

        alice.handle(ClientEvent::Join { username: "Alice".into() }).await;
        bob.handle(ClientEvent::Join { username: "Bob".into() }).await;

        tokio::time::sleep(Duration::from_millis(2001)).await;
        let to_alice = drain(&mut rx, alice.id());

        assert_eq!(to_alice[0], ChatEvent::OnlineUsers { count: 1 });
        assert!(matches!(&to_alice[1], ChatEvent::Message(l) if l.is_system && l.text.contains("Alice")));
        assert!(to_alice.contains(&ChatEvent::UserJoined {
            username: "Bob".into(),
            online_users: 2
        }));
        assert!(to_alice.iter().any(|e| matches!(
            e,
            ChatEvent::Message(l) if l.is_assistant && l.text.starts_with("Hi Alice!")
        )));
    }

    #[tokio::test]
    async fn messages_before_join_are_ignored() {
        let state = state();
        let mut rx = state.hub.subscribe();
        let anon = Connection::new(state.clone());

        anon.handle(ClientEvent::ChatMessage { text: "hello?".into() }).await;
        anon.handle(ClientEvent::Typing).await;

        assert!(rx.try_recv().is_err());
        assert!(state.coordinator.store().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn chat_is_relayed_to_others_and_answered() {
        let state = state();
        let alice = Connection::new(state.clone());
        let bob = Connection::new(state.clone());
        alice.handle(ClientEvent::Join { username: "Alice".into() }).await;
        bob.handle(ClientEvent::Join { username: "Bob".into() }).await;

        let mut rx = state.hub.subscribe();
        alice.handle(ClientEvent::ChatMessage { text: "  hi everyone  ".into() }).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let to_bob = drain(&mut rx, bob.id());
        assert!(matches!(
            &to_bob[0],
            ChatEvent::Message(l) if l.sender == "Alice" && l.text == "hi everyone" && !l.is_assistant
        ));
        assert!(to_bob.iter().any(|e| matches!(e, ChatEvent::Message(l) if l.is_assistant)));

        // The sender does not get an echo of their own line.
        let mut rx = state.hub.subscribe();
        alice.handle(ClientEvent::ChatMessage { text: "ok".into() }).await;
        assert!(drain(&mut rx, alice.id()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_announces_departure_and_ends_session() {
        // Default typing delays keep the pending reply out of the way.
        let state = state_with(TypingConfig::default());
        let alice = Connection::new(state.clone());
        let bob = Connection::new(state.clone());
        alice.handle(ClientEvent::Join { username: "Alice".into() }).await;
        bob.handle(ClientEvent::Join { username: "Bob".into() }).await;
        alice.handle(ClientEvent::ChatMessage { text: "hello".into() }).await;
        assert!(state.coordinator.store().contains(alice.id()).await);

        let mut rx = state.hub.subscribe();
        alice.close().await;
        alice.close().await;

        assert_eq!(
            drain(&mut rx, bob.id()),
            vec![ChatEvent::UserLeft {
                username: "Alice".into(),
                online_users: 1
            }]
        );
        assert!(!state.coordinator.store().contains(alice.id()).await);
        assert_eq!(state.presence.online().await, 1);
    }
}
