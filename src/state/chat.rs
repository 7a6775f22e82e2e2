//! Chat Channel Client
//!
//! One WebSocket per open conversation, keyed by a room identifier derived
//! from both participants' usernames. Carries message, typing and
//! read-receipt frames.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::socket::{ReconnectPolicy, SocketStatus};

/// Idle window after the last keystroke before typing=false is emitted.
pub const TYPING_IDLE_MS: u32 = 2000;

/// Distance from the bottom of the message list (in pixels) within which
/// the viewer counts as caught up.
pub const READ_RECEIPT_SCROLL_PX: i32 = 100;

/// Derive the chat room key for a two-party conversation.
///
/// Both usernames are byte-wise sorted and joined, so either end computes
/// the same key regardless of who initiates. The ordering is stable and
/// locale-independent.
pub fn room_key(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort_unstable();
    pair.join("_")
}

/// Frames received from the chat relay.
///
/// Typing and read-receipt frames arrive tagged; relayed message frames
/// arrive untagged as `{message, sender, timestamp}` and are probed
/// separately. Inbound read receipts carry the reader's name.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Message {
        message: String,
        sender: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Typing {
        sender: String,
        typing: bool,
    },
    ReadReceipt {
        reader: String,
    },
}

/// Frames sent to the chat relay.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Message { message: String, sender: String },
    Typing { sender: String, typing: bool },
    ReadReceipt { sender: String },
}

/// Result of decoding one inbound socket payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Frame(ServerFrame),
    /// The relay reported an error; carries the message verbatim.
    Error(String),
    /// Anything that matches no known shape is dropped silently.
    Ignored,
}

/// Decode an inbound payload. Relayed messages and error frames come
/// untagged, so they are probed in turn after the tagged parse fails.
pub fn parse_inbound(text: &str) -> InboundEvent {
    if let Ok(frame) = serde_json::from_str::<ServerFrame>(text) {
        return InboundEvent::Frame(frame);
    }

    #[derive(serde::Deserialize)]
    struct RelayMessage {
        message: String,
        sender: String,
        #[serde(default)]
        timestamp: Option<String>,
    }

    if let Ok(msg) = serde_json::from_str::<RelayMessage>(text) {
        return InboundEvent::Frame(ServerFrame::Message {
            message: msg.message,
            sender: msg.sender,
            timestamp: msg.timestamp,
        });
    }

    #[derive(serde::Deserialize)]
    struct ErrorFrame {
        error: String,
    }

    if let Ok(err) = serde_json::from_str::<ErrorFrame>(text) {
        return InboundEvent::Error(err.error);
    }

    InboundEvent::Ignored
}

/// A message as displayed in the conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
    /// Pre-formatted display time (HH:MM)
    pub timestamp: String,
}

/// Side effect requested by the conversation reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEffect {
    None,
    /// A peer message arrived; raise a local notification.
    NotifyMessage { sender: String, content: String },
    /// The relay reported an error; surface it as a connection error.
    ConnectionError(String),
}

/// Per-conversation state: the ordered message list plus the ephemeral
/// typing and read flags derived from the latest channel events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conversation {
    pub messages: Vec<ChatMessage>,
    pub peer_typing: bool,
    pub all_read: bool,
}

impl Conversation {
    /// Replace the message list with the REST history. Called once per
    /// conversation before live events extend the list.
    pub fn hydrate(&mut self, history: Vec<ChatMessage>) {
        self.messages = history;
    }

    /// Apply one inbound event. `received_at` is the client-generated
    /// display timestamp attached to appended messages.
    pub fn apply(&mut self, event: InboundEvent, self_user: &str, received_at: &str) -> ChatEffect {
        match event {
            InboundEvent::Frame(ServerFrame::ReadReceipt { reader }) => {
                if reader != self_user {
                    self.all_read = true;
                }
                ChatEffect::None
            }
            InboundEvent::Frame(ServerFrame::Typing { sender, typing }) => {
                if sender != self_user {
                    self.peer_typing = typing;
                }
                ChatEffect::None
            }
            InboundEvent::Error(message) => ChatEffect::ConnectionError(message),
            InboundEvent::Frame(ServerFrame::Message {
                message, sender, ..
            }) => {
                self.peer_typing = false;

                let from_peer = sender != self_user;
                if from_peer {
                    // Re-arm the one-shot read receipt
                    self.all_read = false;
                }

                self.messages.push(ChatMessage {
                    sender: sender.clone(),
                    content: message.clone(),
                    timestamp: received_at.to_string(),
                });

                if from_peer {
                    ChatEffect::NotifyMessage {
                        sender,
                        content: message,
                    }
                } else {
                    ChatEffect::None
                }
            }
            InboundEvent::Ignored => ChatEffect::None,
        }
    }
}

/// Frames emitted for one send action: typing=false first, then the
/// message itself. Returns `None` for empty/whitespace-only input, which is
/// rejected locally with no network call.
pub fn compose_send(self_user: &str, input: &str) -> Option<Vec<ClientFrame>> {
    if input.trim().is_empty() {
        return None;
    }

    Some(vec![
        ClientFrame::Typing {
            sender: self_user.to_string(),
            typing: false,
        },
        ClientFrame::Message {
            message: input.to_string(),
            sender: self_user.to_string(),
        },
    ])
}

/// Whether the viewer is within the read-receipt threshold of the bottom of
/// the message list.
pub fn at_bottom(scroll_top: i32, scroll_height: i32, client_height: i32) -> bool {
    scroll_height - scroll_top - client_height < READ_RECEIPT_SCROLL_PX
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SendAction {
    /// Empty/whitespace input, rejected locally with no feedback.
    Skip,
    /// Socket not open; surface the message to the user. Nothing is sent or
    /// buffered and no conversation state changes.
    Alert(&'static str),
    /// Transmit these frames, then clear the input and unread flag.
    Transmit(Vec<ClientFrame>),
}

/// Decide what a send attempt does given the input and socket state.
pub fn plan_send(self_user: &str, input: &str, socket_open: bool) -> SendAction {
    match compose_send(self_user, input) {
        None => SendAction::Skip,
        Some(_) if !socket_open => {
            SendAction::Alert("Connection not established. Please refresh and try again.")
        }
        Some(frames) => SendAction::Transmit(frames),
    }
}

/// WebSocket client for one conversation.
pub struct ChatChannel {
    ws: Rc<RefCell<Option<WebSocket>>>,
    url: String,
    policy: ReconnectPolicy,
    reconnect_attempts: Rc<RefCell<u32>>,
}

impl ChatChannel {
    pub fn new(url: &str, policy: ReconnectPolicy) -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            url: url.to_string(),
            policy,
            reconnect_attempts: Rc::new(RefCell::new(0)),
        }
    }

    /// Open the socket and wire its events into the conversation signals.
    pub fn connect(
        &self,
        self_user: String,
        conv: RwSignal<Conversation>,
        status: RwSignal<SocketStatus>,
    ) {
        status.set(SocketStatus::Connecting);

        match WebSocket::new(&self.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, self_user, conv, status);
                *self.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                web_sys::console::error_1(
                    &format!("Chat WebSocket connection failed: {:?}", e).into(),
                );
                status.set(SocketStatus::Errored(
                    "Unable to open chat connection".to_string(),
                ));
            }
        }
    }

    fn setup_handlers(
        &self,
        ws: &WebSocket,
        self_user: String,
        conv: RwSignal<Conversation>,
        status: RwSignal<SocketStatus>,
    ) {
        let url = self.url.clone();
        let policy = self.policy;
        let ws_ref = Rc::clone(&self.ws);
        let reconnect_attempts = Rc::clone(&self.reconnect_attempts);

        // On open
        let reconnect_clone = Rc::clone(&reconnect_attempts);
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"Chat WebSocket connected".into());
            status.set(SocketStatus::Open);
            *reconnect_clone.borrow_mut() = 0;
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        // On message
        let user_clone = self_user.clone();
        let user_for_close = self_user.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text_str: String = text.into();
                let received_at = chrono::Local::now().format("%H:%M").to_string();

                let mut effect = ChatEffect::None;
                conv.update(|c| {
                    effect = c.apply(parse_inbound(&text_str), &user_clone, &received_at);
                });

                match effect {
                    ChatEffect::NotifyMessage { sender, content } => {
                        crate::notify::show_message_notification(&sender, &content);
                    }
                    ChatEffect::ConnectionError(message) => {
                        web_sys::console::error_1(&format!("Chat error: {}", message).into());
                        status.set(SocketStatus::Errored(message));
                    }
                    ChatEffect::None => {}
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close: normal/going-away closures end the channel quietly;
        // anything else is terminal unless the reconnect policy says retry.
        let ws_clone = Rc::clone(&ws_ref);
        let url_clone = url.clone();
        let reconnect_clone = Rc::clone(&reconnect_attempts);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!(
                    "Chat WebSocket closed: code={}, reason={}",
                    event.code(),
                    event.reason()
                )
                .into(),
            );

            if event.code() == 1000 || event.code() == 1001 {
                status.set(SocketStatus::Closed);
                return;
            }

            let attempts = *reconnect_clone.borrow();
            if let Some(delay) = policy.delay_ms(attempts) {
                *reconnect_clone.borrow_mut() = attempts + 1;

                let url_inner = url_clone.clone();
                let ws_inner = Rc::clone(&ws_clone);
                let reconnect_inner = Rc::clone(&reconnect_clone);
                let user_inner = user_for_close.clone();
                gloo_timers::callback::Timeout::new(delay, move || {
                    let channel = ChatChannel {
                        ws: ws_inner,
                        url: url_inner,
                        policy,
                        reconnect_attempts: reconnect_inner,
                    };
                    channel.connect(user_inner, conv, status);
                })
                .forget();
            } else {
                status.set(SocketStatus::Errored(
                    "Connection lost. Please refresh the page.".to_string(),
                ));
            }
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("Chat WebSocket error: {:?}", e).into());
            status.set(SocketStatus::Errored(
                "Connection error occurred".to_string(),
            ));
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    /// Send a frame. Fails when the socket is not open; frames are never
    /// buffered for later delivery.
    pub fn send(&self, frame: &ClientFrame) -> Result<(), String> {
        let ws_guard = self.ws.borrow();
        let ws = ws_guard.as_ref().ok_or("WebSocket not connected")?;

        if ws.ready_state() != WebSocket::OPEN {
            return Err("WebSocket not open".to_string());
        }

        let json = serde_json::to_string(frame).map_err(|e| e.to_string())?;
        ws.send_with_str(&json).map_err(|e| format!("{:?}", e))
    }

    /// Check if connected
    pub fn is_open(&self) -> bool {
        self.ws
            .borrow()
            .as_ref()
            .map(|ws| ws.ready_state() == WebSocket::OPEN)
            .unwrap_or(false)
    }

    /// Close the connection with a normal-closure code.
    pub fn close(&self) {
        if let Some(ws) = self.ws.borrow().as_ref() {
            let _ = ws.close_with_code(1000);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key_is_symmetric() {
        assert_eq!(room_key("alice", "bob"), room_key("bob", "alice"));
        assert_eq!(room_key("alice", "bob"), "alice_bob");
    }

    #[test]
    fn test_room_key_is_byte_ordered() {
        // Byte-wise ordering, independent of any locale collation
        assert_eq!(room_key("Zoe", "alice"), "Zoe_alice");
        assert_eq!(room_key("alice", "Zoe"), "Zoe_alice");
    }

    #[test]
    fn test_parse_typed_frames() {
        let typing = parse_inbound(r#"{"type":"typing","sender":"bob","typing":true}"#);
        assert_eq!(
            typing,
            InboundEvent::Frame(ServerFrame::Typing {
                sender: "bob".to_string(),
                typing: true,
            })
        );

        let receipt = parse_inbound(r#"{"type":"read_receipt","reader":"bob"}"#);
        assert_eq!(
            receipt,
            InboundEvent::Frame(ServerFrame::ReadReceipt {
                reader: "bob".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_untagged_relay_message() {
        // The relay broadcasts message frames without a type tag
        let event =
            parse_inbound(r#"{"message":"hi","sender":"bob","timestamp":"2026-03-01T14:05:00Z"}"#);
        assert_eq!(
            event,
            InboundEvent::Frame(ServerFrame::Message {
                message: "hi".to_string(),
                sender: "bob".to_string(),
                timestamp: Some("2026-03-01T14:05:00Z".to_string()),
            })
        );

        let mut conv = Conversation::default();
        conv.apply(event, "alice", "14:05");
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].sender, "bob");
    }

    #[test]
    fn test_parse_error_and_unknown_frames() {
        assert_eq!(
            parse_inbound(r#"{"error":"Missing message or sender"}"#),
            InboundEvent::Error("Missing message or sender".to_string())
        );
        assert_eq!(parse_inbound(r#"{"hello":"world"}"#), InboundEvent::Ignored);
        assert_eq!(parse_inbound("not json"), InboundEvent::Ignored);
    }

    #[test]
    fn test_typing_frame_does_not_touch_messages() {
        let mut conv = Conversation::default();
        let event = parse_inbound(r#"{"type":"typing","sender":"bob","typing":true}"#);

        let effect = conv.apply(event, "alice", "10:00");

        assert_eq!(effect, ChatEffect::None);
        assert!(conv.peer_typing);
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn test_own_typing_frame_is_ignored() {
        let mut conv = Conversation::default();
        let event = parse_inbound(r#"{"type":"typing","sender":"alice","typing":true}"#);

        conv.apply(event, "alice", "10:00");

        assert!(!conv.peer_typing);
    }

    #[test]
    fn test_peer_message_appends_and_rearms_read_state() {
        let mut conv = Conversation {
            peer_typing: true,
            all_read: true,
            ..Default::default()
        };
        let event = parse_inbound(r#"{"type":"message","message":"hi","sender":"bob"}"#);

        let effect = conv.apply(event, "alice", "10:05");

        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].sender, "bob");
        assert_eq!(conv.messages[0].timestamp, "10:05");
        assert!(!conv.peer_typing);
        assert!(!conv.all_read);
        assert_eq!(
            effect,
            ChatEffect::NotifyMessage {
                sender: "bob".to_string(),
                content: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_own_message_does_not_notify() {
        let mut conv = Conversation::default();
        let event = parse_inbound(r#"{"type":"message","message":"hello","sender":"alice"}"#);

        let effect = conv.apply(event, "alice", "10:06");

        assert_eq!(conv.messages.len(), 1);
        assert_eq!(effect, ChatEffect::None);
    }

    #[test]
    fn test_read_receipt_marks_all_read_without_touching_messages() {
        let mut conv = Conversation::default();
        conv.apply(
            parse_inbound(r#"{"type":"message","message":"hi","sender":"bob"}"#),
            "alice",
            "10:05",
        );
        assert!(!conv.all_read);

        let effect = conv.apply(
            parse_inbound(r#"{"type":"read_receipt","reader":"bob"}"#),
            "alice",
            "10:06",
        );

        assert_eq!(effect, ChatEffect::None);
        assert!(conv.all_read);
        assert_eq!(conv.messages.len(), 1);
    }

    #[test]
    fn test_error_frame_surfaces_connection_error() {
        let mut conv = Conversation::default();
        let effect = conv.apply(
            parse_inbound(r#"{"error":"User not found"}"#),
            "alice",
            "10:00",
        );

        assert_eq!(
            effect,
            ChatEffect::ConnectionError("User not found".to_string())
        );
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn test_compose_send_rejects_whitespace() {
        assert_eq!(compose_send("alice", ""), None);
        assert_eq!(compose_send("alice", "   \t  "), None);
    }

    #[test]
    fn test_compose_send_emits_typing_false_before_message() {
        let frames = compose_send("alice", "hello there").unwrap();

        assert_eq!(
            frames,
            vec![
                ClientFrame::Typing {
                    sender: "alice".to_string(),
                    typing: false,
                },
                ClientFrame::Message {
                    message: "hello there".to_string(),
                    sender: "alice".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_send_on_closed_socket_alerts_and_sends_nothing() {
        let action = plan_send("alice", "hello", false);
        assert!(matches!(action, SendAction::Alert(_)));

        // Empty input is still rejected silently, open or not
        assert_eq!(plan_send("alice", "   ", false), SendAction::Skip);
        assert_eq!(plan_send("alice", "", true), SendAction::Skip);
    }

    #[test]
    fn test_send_on_open_socket_transmits_composed_frames() {
        let action = plan_send("alice", "hello", true);
        assert_eq!(
            action,
            SendAction::Transmit(compose_send("alice", "hello").unwrap())
        );
    }

    #[test]
    fn test_typing_idle_window_is_two_seconds() {
        assert_eq!(TYPING_IDLE_MS, 2000);
    }

    #[test]
    fn test_read_receipt_is_one_shot_per_unread_streak() {
        let mut conv = Conversation::default();
        conv.apply(
            parse_inbound(r#"{"type":"message","message":"hi","sender":"bob"}"#),
            "alice",
            "10:05",
        );

        // Scrolled to the bottom: receipt fires once, then the flag latches
        assert!(at_bottom(900, 1000, 80) && !conv.all_read);
        conv.all_read = true;
        assert!(!(at_bottom(900, 1000, 80) && !conv.all_read));

        // The next inbound peer message re-arms it
        conv.apply(
            parse_inbound(r#"{"type":"message","message":"again","sender":"bob"}"#),
            "alice",
            "10:07",
        );
        assert!(at_bottom(900, 1000, 80) && !conv.all_read);
    }

    #[test]
    fn test_at_bottom_threshold() {
        assert!(at_bottom(901, 1000, 0));
        assert!(!at_bottom(900, 1000, 0));
        assert!(at_bottom(0, 500, 450));
    }

    #[test]
    fn test_client_frames_serialize_with_type_tag() {
        let frame = ClientFrame::ReadReceipt {
            sender: "alice".to_string(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&frame).unwrap()).unwrap();
        assert_eq!(json["type"], "read_receipt");
        assert_eq!(json["sender"], "alice");
    }
}
