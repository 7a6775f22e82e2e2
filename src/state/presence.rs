//! Presence Channel Client
//!
//! One long-lived socket per authenticated session, streaming
//! online/offline transitions for all known users into the shared online
//! map.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::global::{GlobalState, PresenceStatus};
use super::socket::ReconnectPolicy;

/// Inbound presence event: a user went online or offline.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PresenceEvent {
    pub user: String,
    pub status: String,
}

/// Decode a presence payload. Unknown status strings degrade to offline;
/// malformed payloads are dropped.
pub fn parse_presence(text: &str) -> Option<(String, PresenceStatus)> {
    let event: PresenceEvent = serde_json::from_str(text).ok()?;
    let status = if event.status == "online" {
        PresenceStatus::Online
    } else {
        PresenceStatus::Offline
    };
    Some((event.user, status))
}

/// WebSocket client for the presence stream.
pub struct PresenceChannel {
    ws: Rc<RefCell<Option<WebSocket>>>,
    url: String,
    policy: ReconnectPolicy,
    reconnect_attempts: Rc<RefCell<u32>>,
}

impl PresenceChannel {
    pub fn new(url: &str, policy: ReconnectPolicy) -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            url: url.to_string(),
            policy,
            reconnect_attempts: Rc::new(RefCell::new(0)),
        }
    }

    /// Open the socket. No handshake payload is required; the endpoint is
    /// already scoped to the session user.
    pub fn connect(&self, state: GlobalState, self_user: String) {
        match WebSocket::new(&self.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, state, self_user);
                *self.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                // Log only: the channel stays lost until the session remounts
                web_sys::console::error_1(
                    &format!("Presence WebSocket connection failed: {:?}", e).into(),
                );
            }
        }
    }

    fn setup_handlers(&self, ws: &WebSocket, state: GlobalState, self_user: String) {
        let url = self.url.clone();
        let policy = self.policy;
        let ws_ref = Rc::clone(&self.ws);
        let reconnect_attempts = Rc::clone(&self.reconnect_attempts);

        // On open
        let state_clone = state.clone();
        let reconnect_clone = Rc::clone(&reconnect_attempts);
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"Presence WebSocket connected".into());
            state_clone.presence_connected.set(true);
            *reconnect_clone.borrow_mut() = 0;
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        // On message
        let state_clone = state.clone();
        let user_clone = self_user.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text_str: String = text.into();
                if let Some((user, status)) = parse_presence(&text_str) {
                    state_clone.set_presence(&user, status);

                    if status == PresenceStatus::Online && user != user_clone {
                        crate::notify::show_online_notification(&user);
                    }
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close
        let state_clone = state.clone();
        let user_for_close = self_user.clone();
        let ws_clone = Rc::clone(&ws_ref);
        let reconnect_clone = Rc::clone(&reconnect_attempts);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!(
                    "Presence WebSocket closed: code={}, reason={}",
                    event.code(),
                    event.reason()
                )
                .into(),
            );
            state_clone.presence_connected.set(false);

            let attempts = *reconnect_clone.borrow();
            if let Some(delay) = policy.delay_ms(attempts) {
                *reconnect_clone.borrow_mut() = attempts + 1;

                let state_inner = state_clone.clone();
                let user_inner = user_for_close.clone();
                let url_inner = url.clone();
                let ws_inner = Rc::clone(&ws_clone);
                let reconnect_inner = Rc::clone(&reconnect_clone);
                gloo_timers::callback::Timeout::new(delay, move || {
                    let channel = PresenceChannel {
                        ws: ws_inner,
                        url: url_inner,
                        policy,
                        reconnect_attempts: reconnect_inner,
                    };
                    channel.connect(state_inner, user_inner);
                })
                .forget();
            }
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error: log only, no teardown here (close fires separately)
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("Presence WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    /// Close the socket. Inbound events already in flight may be dropped.
    pub fn close(&self) {
        if let Some(ws) = self.ws.borrow().as_ref() {
            let _ = ws.close_with_code(1000);
        }
    }
}

/// Open the presence channel for the signed-in user (call from the shell).
pub fn init_presence(state: GlobalState, self_user: &str) -> PresenceChannel {
    let url = format!("{}/status/{}/", crate::api::get_ws_base(), self_user);

    let channel = PresenceChannel::new(&url, ReconnectPolicy::None);
    channel.connect(state, self_user.to_string());
    channel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_presence_online() {
        assert_eq!(
            parse_presence(r#"{"user":"bob","status":"online"}"#),
            Some(("bob".to_string(), PresenceStatus::Online))
        );
    }

    #[test]
    fn test_parse_presence_offline_and_unknown_status() {
        assert_eq!(
            parse_presence(r#"{"user":"bob","status":"offline"}"#),
            Some(("bob".to_string(), PresenceStatus::Offline))
        );
        assert_eq!(
            parse_presence(r#"{"user":"bob","status":"away"}"#),
            Some(("bob".to_string(), PresenceStatus::Offline))
        );
    }

    #[test]
    fn test_parse_presence_rejects_malformed() {
        assert_eq!(parse_presence(r#"{"status":"online"}"#), None);
        assert_eq!(parse_presence("not json"), None);
    }
}
