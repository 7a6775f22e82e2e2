//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;
use std::collections::HashMap;

use super::session::Session;

/// Shell authentication phase.
///
/// `Loading` is entered on startup while the persisted session is read;
/// the only way back from `SignedIn` is an explicit logout, which clears
/// storage and reloads the page.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthPhase {
    Loading,
    SignedOut,
    SignedIn(Session),
}

/// Online/offline status as reported by the presence channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// A peer chosen from the friend list or search results.
///
/// Both fields are required to open a conversation: the numeric id is the
/// stable identity, the username is the display identity that also derives
/// the room key.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerSelection {
    pub id: i64,
    pub username: String,
}

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Shell state machine: Loading -> SignedOut -> SignedIn
    pub auth: RwSignal<AuthPhase>,
    /// Username -> presence, mutated only by the presence channel
    pub online_users: RwSignal<HashMap<String, PresenceStatus>>,
    /// Currently selected conversation peer
    pub active_peer: RwSignal<Option<PeerSelection>>,
    /// Bumped to force a full refetch of the friend list
    pub refresh_friends: RwSignal<u32>,
    /// Presence channel connection status
    pub presence_connected: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        auth: create_rw_signal(AuthPhase::Loading),
        online_users: create_rw_signal(HashMap::new()),
        active_peer: create_rw_signal(None),
        refresh_friends: create_rw_signal(0),
        presence_connected: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// The signed-in session, if any.
    pub fn session(&self) -> Option<Session> {
        match self.auth.get() {
            AuthPhase::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    /// Record a presence event for a user.
    pub fn set_presence(&self, username: &str, status: PresenceStatus) {
        self.online_users.update(|users| {
            users.insert(username.to_string(), status);
        });
    }

    /// Whether the presence channel currently reports a user as online.
    pub fn is_online(&self, username: &str) -> bool {
        self.online_users
            .with(|users| users.get(username) == Some(&PresenceStatus::Online))
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}
