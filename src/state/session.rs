//! Session Store
//!
//! The authenticated identity and bearer token, persisted in browser local
//! storage. All storage access for the session goes through `load`, `save`
//! and `clear`; components never touch the underlying keys directly.

const TOKEN_KEY: &str = "nebula_token";
const USERNAME_KEY: &str = "nebula_username";

/// The current authenticated identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub username: String,
    pub token: String,
}

impl Session {
    pub fn new(username: &str, token: &str) -> Self {
        Self {
            username: username.to_string(),
            token: token.to_string(),
        }
    }

    /// Restore the persisted session, if any.
    ///
    /// A missing or partial entry is treated as "no session", never as an
    /// error. Session restoration is not retried.
    pub fn load() -> Option<Session> {
        let storage = local_storage()?;
        let token = storage.get_item(TOKEN_KEY).ok()??;
        let username = storage.get_item(USERNAME_KEY).ok()??;

        if token.is_empty() || username.is_empty() {
            return None;
        }

        Some(Session { username, token })
    }

    /// Persist the session for future page loads.
    pub fn save(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(TOKEN_KEY, &self.token);
            let _ = storage.set_item(USERNAME_KEY, &self.username);
        }
    }

    /// Wipe all persisted client state. Used on logout, which is followed by
    /// a full page reload.
    pub fn clear() {
        if let Some(storage) = local_storage() {
            let _ = storage.clear();
        }
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}
