//! HTTP API Client
//!
//! Functions for communicating with the chat backend REST API. Every
//! authenticated call carries the session token as an `Authorization: Token`
//! header.

use gloo_net::http::Request;

use crate::state::chat::ChatMessage;
use crate::state::session::Session;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(Some(url)) = storage.get_item("nebula_api_url") {
                url
            } else {
                DEFAULT_API_BASE.to_string()
            }
        } else {
            DEFAULT_API_BASE.to_string()
        }
    } else {
        DEFAULT_API_BASE.to_string()
    };
    // Normalize: remove trailing slash
    url.trim_end_matches('/').to_string()
}

/// WebSocket base URL derived from the API base.
pub fn get_ws_base() -> String {
    ws_base_from(&get_api_base())
}

fn ws_base_from(api_base: &str) -> String {
    let base = api_base
        .replace("https://", "wss://")
        .replace("http://", "ws://");
    let base = base.trim_end_matches("/api");
    format!("{}/ws", base)
}

// ============ Response Types ============

/// A user as returned by search and friend-list endpoints.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, serde::Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, serde::Deserialize)]
struct HistoryRecord {
    sender_username: String,
    content: String,
    timestamp: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    pub error: String,
}

// ============ API Functions ============

/// Exchange credentials for a token-bearing session.
pub async fn login(username: &str, password: &str) -> Result<Session, String> {
    #[derive(serde::Serialize)]
    struct LoginRequest {
        username: String,
        password: String,
    }

    let api_base = get_api_base();

    let response = Request::post(&format!("{}/login/", api_base))
        .json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let error: ApiError = response.json().await.unwrap_or(ApiError {
            error: "Invalid credentials".to_string(),
        });
        return Err(error.error);
    }

    let result: LoginResponse = response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))?;

    if result.token.is_empty() {
        return Err("No token received from server".to_string());
    }

    Ok(Session::new(username, &result.token))
}

/// Create a new account.
pub async fn register(username: &str, email: &str, password: &str) -> Result<(), String> {
    #[derive(serde::Serialize)]
    struct RegisterRequest {
        username: String,
        email: String,
        password: String,
    }

    let api_base = get_api_base();

    let response = Request::post(&format!("{}/register/", api_base))
        .json(&RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let error: ApiError = response.json().await.unwrap_or(ApiError {
            error: "Username might be taken".to_string(),
        });
        return Err(error.error);
    }

    Ok(())
}

/// Search users by name fragment.
pub async fn search_users(session: &Session, query: &str) -> Result<Vec<UserSummary>, String> {
    let api_base = get_api_base();

    let response = Request::get(&format!("{}/users/?search={}", api_base, query))
        .header("Authorization", &auth_header(session))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let error: ApiError = response.json().await.unwrap_or(ApiError {
            error: "Search failed".to_string(),
        });
        return Err(error.error);
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

/// Fetch the friend list.
pub async fn fetch_friends(session: &Session) -> Result<Vec<UserSummary>, String> {
    let api_base = get_api_base();

    let response = Request::get(&format!("{}/chat/friends/", api_base))
        .header("Authorization", &auth_header(session))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let error: ApiError = response.json().await.unwrap_or(ApiError {
            error: "Failed to load friends".to_string(),
        });
        return Err(error.error);
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

/// Fetch message history for a conversation.
///
/// 404 (no history yet) and 401 degrade to an empty conversation rather
/// than an error state.
pub async fn fetch_history(session: &Session, peer: &str) -> Result<Vec<ChatMessage>, String> {
    let api_base = get_api_base();

    let response = Request::get(&format!("{}/chat/messages/{}/", api_base, peer))
        .header("Authorization", &auth_header(session))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        if history_degrades_to_empty(response.status()) {
            return Ok(Vec::new());
        }
        return Err("Failed to load message history".to_string());
    }

    let records: Vec<HistoryRecord> = response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))?;

    Ok(records
        .into_iter()
        .map(|record| ChatMessage {
            sender: record.sender_username,
            content: record.content,
            timestamp: display_time(&record.timestamp),
        })
        .collect())
}

fn auth_header(session: &Session) -> String {
    format!("Token {}", session.token)
}

/// Whether a history fetch failure means "empty conversation" instead of an
/// error.
fn history_degrades_to_empty(status: u16) -> bool {
    matches!(status, 404 | 401)
}

/// Format a backend timestamp for display. Falls back to the raw string if
/// it doesn't parse.
fn display_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_base_derivation() {
        assert_eq!(
            ws_base_from("http://localhost:8000/api"),
            "ws://localhost:8000/ws"
        );
        assert_eq!(
            ws_base_from("https://chat.example.com/api"),
            "wss://chat.example.com/ws"
        );
    }

    #[test]
    fn test_history_fallback_statuses() {
        assert!(history_degrades_to_empty(404));
        assert!(history_degrades_to_empty(401));
        assert!(!history_degrades_to_empty(500));
        assert!(!history_degrades_to_empty(403));
    }

    #[test]
    fn test_display_time_formats_rfc3339() {
        assert_eq!(display_time("2026-03-01T14:05:00+00:00"), "14:05");
    }

    #[test]
    fn test_display_time_falls_back_to_raw() {
        assert_eq!(display_time("yesterday"), "yesterday");
    }
}
