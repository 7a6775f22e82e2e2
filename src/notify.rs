//! Desktop Notifications
//!
//! Best-effort, permission-gated browser notifications for new messages and
//! friends coming online.

use wasm_bindgen::JsValue;
use web_sys::{Notification, NotificationOptions, NotificationPermission};

const ICON_URL: &str = "https://cdn-icons-png.flaticon.com/512/733/733585.png";

/// Notification body preview length for incoming messages.
const PREVIEW_CHARS: usize = 50;

/// Whether this browser exposes the Notification API at all.
pub fn supported() -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("Notification")).unwrap_or(false)
}

fn granted() -> bool {
    supported() && Notification::permission() == NotificationPermission::Granted
}

/// Ask the user for notification permission. Returns `Ok(true)` on grant
/// and shows a confirmation notification.
pub async fn request_permission() -> Result<bool, String> {
    if !supported() {
        return Err("This browser does not support desktop notifications.".to_string());
    }

    let promise = Notification::request_permission().map_err(|e| format!("{:?}", e))?;
    let result = wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| format!("{:?}", e))?;

    let granted = result.as_string().as_deref() == Some("granted");
    if granted {
        show("Success!", "Real-time alerts are now active.");
    }

    Ok(granted)
}

/// Notify about an incoming message from a peer.
pub fn show_message_notification(sender: &str, content: &str) {
    if !granted() {
        return;
    }
    show(&format!("New message from {}", sender), &preview(content));
}

/// Notify that a user just came online.
pub fn show_online_notification(user: &str) {
    if !granted() {
        return;
    }
    show("New Activity", &format!("{} is now online!", user));
}

fn show(title: &str, body: &str) {
    let options = NotificationOptions::new();
    options.set_body(body);
    options.set_icon(ICON_URL);

    if let Ok(notification) = Notification::new_with_options(title, &options) {
        // Auto-dismiss so notifications don't pile up
        gloo_timers::callback::Timeout::new(5000, move || {
            notification.close();
        })
        .forget();
    }
}

/// Truncate a message body for the notification preview.
fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_short_messages() {
        assert_eq!(preview("hello"), "hello");
    }

    #[test]
    fn test_preview_truncates_long_messages() {
        let long = "a".repeat(80);
        let preview = preview(&long);
        assert_eq!(preview, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let long = "é".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "é".repeat(50)));
    }
}
