//! Navigation Rail
//!
//! Left-edge navigation with logo, notification opt-in and logout.

use leptos::*;

use crate::notify;
use crate::state::global::GlobalState;
use crate::state::session::Session;

/// Vertical navigation rail shown on the dashboard
#[component]
pub fn NavRail() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let state_for_dot = state.clone();
    let enable_notifications = move |_| {
        let state = state.clone();
        spawn_local(async move {
            match notify::request_permission().await {
                Ok(true) => state.show_success("Real-time alerts are now active"),
                Ok(false) => state.show_error(
                    "Permission denied. Please reset permissions in your browser settings.",
                ),
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <nav class="w-20 bg-gray-900 border-r border-gray-800 flex flex-col items-center py-6">
            // Logo
            <div class="w-11 h-11 bg-indigo-500 rounded-xl flex items-center justify-center
                        font-bold text-white mb-10">
                "N"
            </div>

            <div class="flex-1 flex flex-col items-center space-y-8">
                <span class="text-2xl bg-gray-800 p-3 rounded-2xl" title="Chats">"💬"</span>
                <button
                    on:click=enable_notifications
                    class="text-2xl opacity-50 hover:opacity-100 transition-opacity"
                    title="Enable notifications"
                >
                    "🔔"
                </button>
            </div>

            // Presence stream indicator
            <span
                title="Live status stream"
                class=move || {
                    if state_for_dot.presence_connected.get() {
                        "w-2.5 h-2.5 rounded-full bg-green-500 mb-6"
                    } else {
                        "w-2.5 h-2.5 rounded-full bg-gray-600 mb-6"
                    }
                }
            />

            <button
                on:click=logout
                class="text-red-500 text-xs font-extrabold"
            >
                "LOGOUT"
            </button>
        </nav>
    }
}

/// Clear all local state and force a full reload. No in-place teardown of
/// the open channels beyond what page unload gives us.
fn logout(_ev: leptos::ev::MouseEvent) {
    Session::clear();
    if let Some(window) = web_sys::window() {
        let _ = window.location().reload();
    }
}
