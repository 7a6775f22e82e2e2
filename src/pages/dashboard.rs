//! Dashboard Page
//!
//! Authenticated layout: nav rail, sidebar (profile, search, friends) and
//! the conversation pane for the selected peer.

use leptos::*;

use crate::components::{ChatPanel, FriendsList, NavRail, UserSearch};
use crate::state::global::GlobalState;
use crate::state::session::Session;

/// Main authenticated view
#[component]
pub fn Dashboard(session: Session) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let username = session.username.clone();

    view! {
        <div class="flex h-screen w-screen bg-gray-950">
            <NavRail />

            <aside class="w-96 bg-gray-950 border-r border-gray-800 flex flex-col">
                <header class="px-6 py-8">
                    <Profile username=username.clone() />
                    <h2 class="text-2xl font-bold text-white mb-5">"Messages"</h2>
                    <UserSearch />
                </header>

                <div class="flex-1 overflow-y-auto px-4">
                    <FriendsList />
                </div>
            </aside>

            <main class="flex-1 bg-gray-900">
                // Selecting a different peer tears down the previous
                // conversation (socket included) and builds a fresh one
                {move || {
                    match state.active_peer.get() {
                        Some(peer) => view! { <ChatPanel peer /> }.into_view(),
                        None => view! { <EmptyState /> }.into_view(),
                    }
                }}
            </main>
        </div>
    }
}

/// Signed-in identity card at the top of the sidebar
#[component]
fn Profile(#[prop(into)] username: String) -> impl IntoView {
    let initial = username
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default();

    view! {
        <div class="flex items-center space-x-3 mb-6 p-3 bg-white/5 rounded-2xl">
            <div class="w-9 h-9 rounded-lg bg-gradient-to-br from-indigo-500 to-purple-500
                        flex items-center justify-center font-bold text-white">
                {initial}
            </div>
            <div class="flex flex-col">
                <span class="text-[9px] uppercase tracking-widest text-gray-400">
                    "Logged in as"
                </span>
                <h4 class="m-0 text-white">{username}</h4>
            </div>
        </div>
    }
}

/// Placeholder shown before any conversation is selected
#[component]
fn EmptyState() -> impl IntoView {
    view! {
        <div class="h-full flex flex-col items-center justify-center text-center">
            <div class="text-5xl mb-2">"✨"</div>
            <h3 class="text-white text-xl">"Pick a friend to chat"</h3>
            <p class="text-gray-500">"Secure real-time messaging"</p>
        </div>
    }
}
