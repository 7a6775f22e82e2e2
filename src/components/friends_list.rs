//! Friends List Component
//!
//! REST-backed friend list with live online dots from the presence channel.
//! Refetches in full whenever the global refresh trigger is bumped.

use leptos::*;

use crate::api;
use crate::api::UserSummary;
use crate::state::global::{GlobalState, PeerSelection};

use super::loading::ListSkeleton;

/// Friend list shown in the sidebar
#[component]
pub fn FriendsList() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let (friends, set_friends) = create_signal(Vec::<UserSummary>::new());
    let (loading, set_loading) = create_signal(false);
    let (error, set_error) = create_signal(None::<String>);

    let state_for_fetch = state.clone();
    create_effect(move |_| {
        // Tracks the trigger: any bump refetches the whole list
        state_for_fetch.refresh_friends.get();

        let Some(session) = state_for_fetch.session() else {
            return;
        };

        set_loading.set(true);
        set_error.set(None);

        spawn_local(async move {
            match api::fetch_friends(&session).await {
                Ok(list) => set_friends.set(list),
                Err(e) => {
                    web_sys::console::error_1(&format!("Friend list fetch failed: {}", e).into());
                    set_error.set(Some("Failed to load friends".to_string()));
                }
            }
            set_loading.set(false);
        });
    });

    let state_for_view = state.clone();
    view! {
        <div class="mt-4 flex flex-col space-y-2">
            {move || {
                if loading.get() {
                    return view! { <ListSkeleton count=4 /> }.into_view();
                }

                if let Some(message) = error.get() {
                    return view! {
                        <div class="text-center text-sm text-gray-500 mt-5">{message}</div>
                    }.into_view();
                }

                let list = friends.get();
                if list.is_empty() {
                    return view! {
                        <div class="text-center text-sm text-gray-500 mt-5">
                            "No friends yet. Start searching!"
                        </div>
                    }.into_view();
                }

                let state = state_for_view.clone();
                list.into_iter()
                    .map(|friend| {
                        let state = state.clone();
                        view! { <FriendCard friend state /> }
                    })
                    .collect_view()
            }}
        </div>
    }
}

#[component]
fn FriendCard(friend: UserSummary, state: GlobalState) -> impl IntoView {
    let username = friend.username.clone();
    let initial = username
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default();

    let state_for_dot = state.clone();
    let username_for_dot = username.clone();
    let is_online = move || state_for_dot.is_online(&username_for_dot);
    let online_for_class = is_online.clone();
    let online_for_text = is_online.clone();

    let select = move |_| {
        state.active_peer.set(Some(PeerSelection {
            id: friend.id,
            username: friend.username.clone(),
        }));
    };

    view! {
        <div
            on:click=select
            class="flex items-center px-4 py-3 rounded-2xl cursor-pointer bg-white/5
                   border border-white/5 hover:bg-white/10 transition-colors"
        >
            <div class="relative mr-3">
                <div class="w-11 h-11 rounded-xl bg-gradient-to-br from-indigo-500 to-purple-500
                            flex items-center justify-center font-bold text-lg text-white">
                    {initial}
                </div>
                <span class=move || {
                    let base = "absolute -bottom-0.5 -right-0.5 w-3 h-3 rounded-full border-2 border-gray-900";
                    if is_online() {
                        format!("{} bg-green-500", base)
                    } else {
                        format!("{} bg-gray-600", base)
                    }
                } />
            </div>

            <div class="flex-1">
                <div class="font-semibold text-sm text-gray-50">{username}</div>
                <div class=move || {
                    if online_for_class() { "text-xs text-green-500" } else { "text-xs text-gray-400" }
                }>
                    {move || if online_for_text() { "Active Now" } else { "Offline" }}
                </div>
            </div>
        </div>
    }
}
