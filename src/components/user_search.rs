//! User Search Component
//!
//! Search-as-you-type over the user directory. Responses are sequenced so a
//! late reply to a stale query can never overwrite a newer one.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api;
use crate::api::UserSummary;
use crate::state::global::{GlobalState, PeerSelection};

/// Assigns a monotonic sequence number to each issued request; only the
/// response for the latest issued request is accepted.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    issued: u64,
}

impl SearchSequencer {
    /// Register a new request and return its sequence number.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a response with this sequence number may be applied.
    pub fn accept(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

/// Sidebar search box with inline results
#[component]
pub fn UserSearch() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let (query, set_query) = create_signal(String::new());
    let (results, set_results) = create_signal(Vec::<UserSummary>::new());
    let sequencer = Rc::new(RefCell::new(SearchSequencer::default()));

    let state_for_input = state.clone();
    let sequencer_for_input = Rc::clone(&sequencer);
    let on_input = move |ev| {
        let value = event_target_value(&ev);
        set_query.set(value.clone());

        // Query must exceed one character before we hit the network
        if value.chars().count() <= 1 {
            set_results.set(Vec::new());
            return;
        }

        let Some(session) = state_for_input.session() else {
            return;
        };

        let seq = sequencer_for_input.borrow_mut().begin();
        let sequencer = Rc::clone(&sequencer_for_input);
        spawn_local(async move {
            match api::search_users(&session, &value).await {
                Ok(users) => {
                    // Drop responses for anything but the latest query
                    if sequencer.borrow().accept(seq) {
                        set_results.set(users);
                    }
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Search failed: {}", e).into());
                }
            }
        });
    };

    let state_for_select = state.clone();
    view! {
        <div class="border-b border-gray-800 pb-4">
            <input
                type="text"
                placeholder="Search people..."
                prop:value=move || query.get()
                on:input=on_input
                class="w-full px-3 py-2 rounded-lg bg-gray-800 text-white
                       border border-gray-700 focus:border-indigo-500 focus:outline-none"
            />

            <div class="mt-2">
                {move || {
                    let state = state_for_select.clone();
                    results.get().into_iter().map(|user| {
                        let state = state.clone();
                        let initial = user
                            .username
                            .chars()
                            .next()
                            .map(|c| c.to_uppercase().to_string())
                            .unwrap_or_default();
                        let username = user.username.clone();

                        let select = move |_| {
                            state.active_peer.set(Some(PeerSelection {
                                id: user.id,
                                username: user.username.clone(),
                            }));
                            set_query.set(String::new());
                            set_results.set(Vec::new());
                        };

                        view! {
                            <div
                                on:click=select
                                class="flex items-center space-x-3 p-2 rounded-lg cursor-pointer
                                       text-white hover:bg-gray-800 transition-colors"
                            >
                                <div class="w-8 h-8 rounded-full bg-indigo-600 flex items-center
                                            justify-center text-xs">
                                    {initial}
                                </div>
                                <span>{username}</span>
                            </div>
                        }
                    }).collect_view()
                }}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_responses_are_discarded() {
        let mut sequencer = SearchSequencer::default();

        let first = sequencer.begin();
        let second = sequencer.begin();

        // The older request's response arrives late and must be dropped
        assert!(!sequencer.accept(first));
        assert!(sequencer.accept(second));
    }

    #[test]
    fn test_latest_response_can_apply_repeatedly_until_superseded() {
        let mut sequencer = SearchSequencer::default();

        let seq = sequencer.begin();
        assert!(sequencer.accept(seq));

        let newer = sequencer.begin();
        assert!(!sequencer.accept(seq));
        assert!(sequencer.accept(newer));
    }
}
