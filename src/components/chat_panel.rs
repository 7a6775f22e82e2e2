//! Chat Panel Component
//!
//! The conversation view: message history hydrated over REST plus a live
//! chat socket carrying message, typing and read-receipt frames. Recreated
//! whenever the selected peer changes; teardown closes the socket and
//! cancels the typing debounce.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;

use crate::api;
use crate::components::Loading;
use crate::state::chat::{
    at_bottom, plan_send, room_key, ChatChannel, ClientFrame, Conversation, SendAction,
    TYPING_IDLE_MS,
};
use crate::state::global::{GlobalState, PeerSelection};
use crate::state::socket::{ReconnectPolicy, SocketStatus};

/// Conversation view for the selected peer
#[component]
pub fn ChatPanel(peer: PeerSelection) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let conv = create_rw_signal(Conversation::default());
    let status = create_rw_signal(SocketStatus::Connecting);
    let (input, set_input) = create_signal(String::new());
    let (show_scroll_button, set_show_scroll_button) = create_signal(false);
    let list_ref = create_node_ref::<html::Div>();

    let session = state.session();
    let self_user = session
        .as_ref()
        .map(|s| s.username.clone())
        .unwrap_or_default();
    let peer_name = peer.username.clone();

    // Preconditions, checked before any network is attempted. Each failure
    // is a distinct terminal error state, not a retry.
    let precondition = if session.is_none() {
        Some("You are not logged in")
    } else if peer_name.trim().is_empty() {
        Some("Invalid chat selection. Please try again.")
    } else if peer.id <= 0 {
        Some("Invalid user ID")
    } else {
        None
    };

    let ws_url = format!(
        "{}/chat/{}/",
        api::get_ws_base(),
        room_key(&self_user, &peer_name)
    );
    let channel = Rc::new(ChatChannel::new(&ws_url, ReconnectPolicy::None));
    let typing_timer: Rc<RefCell<Option<gloo_timers::callback::Timeout>>> =
        Rc::new(RefCell::new(None));

    match precondition {
        Some(message) => status.set(SocketStatus::Errored(message.to_string())),
        None => {
            // History fetch and socket open run concurrently
            let session = session.expect("precondition checked");
            let peer_for_fetch = peer_name.clone();
            let state_for_fetch = state.clone();
            spawn_local(async move {
                match api::fetch_history(&session, &peer_for_fetch).await {
                    Ok(history) => conv.update(|c| c.hydrate(history)),
                    Err(e) => state_for_fetch.show_error(&e),
                }
            });

            channel.connect(self_user.clone(), conv, status);
        }
    }

    {
        let channel = Rc::clone(&channel);
        let typing_timer = Rc::clone(&typing_timer);
        on_cleanup(move || {
            channel.close();
            if let Some(timer) = typing_timer.borrow_mut().take() {
                timer.cancel();
            }
        });
    }

    // Keep the view pinned to the newest message / typing bubble
    create_effect(move |_| {
        conv.with(|c| (c.messages.len(), c.peer_typing));
        if let Some(el) = list_ref.get() {
            el.set_scroll_top(el.scroll_height());
        }
    });

    // Read receipt fires once when the viewer catches up, then latches
    // until the next inbound peer message re-arms it
    let channel_for_scroll = Rc::clone(&channel);
    let user_for_scroll = self_user.clone();
    let on_scroll = move |ev: ev::Event| {
        let Some(target) = ev.target() else { return };
        let Ok(el) = target.dyn_into::<web_sys::Element>() else {
            return;
        };

        let caught_up = at_bottom(el.scroll_top(), el.scroll_height(), el.client_height());
        set_show_scroll_button.set(!caught_up);

        if caught_up && !conv.with_untracked(|c| c.all_read) && channel_for_scroll.is_open() {
            let _ = channel_for_scroll.send(&ClientFrame::ReadReceipt {
                sender: user_for_scroll.clone(),
            });
            conv.update(|c| c.all_read = true);
        }
    };

    // typing=true per keystroke, typing=false after the idle window
    let channel_for_input = Rc::clone(&channel);
    let timer_for_input = Rc::clone(&typing_timer);
    let user_for_input = self_user.clone();
    let on_input = move |ev: ev::Event| {
        set_input.set(event_target_value(&ev));

        if !channel_for_input.is_open() {
            return;
        }

        let _ = channel_for_input.send(&ClientFrame::Typing {
            sender: user_for_input.clone(),
            typing: true,
        });

        if let Some(timer) = timer_for_input.borrow_mut().take() {
            timer.cancel();
        }

        let channel = Rc::clone(&channel_for_input);
        let user = user_for_input.clone();
        *timer_for_input.borrow_mut() = Some(gloo_timers::callback::Timeout::new(
            TYPING_IDLE_MS,
            move || {
                if channel.is_open() {
                    let _ = channel.send(&ClientFrame::Typing {
                        sender: user,
                        typing: false,
                    });
                }
            },
        ));
    };

    let channel_for_send = Rc::clone(&channel);
    let user_for_send = self_user.clone();
    let send_message = move || {
        match plan_send(
            &user_for_send,
            &input.get_untracked(),
            channel_for_send.is_open(),
        ) {
            // Empty/whitespace input is rejected locally, no network call
            SendAction::Skip => {}
            // Messages are never buffered for later delivery
            SendAction::Alert(message) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(message);
                }
            }
            SendAction::Transmit(frames) => {
                for frame in &frames {
                    let _ = channel_for_send.send(frame);
                }

                set_input.set(String::new());
                conv.update(|c| c.all_read = false);
            }
        }
    };
    let send_click = {
        let send_message = send_message.clone();
        move |_| send_message()
    };
    let send_on_enter = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" {
            send_message();
        }
    };

    let scroll_to_bottom = move |_| {
        if let Some(el) = list_ref.get() {
            el.set_scroll_top(el.scroll_height());
        }
    };

    let initial = peer_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string());
    let peer_for_header = peer_name.clone();
    let user_for_view = self_user.clone();

    view! {
        <div class="flex flex-col h-full bg-gray-950">
            // Header: peer identity and channel status
            <header class="px-6 py-4 bg-gray-900/80 border-b border-white/5">
                <div class="flex items-center space-x-3">
                    <div class="w-10 h-10 rounded-xl bg-indigo-500 text-white flex items-center
                                justify-center font-bold">
                        {initial}
                    </div>
                    <div>
                        <h4 class="m-0 text-white font-semibold">{peer_for_header}</h4>
                        {move || {
                            match status.get() {
                                SocketStatus::Connecting => view! {
                                    <span class="text-xs text-gray-400">"Connecting..."</span>
                                }.into_view(),
                                SocketStatus::Open => {
                                    if conv.with(|c| c.peer_typing) {
                                        view! {
                                            <span class="text-xs text-indigo-400 font-bold">"typing..."</span>
                                        }.into_view()
                                    } else {
                                        view! {
                                            <span class="text-xs text-green-500 font-bold">"Connected"</span>
                                        }.into_view()
                                    }
                                }
                                SocketStatus::Closed => view! {
                                    <span class="text-xs text-gray-500">"Disconnected"</span>
                                }.into_view(),
                                SocketStatus::Errored(_) => view! {
                                    <span class="text-xs text-red-500 font-bold">"Connection Error"</span>
                                }.into_view(),
                            }
                        }}
                    </div>
                </div>
            </header>

            {move || {
                match status.get() {
                    SocketStatus::Errored(message) => view! {
                        <ConnectionError message />
                    }.into_view(),
                    SocketStatus::Connecting => view! {
                        <div class="flex-1 flex flex-col items-center justify-center">
                            <Loading />
                            <p class="text-gray-400 mt-5">"Establishing connection..."</p>
                        </div>
                    }.into_view(),
                    _ => {
                        let on_scroll = on_scroll.clone();
                        let on_input = on_input.clone();
                        let send_click = send_click.clone();
                        let send_on_enter = send_on_enter.clone();
                        let user_for_view = user_for_view.clone();

                        view! {
                            // Message list
                            <div
                                node_ref=list_ref
                                on:scroll=on_scroll
                                class="flex-1 p-5 overflow-y-auto flex flex-col space-y-2"
                            >
                                {move || {
                                    let user = user_for_view.clone();
                                    let all_read = conv.with(|c| c.all_read);
                                    conv.with(|c| c.messages.clone())
                                        .into_iter()
                                        .map(|msg| {
                                            let is_me = msg.sender == user;
                                            view! {
                                                <MessageBubble
                                                    content=msg.content
                                                    timestamp=msg.timestamp
                                                    is_me
                                                    all_read
                                                />
                                            }
                                        })
                                        .collect_view()
                                }}

                                // Typing indicator bubble
                                {move || {
                                    conv.with(|c| c.peer_typing).then(|| view! {
                                        <div class="self-start bg-white/10 rounded-2xl rounded-bl px-5 py-3
                                                    text-gray-400 text-sm animate-pulse">
                                            "..."
                                        </div>
                                    })
                                }}
                            </div>

                            // Jump back down when scrolled away
                            {
                                let scroll_to_bottom = scroll_to_bottom.clone();
                                move || {
                                    let scroll_to_bottom = scroll_to_bottom.clone();
                                    show_scroll_button.get().then(|| view! {
                                        <button
                                            on:click=scroll_to_bottom
                                            class="fixed bottom-24 right-10 w-12 h-12 rounded-full
                                                   bg-indigo-600 hover:bg-indigo-500 text-xl shadow-lg"
                                        >
                                            "⬇"
                                        </button>
                                    })
                                }
                            }

                            // Input bar
                            <div class="p-5">
                                <div class="flex bg-white/5 rounded-2xl px-4 py-1 border border-white/10">
                                    <input
                                        type="text"
                                        placeholder="Write a message..."
                                        prop:value=move || input.get()
                                        on:input=on_input
                                        on:keydown=send_on_enter
                                        class="flex-1 bg-transparent border-none text-white
                                               outline-none py-2"
                                    />
                                    <button
                                        on:click=send_click
                                        class="text-2xl px-2"
                                    >
                                        "🚀"
                                    </button>
                                </div>
                            </div>
                        }.into_view()
                    }
                }
            }}
        </div>
    }
}

/// A single message bubble; own messages carry read ticks.
#[component]
fn MessageBubble(
    #[prop(into)] content: String,
    #[prop(into)] timestamp: String,
    is_me: bool,
    all_read: bool,
) -> impl IntoView {
    let bubble_class = if is_me {
        "self-end bg-gradient-to-br from-indigo-500 to-indigo-700 rounded-2xl rounded-br"
    } else {
        "self-start bg-white/10 rounded-2xl rounded-bl"
    };

    view! {
        <div class=format!("max-w-[70%] px-4 py-3 text-white {}", bubble_class)>
            <div class="text-sm">{content}</div>
            <div class="text-[10px] opacity-50 text-right mt-1">
                {timestamp}
                {is_me.then(|| view! {
                    <span class="ml-1.5">{if all_read { "✓✓" } else { "✓" }}</span>
                })}
            </div>
        </div>
    }
}

/// Terminal connection-error state. The only recovery path is a full page
/// reload, which re-runs session restoration and reopens the channels.
#[component]
fn ConnectionError(#[prop(into)] message: String) -> impl IntoView {
    let reload = move |_| {
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    };

    view! {
        <div class="flex-1 flex flex-col items-center justify-center p-10 text-center">
            <div class="text-6xl mb-5">"⚠️"</div>
            <h3 class="text-2xl text-gray-50 mb-2">"Connection Failed"</h3>
            <p class="text-sm text-gray-400 mb-5">{message}</p>
            <button
                on:click=reload
                class="px-6 py-3 bg-gradient-to-br from-indigo-500 to-purple-500 text-white
                       rounded-xl font-semibold"
            >
                "Refresh Page"
            </button>
        </div>
    }
}
