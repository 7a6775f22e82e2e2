//! App Root Component
//!
//! Shell state machine and global providers. The shell moves from Loading
//! to SignedOut or SignedIn based on the persisted session, owns the
//! presence channel, and picks the auth forms or the dashboard accordingly.

use leptos::*;

use crate::components::Toast;
use crate::pages::{Dashboard, Login, Register};
use crate::state::global::{provide_global_state, AuthPhase, GlobalState};
use crate::state::presence::{init_presence, PresenceChannel};
use crate::state::session::Session;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    // Provide global state to all components
    provide_global_state();

    let state = use_context::<GlobalState>().expect("GlobalState not found");

    // Restore the persisted session. A missing or corrupt entry is simply
    // "no session"; restoration is never retried.
    match Session::load() {
        Some(session) => state.auth.set(AuthPhase::SignedIn(session)),
        None => state.auth.set(AuthPhase::SignedOut),
    }

    // Open the presence channel once a session exists; if the session ever
    // changes, the previous channel is closed best-effort first.
    let state_for_presence = state.clone();
    create_effect(move |previous: Option<Option<PresenceChannel>>| {
        if let Some(Some(channel)) = previous {
            channel.close();
        }

        match state_for_presence.auth.get() {
            AuthPhase::SignedIn(session) => Some(init_presence(
                state_for_presence.clone(),
                &session.username,
            )),
            _ => None,
        }
    });

    let state_for_view = state.clone();
    view! {
        <div class="min-h-screen bg-gray-950 text-white">
            {move || {
                match state_for_view.auth.get() {
                    AuthPhase::Loading => view! {
                        <div class="h-screen flex items-center justify-center text-gray-400">
                            "Loading..."
                        </div>
                    }.into_view(),
                    AuthPhase::SignedOut => view! { <AuthGate /> }.into_view(),
                    AuthPhase::SignedIn(session) => view! {
                        <Dashboard session />
                    }.into_view(),
                }
            }}

            // Toast notifications
            <Toast />
        </div>
    }
}

/// Unauthenticated view: login/register toggle
#[component]
fn AuthGate() -> impl IntoView {
    let (show_register, set_show_register) = create_signal(false);

    view! {
        <div class="h-screen w-screen flex items-center justify-center bg-gray-950">
            {move || {
                if show_register.get() {
                    view! {
                        <Register on_registered=move |_| set_show_register.set(false) />
                    }.into_view()
                } else {
                    view! { <Login /> }.into_view()
                }
            }}

            <button
                on:click=move |_| set_show_register.update(|show| *show = !*show)
                class="fixed bottom-8 left-1/2 -translate-x-1/2 text-indigo-400 underline"
            >
                {move || {
                    if show_register.get() {
                        "Already have an account? Sign In"
                    } else {
                        "Need an account? Sign Up"
                    }
                }}
            </button>
        </div>
    }
}
