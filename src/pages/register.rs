//! Registration Page
//!
//! Account creation form; returns to the sign-in view on success.

use leptos::*;

use crate::api;
use crate::state::global::GlobalState;

/// Sign-up form
#[component]
pub fn Register(#[prop(into)] on_registered: Callback<()>) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let (username, set_username) = create_signal(String::new());
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (error, set_error) = create_signal(None::<String>);
    let (loading, set_loading) = create_signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        set_error.set(None);
        set_loading.set(true);

        let user = username.get_untracked();
        let mail = email.get_untracked();
        let pass = password.get_untracked();
        let state = state.clone();
        spawn_local(async move {
            match api::register(&user, &mail, &pass).await {
                Ok(()) => {
                    state.show_success("Account created! Welcome aboard.");
                    on_registered.call(());
                }
                Err(e) => {
                    set_error.set(Some(e));
                }
            }
            set_loading.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="bg-gray-800 p-10 rounded-2xl w-96">
            <h2 class="text-white text-2xl text-center mb-2">"Create your space"</h2>
            <p class="text-gray-400 text-sm text-center mb-6">
                "Spin up a profile and jump into real-time conversations."
            </p>

            {move || {
                error.get().map(|message| view! {
                    <div class="bg-red-500 text-white text-sm text-center p-2.5 rounded-lg mb-4">
                        {message}
                    </div>
                })
            }}

            <input
                type="text"
                placeholder="Username"
                prop:value=move || username.get()
                on:input=move |ev| set_username.set(event_target_value(&ev))
                required
                disabled=move || loading.get()
                class="w-full p-3 mb-4 rounded-lg bg-gray-900 text-white border-none"
            />
            <input
                type="email"
                placeholder="Email"
                prop:value=move || email.get()
                on:input=move |ev| set_email.set(event_target_value(&ev))
                required
                disabled=move || loading.get()
                class="w-full p-3 mb-4 rounded-lg bg-gray-900 text-white border-none"
            />
            <input
                type="password"
                placeholder="Password"
                prop:value=move || password.get()
                on:input=move |ev| set_password.set(event_target_value(&ev))
                required
                disabled=move || loading.get()
                class="w-full p-3 mb-4 rounded-lg bg-gray-900 text-white border-none"
            />

            <button
                type="submit"
                disabled=move || loading.get()
                class="w-full p-3 bg-gradient-to-br from-indigo-500 to-purple-500
                       text-white rounded-lg font-bold disabled:opacity-50"
            >
                {move || if loading.get() { "Creating account..." } else { "Sign Up" }}
            </button>
        </form>
    }
}
