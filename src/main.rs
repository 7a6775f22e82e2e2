//! Nebula Chat
//!
//! Real-time two-party messaging client built with Leptos (WASM).
//!
//! # Features
//!
//! - Token-authenticated login and registration
//! - Friend list with live online/offline presence
//! - Per-conversation chat rooms with typing indicators and read receipts
//! - Desktop notifications for new messages and online friends
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. It communicates with an external backend via HTTP and two
//! WebSocket channels: one presence stream per session and one chat stream
//! per open conversation.

use leptos::*;

mod api;
mod app;
mod components;
mod notify;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    // Mount the app to the document body
    mount_to_body(|| view! { <app::App /> });
}
