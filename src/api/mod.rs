//! HTTP API
//!
//! Authenticated REST client for the chat backend.

pub mod client;

pub use client::*;
