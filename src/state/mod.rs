//! Application State

pub mod chat;
pub mod global;
pub mod presence;
pub mod session;
pub mod socket;
