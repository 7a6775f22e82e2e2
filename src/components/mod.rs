//! UI Components
//!
//! Reusable Leptos components for the chat client.

pub mod chat_panel;
pub mod friends_list;
pub mod loading;
pub mod nav;
pub mod toast;
pub mod user_search;

pub use chat_panel::ChatPanel;
pub use friends_list::FriendsList;
pub use loading::Loading;
pub use nav::NavRail;
pub use toast::Toast;
pub use user_search::UserSearch;
