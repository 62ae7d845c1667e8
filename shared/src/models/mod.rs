//! Data models
//!
//! Row types of the hosted backend tables (`menus`, `waitlist`) and the
//! form payloads written to them. Shared between menu-client and menu-server.

pub mod menu;
pub mod waitlist;

// Re-exports
pub use menu::*;
pub use waitlist::*;
