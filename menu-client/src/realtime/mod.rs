//! Realtime change feed (Phoenix channels over websocket)

mod feed;
pub mod protocol;

pub use feed::RealtimeFeed;
