//! Shared types for the menu board
//!
//! Domain models, error types, response structures and message types used
//! by both the data client and the server.

pub mod client;
pub mod error;
pub mod message;
pub mod models;
pub mod util;
pub mod validation;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{BusMessage, ChangeAction, ChangeEvent, Table};
