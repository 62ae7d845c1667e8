//! 消息总线模块

pub mod bus;

pub use bus::MessageBus;
pub use shared::message::{BusMessage, BusPayload, ChangeAction, ChangeEvent, EventType, Table};
