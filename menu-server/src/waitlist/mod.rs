//! 候位: 顾客登记表单与管理员队列

pub mod form;
pub mod queue;

pub use form::{JOIN_FAILED_PREFIX, JOIN_SUCCESS_MESSAGE, WaitlistFormInput, submit};
pub use queue::{
    COMPLETE_FAILED_PREFIX, DELETE_FAILED_PREFIX, EMPTY_QUEUE_MESSAGE, LOAD_FAILED_PREFIX,
    QueueAction, QueueRow, WaitlistManager, WaitlistQueue,
};
