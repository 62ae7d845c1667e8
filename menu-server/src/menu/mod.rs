//! 菜单模块
//!
//! - [`MenuRepository`] - 快照与重拉
//! - [`MenuBoard`] - 分类分区
//! - [`MenuCardView`] / [`MenuDetailView`] - 展示模型
//! - [`MenuFormInput`] / [`TagSet`] - 编辑表单

pub mod board;
pub mod card;
pub mod detail;
pub mod form;
pub mod repository;

pub use board::{CategorySelection, MenuBoard};
pub use card::{Badge, BadgeVariant, MenuCardView};
pub use detail::MenuDetailView;
pub use form::{MenuFormInput, TagSet, normalize_tokens};
pub use repository::{LoadStatus, MenuRepository, Snapshot};
