//! 变更跟踪（tracking）
//!
//! 会话通过 `ChangeTracker` 记录实体的新增、修改与删除，
//! 提交时据此生成交给存储的 `ChangeSet`，并从条目上收集待发布事件。
//!
mod change_tracker;
mod entry;

pub use change_tracker::ChangeTracker;
pub use entry::{EntryState, TrackedEntry};
