//! 持久化存储（store）
//!
//! 工作单元只依赖 `DurableStore` 协议：把一次提交的全部行变更原子地写入，
//! 并返回受影响的行数。`InMemoryStore` 是测试与本地开发用的实现。
//!
mod change_set;
mod durable_store;
mod inmemory;

pub use change_set::{ChangeSet, RowChange, RowKey};
pub use durable_store::DurableStore;
pub use inmemory::InMemoryStore;
