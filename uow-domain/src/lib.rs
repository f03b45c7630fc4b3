//! 工作单元领域层基础库（uow-domain）
//!
//! 提供一次业务操作的事务边界：
//! - 聚合（`aggregate`）与实体（`entity`）建模，以及编译期声明的可选能力；
//! - 变更跟踪（`tracking`）与创建时间约定（`stamping`）；
//! - 持久化存储协议与内存实现（`store`）；
//! - 领域事件（`domain_event`）与提交后的事件收集与发布（`eventing`）；
//! - 会话与提交协议（`unit_of_work`）。
//!
//! 提交顺序固定为：字段约定 → 原子 flush → 受影响行数大于 0 时按触发顺序发布事件。
//! 事件只会在其来源变更已经持久化之后发布；发布失败不会撤销已提交的数据。
//!
//! 典型用法：
//! 1. 使用 `#[aggregate]` 与 `#[domain_event]` 定义聚合与事件；
//! 2. 以存储（及可选的发布器）创建 `Session`；
//! 3. 通过会话记录变更，在聚合上 `raise` 事件；
//! 4. 调用 `commit()` 或 `save_changes()`。
//!
pub mod aggregate;
pub mod clock;
pub mod config;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod stamping;
pub mod store;
pub mod tracking;
pub mod unit_of_work;

// 允许在本 crate 内部通过 ::uow_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::uow_domain 路径。
extern crate self as uow_domain;
