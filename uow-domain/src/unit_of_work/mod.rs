//! 工作单元（Unit of Work）
//!
//! 每个限界上下文都以同一个契约提交：`commit()` 返回「是否有变更被提交」。
//! 需要区分「已提交并已通知」与「已提交但未通知」时，使用 `Session::save_changes()`
//! 返回的 `CommitOutcome`。
//!
mod outcome;
mod session;

pub use outcome::{CommitOutcome, Notification, SessionState};
pub use session::Session;

use crate::error::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait UnitOfWork: Send {
    /// `Ok(true)`：有行被提交；`Ok(false)`：flush 成功但未影响任何行
    async fn commit(&mut self) -> DomainResult<bool>;
}
