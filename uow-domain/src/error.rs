//! 领域层统一错误定义
//!
//! 按失败域划分：持久化（flush 失败，整个提交作废）、发布（数据已落盘，
//! 仅通知失败）、会话误用与领域规则校验。
//!
use crate::unit_of_work::SessionState;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 持久化（flush） ---
    #[error("persistence error: {reason}")]
    Persistence { reason: String },
    #[error("duplicate key: type={entity_type}, id={entity_id}")]
    DuplicateKey {
        entity_type: String,
        entity_id: String,
    },
    #[error("concurrency conflict: type={entity_type}, id={entity_id}, reason={reason}")]
    Conflict {
        entity_type: String,
        entity_id: String,
        reason: String,
    },
    #[error("commit cancelled before flush")]
    Cancelled,

    // --- 发布（flush 之后） ---
    #[error("publish failed after {rows_affected} row(s) were committed: {reason}")]
    Publish { rows_affected: usize, reason: String },
    #[error("event bus error: {reason}")]
    EventBus { reason: String },
    #[error("event handler error: handler={handler}, reason={reason}")]
    EventHandler { handler: String, reason: String },

    // --- 会话 ---
    #[error("session is closed: state={state:?}")]
    SessionClosed { state: SessionState },
    #[error("entity already tracked: type={entity_type}, id={entity_id}")]
    AlreadyTracked {
        entity_type: String,
        entity_id: String,
    },

    // --- 领域规则/命令与状态 ---
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn persistence(reason: impl Into<String>) -> Self {
        DomainError::Persistence {
            reason: reason.into(),
        }
    }

    pub fn event_bus(reason: impl Into<String>) -> Self {
        DomainError::EventBus {
            reason: reason.into(),
        }
    }

    /// flush 阶段的失败：提交被整体放弃，没有任何变更落盘
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            DomainError::Persistence { .. }
                | DomainError::DuplicateKey { .. }
                | DomainError::Conflict { .. }
                | DomainError::Cancelled
        )
    }

    /// 数据已持久化、仅事件通知失败（已提交但未通知）
    pub fn is_durable(&self) -> bool {
        matches!(self, DomainError::Publish { .. })
    }
}
