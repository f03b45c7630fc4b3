use serde::{Deserialize, Serialize};

/// 会话状态；`Committed` 与 `Failed` 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Dirty,
    Committed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Committed | SessionState::Failed)
    }
}

/// 事件通知结果：与持久化结果相互独立
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// 会话未配置发布器
    Disabled,
    /// 已交给发布器（`events` 为 0 时未调用发布器）
    Published { events: usize },
    /// 已提交但未通知
    Failed { events: usize, reason: String },
}

/// 一次提交的详细结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// flush 成功但没有影响任何行，不发布事件
    NoChanges,
    Committed {
        rows_affected: usize,
        notification: Notification,
    },
}

impl CommitOutcome {
    /// 是否有变更被提交（`commit()` 的布尔结果）
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }

    pub fn rows_affected(&self) -> usize {
        match self {
            CommitOutcome::NoChanges => 0,
            CommitOutcome::Committed { rows_affected, .. } => *rows_affected,
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            CommitOutcome::NoChanges => None,
            CommitOutcome::Committed { notification, .. } => Some(notification),
        }
    }

    /// 数据已提交但事件通知失败
    pub fn is_unnotified(&self) -> bool {
        matches!(
            self,
            CommitOutcome::Committed {
                notification: Notification::Failed { .. },
                ..
            }
        )
    }
}
