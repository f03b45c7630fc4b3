//! 工作单元配置
//!
//! 只定义结构与默认值；宿主应用可将其嵌入自身配置并通过 serde 反序列化。
//!
use serde::{Deserialize, Serialize};

/// 数据已持久化、事件发布失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishFailurePolicy {
    /// 报告为「已提交但未通知」（`Notification::Failed`），`commit()` 仍返回成功
    #[default]
    Report,
    /// 以 `DomainError::Publish` 返回，错误中携带已提交的行数
    Propagate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitOfWorkConfig {
    pub publish_failure: PublishFailurePolicy,
}

impl UnitOfWorkConfig {
    pub fn propagate_publish_failures() -> Self {
        Self {
            publish_failure: PublishFailurePolicy::Propagate,
        }
    }
}
