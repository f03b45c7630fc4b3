//! 发布形态的事件（SerializedEvent）
//!
//! 事件收集器把聚合上的强类型事件转换为统一的「类型标签 + JSON 负载」记录，
//! 事件发布器与事件总线只面向该形态。
//!
use super::{BusinessContext, DomainEvent, RaisedEvent};
use crate::error::DomainResult;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件唯一标识符
    event_id: String,
    /// 事件类型，用于区分不同的事件
    event_type: String,
    /// 事件版本
    event_version: usize,
    /// 会话内的触发序号（决定发布顺序）
    sequence: u64,
    /// 聚合 ID，标识事件所属的聚合根实例
    aggregate_id: String,
    /// 聚合类型，用于区分不同的聚合根
    aggregate_type: String,
    /// 关联 ID，用于将多个事件关联到同一个业务操作
    correlation_id: Option<String>,
    /// 因果 ID，用于表示事件的触发来源
    causation_id: Option<String>,
    /// 触发事件的主体类型（如用户、系统等）
    actor_type: Option<String>,
    /// 触发事件的主体 ID
    actor_id: Option<String>,
    /// 事件发生时间
    occurred_at: DateTime<Utc>,
    /// 事件负载，存储事件的具体数据
    payload: Value,
}

impl SerializedEvent {
    pub fn from_raised<E>(
        aggregate_type: &str,
        aggregate_id: &str,
        raised: &RaisedEvent<E>,
        context: &BusinessContext,
    ) -> DomainResult<Self>
    where
        E: DomainEvent,
    {
        Ok(SerializedEvent {
            event_id: raised.event_id.to_string(),
            event_type: raised.payload.event_type().to_string(),
            event_version: raised.payload.event_version(),
            sequence: raised.sequence,
            aggregate_id: aggregate_id.to_string(),
            aggregate_type: aggregate_type.to_string(),
            correlation_id: context.correlation_id().map(|s| s.to_string()),
            causation_id: context.causation_id().map(|s| s.to_string()),
            actor_type: context.actor_type().map(|s| s.to_string()),
            actor_id: context.actor_id().map(|s| s.to_string()),
            occurred_at: raised.occurred_at,
            payload: serde_json::to_value(&raised.payload)?,
        })
    }

    /// 将负载还原为强类型事件
    pub fn to_domain_event<E>(&self) -> DomainResult<E>
    where
        E: DomainEvent,
    {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> usize {
        self.event_version
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}
