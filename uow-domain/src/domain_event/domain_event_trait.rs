use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 事件类型（形如 `OrderEvent.Drafted` 或自定义类型名）
    fn event_type(&self) -> &str;

    /// 事件载荷版本
    fn event_version(&self) -> usize;
}

/// 不产生领域事件的实体使用的事件类型（无取值）
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub enum NoEvents {}

impl DomainEvent for NoEvents {
    fn event_type(&self) -> &str {
        match *self {}
    }

    fn event_version(&self) -> usize {
        match *self {}
    }
}
