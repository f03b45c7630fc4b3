//! 聚合（Aggregate）抽象
//!
//! 工作单元跟踪的每个实体都实现 `Aggregate`，并在编译期声明两项可选能力：
//! - 创建时间（`creation_stamp` / `creation_stamp_mut`）；
//! - 待发布事件缓冲（`pending_events_mut`）。
//!
//! 通常由 `#[aggregate]` 宏生成；未声明的能力保持默认的 `None`。
//!
use crate::domain_event::{DomainEvent, PendingEvents};
use crate::entity::Entity;
use crate::stamping::CreationStamped;
use serde::{Serialize, de::DeserializeOwned};

/// 聚合根接口
pub trait Aggregate: Entity + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 聚合类型（同时作为存储中的记录类型）
    const TYPE: &'static str;

    /// 该聚合产生的领域事件类型；不产生事件时使用 `NoEvents`
    type Event: DomainEvent;

    fn creation_stamp(&self) -> Option<&dyn CreationStamped> {
        None
    }

    fn creation_stamp_mut(&mut self) -> Option<&mut dyn CreationStamped> {
        None
    }

    fn pending_events_mut(&mut self) -> Option<&mut PendingEvents<Self::Event>> {
        None
    }

    /// 触发领域事件；事件在提交成功后才会被发布
    fn raise(&mut self, event: Self::Event) {
        if let Some(pending) = self.pending_events_mut() {
            pending.raise(event);
        }
    }
}
