//! 领域事件（Domain Event）
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`）、聚合上的待发布事件缓冲
//! （`PendingEvents`）以及面向发布器的统一形态 `SerializedEvent`。

mod business_context;
mod domain_event_trait;
mod pending_events;
mod serialized_event;

pub use business_context::BusinessContext;
pub use domain_event_trait::{DomainEvent, NoEvents};
pub use pending_events::{PendingEvents, RaisedEvent};
pub use serialized_event::SerializedEvent;
