//! 事件子系统（eventing）
//!
//! 提交成功后的事件收集与发布：
//! - `EventCollector`：从跟踪条目上取走待发布事件并恢复触发顺序；
//! - `EventPublisher`：工作单元依赖的可选发布能力（`NoPublisher` 表示未配置）；
//! - `InProcessPublisher`：进程内分发给 `EventHandler`；
//! - `BusPublisher` + `EventBus`：转发到事件总线，`InMemoryEventBus` 为内存实现。
//!
pub mod bus;
pub mod bus_inmemory;
pub mod collector;
pub mod handler;
pub mod in_process;
pub mod publisher;

pub use bus::EventBus;
pub use bus_inmemory::InMemoryEventBus;
pub use collector::EventCollector;
pub use handler::{EventHandler, HandledEventType};
pub use in_process::InProcessPublisher;
pub use publisher::{BusPublisher, EventPublisher, NoPublisher};
