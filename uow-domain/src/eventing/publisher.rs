//! 事件发布器（EventPublisher）
//!
//! 工作单元在数据持久化之后把收集到的事件交给发布器。发布器是一项可选能力：
//! - `NoPublisher`：未配置发布器，`ENABLED = false`，会话既不收集也不发布事件；
//! - `BusPublisher`：转发到任意 `EventBus`；
//! - `InProcessPublisher`：直接在进程内分发给匹配的事件处理器。
//!
use super::EventBus;
use crate::domain_event::SerializedEvent;
use crate::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// 为 `false` 时会话跳过事件收集与发布
    const ENABLED: bool = true;

    /// 按给定顺序发布一批事件
    async fn publish(&self, events: &[SerializedEvent]) -> DomainResult<()>;
}

/// 未配置发布器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPublisher;

#[async_trait]
impl EventPublisher for NoPublisher {
    const ENABLED: bool = false;

    async fn publish(&self, _events: &[SerializedEvent]) -> DomainResult<()> {
        Ok(())
    }
}

/// 把事件转发到事件总线
#[derive(Clone)]
pub struct BusPublisher<B> {
    bus: B,
}

impl<B> BusPublisher<B>
where
    B: EventBus,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

#[async_trait]
impl<B> EventPublisher for BusPublisher<B>
where
    B: EventBus + 'static,
{
    async fn publish(&self, events: &[SerializedEvent]) -> DomainResult<()> {
        self.bus.publish_batch(events).await
    }
}

#[async_trait]
impl<T> EventPublisher for Arc<T>
where
    T: EventPublisher,
{
    const ENABLED: bool = T::ENABLED;

    async fn publish(&self, events: &[SerializedEvent]) -> DomainResult<()> {
        (**self).publish(events).await
    }
}
