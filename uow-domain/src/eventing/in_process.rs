//! 进程内事件发布器（InProcessPublisher）
//!
//! 不经过总线，直接把事件分发给匹配的处理器：
//! - 事件按给定顺序逐个分发，同一事件的多个处理器并发执行；
//! - 尽力而为：某个处理器失败不影响其余处理器与后续事件；
//! - 全部分发结束后，若存在失败则汇总为一个 `EventHandler` 错误返回。
//!
use super::EventPublisher;
use super::handler::{EventHandler, HandlerRegistry};
use crate::domain_event::SerializedEvent;
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use bon::Builder;
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use tracing::{trace, warn};

use self::in_process_publisher_builder::{IsUnset, SetRegistry, State as BuilderState};

#[derive(Builder)]
pub struct InProcessPublisher {
    #[builder(setters(vis = "pub(crate)"))]
    registry: HandlerRegistry,
    /// 单个事件的处理器并发数
    #[builder(default = 8)]
    handler_concurrency: usize,
}

impl<S: BuilderState> InProcessPublisherBuilder<S> {
    pub fn event_handlers(
        self,
        handlers: Vec<Arc<dyn EventHandler>>,
    ) -> InProcessPublisherBuilder<SetRegistry<S>>
    where
        <S as BuilderState>::Registry: IsUnset,
    {
        self.registry(HandlerRegistry::new(handlers))
    }
}

impl InProcessPublisher {
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        Self::builder().event_handlers(handlers).build()
    }

    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }
}

#[async_trait]
impl EventPublisher for InProcessPublisher {
    async fn publish(&self, events: &[SerializedEvent]) -> DomainResult<()> {
        let concurrency = self.handler_concurrency.max(1);
        let mut failed_handlers: Vec<String> = Vec::new();
        let mut reasons: Vec<String> = Vec::new();

        for event in events {
            let handlers = self.registry.matching(event.event_type());
            if handlers.is_empty() {
                trace!(event_type = event.event_type(), "no handler subscribed");
                continue;
            }

            let futures: Vec<_> = handlers
                .into_iter()
                .map(|h| {
                    let ev = event.clone();
                    async move {
                        let result = h.handle(&ev).await;
                        (h.handler_name().to_string(), result)
                    }
                })
                .collect();
            let results: Vec<(String, anyhow::Result<()>)> = stream::iter(futures)
                .buffered(concurrency)
                .collect()
                .await;

            for (handler, result) in results {
                if let Err(err) = result {
                    warn!(
                        handler = %handler,
                        event_type = event.event_type(),
                        event_id = event.event_id(),
                        error = %err,
                        "event handler failed"
                    );
                    reasons.push(format!("{}@{}: {err}", handler, event.event_type()));
                    if !failed_handlers.contains(&handler) {
                        failed_handlers.push(handler);
                    }
                }
            }
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(DomainError::EventHandler {
                handler: failed_handlers.join(","),
                reason: reasons.join("; "),
            })
        }
    }
}
