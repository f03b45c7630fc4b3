use super::context::SalesContext;
use super::model::{OrderId, OrderStatus};
use crate::context::ContextFactory;
use crate::payments::PaymentEvent;
use async_trait::async_trait;
use tracing::{debug, info};
use uow_application::context::AppContext;
use uow_application::unit_of_work_factory::UnitOfWorkFactory;
use uow_domain::domain_event::{BusinessContext, SerializedEvent};
use uow_domain::eventing::{EventHandler, EventPublisher, HandledEventType, NoPublisher};
use uow_domain::store::DurableStore;
use uow_domain::unit_of_work::UnitOfWork;

const HANDLER_NAME: &str = "sales.payment_outcome";

/// 根据支付结果推进订单：批准则标记已支付，拒绝则取消
///
/// 订单已处于对应的终态时视为重复投递，直接确认。
pub struct PaymentOutcomeHandler<S, P = NoPublisher> {
    contexts: ContextFactory<SalesContext<S, P>, S, P>,
}

impl<S, P> PaymentOutcomeHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    pub fn new(contexts: ContextFactory<SalesContext<S, P>, S, P>) -> Self {
        Self { contexts }
    }

    // 以支付事件为因，沿用其关联 ID
    fn context_for(&self, event: &SerializedEvent) -> AppContext {
        AppContext {
            biz: BusinessContext::builder()
                .maybe_correlation_id(event.correlation_id().map(str::to_string))
                .causation_id(event.event_id().to_string())
                .actor_type("system".to_string())
                .actor_id(HANDLER_NAME.to_string())
                .build(),
        }
    }
}

#[async_trait]
impl<S, P> EventHandler for PaymentOutcomeHandler<S, P>
where
    S: DurableStore + Clone + 'static,
    P: EventPublisher,
{
    fn handler_name(&self) -> &str {
        HANDLER_NAME
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::Many(vec![
            "payments.payment.approved".to_string(),
            "payments.payment.refused".to_string(),
        ])
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        let ctx = self.context_for(event);
        let mut uow = self.contexts.begin(&ctx);

        match event.to_domain_event::<PaymentEvent>()? {
            PaymentEvent::Approved {
                order_id, amount, ..
            } => {
                let order_id = OrderId::new(order_id);
                let order = uow
                    .order(&order_id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("order {order_id} not found"))?;
                if order.status == OrderStatus::Paid {
                    debug!(order = %order_id, "order already paid, skipping redelivery");
                    return Ok(());
                }
                order.mark_paid(amount)?;
                info!(order = %order_id, amount, "order paid");
            }
            PaymentEvent::Refused {
                order_id, reason, ..
            } => {
                let order_id = OrderId::new(order_id);
                let order = uow
                    .order(&order_id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("order {order_id} not found"))?;
                if order.status == OrderStatus::Cancelled {
                    debug!(order = %order_id, "order already cancelled, skipping redelivery");
                    return Ok(());
                }
                order.cancel(format!("payment refused: {reason}"))?;
                info!(order = %order_id, %reason, "order cancelled");
            }
        }

        uow.commit().await?;
        Ok(())
    }
}
