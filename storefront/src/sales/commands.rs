use super::context::SalesContext;
use super::model::{Order, OrderId, OrderItem, Voucher};
use crate::context::{ContextFactory, commit};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;
use uow_application::command::Command;
use uow_application::command_handler::CommandHandler;
use uow_application::context::AppContext;
use uow_application::error::AppError;
use uow_application::unit_of_work_factory::UnitOfWorkFactory;
use uow_domain::clock::{Clock, SystemClock};
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uuid::Uuid;

/// 向订单添加商品；订单不存在时先创建草稿
#[derive(Debug, Clone)]
pub struct AddOrderItem {
    pub order_id: OrderId,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: i64,
}

impl Command for AddOrderItem {
    const NAME: &'static str = "AddOrderItem";
}

#[derive(Debug, Clone)]
pub struct ApplyVoucher {
    pub order_id: OrderId,
    pub code: String,
}

impl Command for ApplyVoucher {
    const NAME: &'static str = "ApplyVoucher";
}

#[derive(Debug, Clone)]
pub struct CheckoutOrder {
    pub order_id: OrderId,
}

impl Command for CheckoutOrder {
    const NAME: &'static str = "CheckoutOrder";
}

pub struct SalesCommandHandler<S, P = NoPublisher> {
    contexts: ContextFactory<SalesContext<S, P>, S, P>,
    clock: Arc<dyn Clock>,
}

impl<S, P> SalesCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    pub fn new(contexts: ContextFactory<SalesContext<S, P>, S, P>) -> Self {
        Self {
            contexts,
            clock: Arc::new(SystemClock),
        }
    }

    /// 优惠券有效期判断使用的时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 发放优惠券
    pub async fn issue_voucher(&self, ctx: &AppContext, voucher: Voucher) -> Result<(), AppError> {
        let mut uow = self.contexts.begin(ctx);
        uow.add_voucher(voucher)?;
        commit(&mut uow, "IssueVoucher").await?;
        Ok(())
    }
}

fn order_not_found(id: &OrderId) -> AppError {
    AppError::AggregateNotFound(format!("order {id}"))
}

#[async_trait]
impl<S, P> CommandHandler<AddOrderItem> for SalesCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    #[instrument(skip_all, fields(order = %cmd.order_id))]
    async fn handle(&self, ctx: &AppContext, cmd: AddOrderItem) -> Result<(), AppError> {
        let item = OrderItem::new(
            cmd.order_id.clone(),
            cmd.product_id,
            cmd.product_name,
            cmd.quantity,
            cmd.unit_price,
        )?;

        let mut uow = self.contexts.begin(ctx);
        match uow.order(&cmd.order_id).await? {
            Some(order) => {
                if order.customer_id != cmd.customer_id {
                    return Err(AppError::Validation(format!(
                        "order {} belongs to another customer",
                        cmd.order_id
                    )));
                }
                order.add_item(&item)?;
            }
            None => {
                let order = uow.draft_order(Order::draft(cmd.order_id.clone(), cmd.customer_id))?;
                order.add_item(&item)?;
            }
        }
        uow.add_item(item)?;
        commit(&mut uow, AddOrderItem::NAME).await?;
        Ok(())
    }
}

#[async_trait]
impl<S, P> CommandHandler<ApplyVoucher> for SalesCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    #[instrument(skip_all, fields(order = %cmd.order_id, code = %cmd.code))]
    async fn handle(&self, ctx: &AppContext, cmd: ApplyVoucher) -> Result<(), AppError> {
        let now = self.clock.now();
        let mut uow = self.contexts.begin(ctx);

        let voucher = uow
            .voucher(&cmd.code)
            .await?
            .ok_or_else(|| AppError::AggregateNotFound(format!("voucher {}", cmd.code)))?;
        voucher.redeem(now)?;
        let voucher = voucher.clone();

        let order = uow
            .order(&cmd.order_id)
            .await?
            .ok_or_else(|| order_not_found(&cmd.order_id))?;
        order.apply_voucher(&voucher)?;

        commit(&mut uow, ApplyVoucher::NAME).await?;
        Ok(())
    }
}

#[async_trait]
impl<S, P> CommandHandler<CheckoutOrder> for SalesCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    async fn handle(&self, ctx: &AppContext, cmd: CheckoutOrder) -> Result<(), AppError> {
        let mut uow = self.contexts.begin(ctx);
        let order = uow
            .order(&cmd.order_id)
            .await?
            .ok_or_else(|| order_not_found(&cmd.order_id))?;
        order.start()?;
        commit(&mut uow, CheckoutOrder::NAME).await?;
        Ok(())
    }
}
