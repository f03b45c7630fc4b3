use anyhow::{Context as _, Result};
use chrono::{Duration as ChronoDuration, Utc};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use storefront::ContextFactory;
use storefront::catalog::{
    CatalogCommandHandler, CategoryId, DebitStock, LowStockAlerts, ProductId, RegisterCategory,
    RegisterProduct,
};
use storefront::payments::{LimitGateway, PaymentCommandHandler, PaymentId, ProcessPayment};
use storefront::sales::{
    AddOrderItem, ApplyVoucher, CheckoutOrder, Order, OrderId, PaymentOutcomeHandler,
    SalesCommandHandler, Voucher, VoucherKind,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uow_application::command_bus::CommandBus;
use uow_application::context::AppContext;
use uow_application::inmemory_command_bus::InMemoryCommandBus;
use uow_application::unit_of_work_factory::SessionFactory;
use uow_domain::domain_event::BusinessContext;
use uow_domain::eventing::{
    BusPublisher, EventBus, EventHandler, InMemoryEventBus, InProcessPublisher,
};
use uow_domain::store::InMemoryStore;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = InMemoryStore::new();

    // 销售：订单事件发往总线
    let bus = Arc::new(InMemoryEventBus::new(64));
    let mut order_events = bus.subscribe().await;
    let sales_publisher = Arc::new(BusPublisher::new(Arc::clone(&bus)));
    let sales_contexts = || {
        ContextFactory::new(SessionFactory::with_publisher(
            store.clone(),
            Arc::clone(&sales_publisher),
        ))
    };
    let sales = Arc::new(SalesCommandHandler::new(sales_contexts()));
    let payment_outcome: Arc<dyn EventHandler> =
        Arc::new(PaymentOutcomeHandler::new(sales_contexts()));

    // 支付：进程内分发给销售上下文
    let payments = Arc::new(PaymentCommandHandler::new(
        ContextFactory::new(SessionFactory::with_publisher(
            store.clone(),
            Arc::new(InProcessPublisher::new(vec![payment_outcome])),
        )),
        Arc::new(LimitGateway::new(100_000)),
    ));

    // 目录：低库存提醒
    let alerts = Arc::new(LowStockAlerts::new());
    let catalog = Arc::new(CatalogCommandHandler::new(ContextFactory::new(
        SessionFactory::with_publisher(
            store.clone(),
            Arc::new(InProcessPublisher::new(vec![
                Arc::clone(&alerts) as Arc<dyn EventHandler>
            ])),
        ),
    )));

    let commands = InMemoryCommandBus::new();
    commands.register::<RegisterCategory, _>(Arc::clone(&catalog))?;
    commands.register::<RegisterProduct, _>(Arc::clone(&catalog))?;
    commands.register::<DebitStock, _>(Arc::clone(&catalog))?;
    commands.register::<AddOrderItem, _>(Arc::clone(&sales))?;
    commands.register::<ApplyVoucher, _>(Arc::clone(&sales))?;
    commands.register::<CheckoutOrder, _>(Arc::clone(&sales))?;
    commands.register::<ProcessPayment, _>(Arc::clone(&payments))?;

    let ctx = AppContext {
        biz: BusinessContext::builder()
            .correlation_id(Uuid::new_v4().to_string())
            .actor_type("customer".to_string())
            .actor_id("demo".to_string())
            .build(),
    };

    let category_id = CategoryId::new(Uuid::new_v4());
    let product_id = ProductId::new(Uuid::new_v4());
    let order_id = OrderId::new(Uuid::new_v4());
    let customer_id = Uuid::new_v4();

    commands
        .dispatch(
            &ctx,
            RegisterCategory {
                category_id: category_id.clone(),
                name: "Kitchen".into(),
                code: 100,
            },
        )
        .await?;
    commands
        .dispatch(
            &ctx,
            RegisterProduct {
                product_id: product_id.clone(),
                category_id,
                name: "Enamel mug".into(),
                description: "350ml, white".into(),
                price: 1_500,
                stock: 12,
            },
        )
        .await?;
    sales
        .issue_voucher(
            &ctx,
            Voucher::new(
                "WELCOME10",
                VoucherKind::Percentage(10),
                100,
                Utc::now() + ChronoDuration::days(30),
            ),
        )
        .await?;

    commands
        .dispatch(
            &ctx,
            AddOrderItem {
                order_id: order_id.clone(),
                customer_id,
                product_id: product_id.clone().into(),
                product_name: "Enamel mug".into(),
                quantity: 4,
                unit_price: 1_500,
            },
        )
        .await?;
    commands
        .dispatch(
            &ctx,
            ApplyVoucher {
                order_id: order_id.clone(),
                code: "WELCOME10".into(),
            },
        )
        .await?;
    commands
        .dispatch(
            &ctx,
            DebitStock {
                product_id,
                quantity: 4,
            },
        )
        .await?;
    commands
        .dispatch(
            &ctx,
            CheckoutOrder {
                order_id: order_id.clone(),
            },
        )
        .await?;

    let order = store
        .load::<Order>(&order_id)
        .await?
        .context("order was not persisted")?;
    commands
        .dispatch(
            &ctx,
            ProcessPayment {
                payment_id: PaymentId::new(Uuid::new_v4()),
                order_id: order_id.clone().into(),
                amount: order.total(),
                card_holder: "Demo Customer".into(),
                card_number: "4111 1111 1111 1111".into(),
            },
        )
        .await?;

    let order = store
        .load::<Order>(&order_id)
        .await?
        .context("order disappeared")?;
    info!(order = %order.id, status = ?order.status, total = order.total(), "final order state");
    info!(alerts = alerts.alerts().len(), "low stock alerts received");

    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(50), order_events.next()).await
    {
        let event = event?;
        info!(
            sequence = event.sequence(),
            event_type = event.event_type(),
            aggregate = event.aggregate_id(),
            "order event"
        );
    }

    Ok(())
}
