use super::context::CatalogContext;
use super::model::{Category, CategoryId, Product, ProductId};
use crate::context::{ContextFactory, commit};
use async_trait::async_trait;
use tracing::instrument;
use uow_application::command::Command;
use uow_application::command_handler::CommandHandler;
use uow_application::context::AppContext;
use uow_application::error::AppError;
use uow_application::unit_of_work_factory::UnitOfWorkFactory;
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;

#[derive(Debug, Clone)]
pub struct RegisterCategory {
    pub category_id: CategoryId,
    pub name: String,
    pub code: u32,
}

impl Command for RegisterCategory {
    const NAME: &'static str = "RegisterCategory";
}

#[derive(Debug, Clone)]
pub struct RegisterProduct {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: u32,
}

impl Command for RegisterProduct {
    const NAME: &'static str = "RegisterProduct";
}

#[derive(Debug, Clone)]
pub struct DebitStock {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl Command for DebitStock {
    const NAME: &'static str = "DebitStock";
}

#[derive(Debug, Clone)]
pub struct ReplenishStock {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl Command for ReplenishStock {
    const NAME: &'static str = "ReplenishStock";
}

/// 目录上下文的命令处理器
pub struct CatalogCommandHandler<S, P = NoPublisher> {
    contexts: ContextFactory<CatalogContext<S, P>, S, P>,
}

impl<S, P> CatalogCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    pub fn new(contexts: ContextFactory<CatalogContext<S, P>, S, P>) -> Self {
        Self { contexts }
    }
}

fn product_not_found(id: &ProductId) -> AppError {
    AppError::AggregateNotFound(format!("product {id}"))
}

#[async_trait]
impl<S, P> CommandHandler<RegisterCategory> for CatalogCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    async fn handle(&self, ctx: &AppContext, cmd: RegisterCategory) -> Result<(), AppError> {
        if cmd.name.trim().is_empty() {
            return Err(AppError::Validation("category name is required".into()));
        }
        let mut uow = self.contexts.begin(ctx);
        uow.add_category(Category::new(cmd.category_id, cmd.name, cmd.code))?;
        commit(&mut uow, RegisterCategory::NAME).await?;
        Ok(())
    }
}

#[async_trait]
impl<S, P> CommandHandler<RegisterProduct> for CatalogCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    #[instrument(skip_all, fields(product = %cmd.product_id))]
    async fn handle(&self, ctx: &AppContext, cmd: RegisterProduct) -> Result<(), AppError> {
        if cmd.price <= 0 {
            return Err(AppError::Validation("price must be positive".into()));
        }

        let mut uow = self.contexts.begin(ctx);
        if uow.category(&cmd.category_id).await?.is_none() {
            return Err(AppError::AggregateNotFound(format!(
                "category {}",
                cmd.category_id
            )));
        }

        let mut product = Product::new(
            cmd.product_id,
            cmd.category_id,
            cmd.name,
            cmd.price,
            cmd.stock,
        );
        product.description = cmd.description;
        uow.add_product(product)?;
        commit(&mut uow, RegisterProduct::NAME).await?;
        Ok(())
    }
}

#[async_trait]
impl<S, P> CommandHandler<DebitStock> for CatalogCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    #[instrument(skip_all, fields(product = %cmd.product_id, quantity = cmd.quantity))]
    async fn handle(&self, ctx: &AppContext, cmd: DebitStock) -> Result<(), AppError> {
        let mut uow = self.contexts.begin(ctx);
        let product = uow
            .product(&cmd.product_id)
            .await?
            .ok_or_else(|| product_not_found(&cmd.product_id))?;
        product.debit_stock(cmd.quantity)?;
        commit(&mut uow, DebitStock::NAME).await?;
        Ok(())
    }
}

#[async_trait]
impl<S, P> CommandHandler<ReplenishStock> for CatalogCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    async fn handle(&self, ctx: &AppContext, cmd: ReplenishStock) -> Result<(), AppError> {
        let mut uow = self.contexts.begin(ctx);
        let product = uow
            .product(&cmd.product_id)
            .await?
            .ok_or_else(|| product_not_found(&cmd.product_id))?;
        product.replenish_stock(cmd.quantity);
        commit(&mut uow, ReplenishStock::NAME).await?;
        Ok(())
    }
}
