use super::model::{Category, CategoryId, Product, ProductId};
use crate::context::BoundedContext;
use async_trait::async_trait;
use uow_domain::error::DomainResult;
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uow_domain::unit_of_work::{Session, UnitOfWork};

/// 目录上下文：商品与分类
pub struct CatalogContext<S, P = NoPublisher> {
    session: Session<S, P>,
}

impl<S, P> CatalogContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    pub fn new(session: Session<S, P>) -> Self {
        Self { session }
    }

    pub fn add_category(&mut self, category: Category) -> DomainResult<&mut Category> {
        self.session.insert(category)
    }

    pub fn add_product(&mut self, product: Product) -> DomainResult<&mut Product> {
        self.session.insert(product)
    }

    pub async fn category(&mut self, id: &CategoryId) -> DomainResult<Option<&mut Category>> {
        self.session.load::<Category>(id).await
    }

    /// 读取并跟踪商品；对返回值的修改在提交时写回
    pub async fn product(&mut self, id: &ProductId) -> DomainResult<Option<&mut Product>> {
        self.session.load::<Product>(id).await
    }

    pub fn remove_product(&mut self, id: &ProductId) -> DomainResult<()> {
        self.session.delete::<Product>(id)
    }
}

impl<S, P> BoundedContext<S, P> for CatalogContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    const NAME: &'static str = "catalog";

    fn from_session(session: Session<S, P>) -> Self {
        Self::new(session)
    }

    fn session(&self) -> &Session<S, P> {
        &self.session
    }

    fn session_mut(&mut self) -> &mut Session<S, P> {
        &mut self.session
    }
}

#[async_trait]
impl<S, P> UnitOfWork for CatalogContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    async fn commit(&mut self) -> DomainResult<bool> {
        self.session.commit().await
    }
}
