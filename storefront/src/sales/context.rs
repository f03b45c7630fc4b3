use super::model::{Order, OrderId, OrderItem, Voucher};
use crate::context::BoundedContext;
use async_trait::async_trait;
use uow_domain::error::DomainResult;
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uow_domain::unit_of_work::{Session, UnitOfWork};

/// 销售上下文：订单、订单行与优惠券
pub struct SalesContext<S, P = NoPublisher> {
    session: Session<S, P>,
}

impl<S, P> SalesContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    pub fn new(session: Session<S, P>) -> Self {
        Self { session }
    }

    pub fn draft_order(&mut self, order: Order) -> DomainResult<&mut Order> {
        self.session.insert(order)
    }

    pub async fn order(&mut self, id: &OrderId) -> DomainResult<Option<&mut Order>> {
        self.session.load::<Order>(id).await
    }

    pub fn add_item(&mut self, item: OrderItem) -> DomainResult<&mut OrderItem> {
        self.session.insert(item)
    }

    pub fn add_voucher(&mut self, voucher: Voucher) -> DomainResult<&mut Voucher> {
        self.session.insert(voucher)
    }

    pub async fn voucher(&mut self, code: &str) -> DomainResult<Option<&mut Voucher>> {
        self.session.load::<Voucher>(&code.to_string()).await
    }
}

impl<S, P> BoundedContext<S, P> for SalesContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    const NAME: &'static str = "sales";

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
impl<S, P> UnitOfWork for SalesContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    async fn commit(&mut self) -> DomainResult<bool> {
        self.session.commit().await
    }
}
