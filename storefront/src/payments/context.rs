use super::model::{Payment, PaymentId, Transaction};
use crate::context::BoundedContext;
use async_trait::async_trait;
use uow_domain::error::DomainResult;
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uow_domain::unit_of_work::{Session, UnitOfWork};

/// 支付上下文：支付与交易记录
pub struct PaymentsContext<S, P = NoPublisher> {
    session: Session<S, P>,
}

impl<S, P> PaymentsContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    pub fn new(session: Session<S, P>) -> Self {
        Self { session }
    }

    pub fn add_payment(&mut self, payment: Payment) -> DomainResult<&mut Payment> {
        self.session.insert(payment)
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> DomainResult<&mut Transaction> {
        self.session.insert(transaction)
    }

    pub async fn payment(&mut self, id: &PaymentId) -> DomainResult<Option<&mut Payment>> {
        self.session.load::<Payment>(id).await
    }
}

impl<S, P> BoundedContext<S, P> for PaymentsContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    const NAME: &'static str = "payments";

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
impl<S, P> UnitOfWork for PaymentsContext<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    async fn commit(&mut self) -> DomainResult<bool> {
        self.session.commit().await
    }
}
