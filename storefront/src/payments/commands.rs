use super::context::PaymentsContext;
use super::gateway::PaymentGateway;
use super::model::{Payment, PaymentId, TransactionStatus};
use crate::context::{ContextFactory, commit};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};
use uow_application::command::Command;
use uow_application::command_handler::CommandHandler;
use uow_application::context::AppContext;
use uow_application::error::AppError;
use uow_application::unit_of_work_factory::UnitOfWorkFactory;
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ProcessPayment {
    pub payment_id: PaymentId,
    pub order_id: Uuid,
    pub amount: i64,
    pub card_holder: String,
    pub card_number: String,
}

impl Command for ProcessPayment {
    const NAME: &'static str = "ProcessPayment";
}

pub struct PaymentCommandHandler<S, P = NoPublisher> {
    contexts: ContextFactory<PaymentsContext<S, P>, S, P>,
    gateway: Arc<dyn PaymentGateway>,
}

impl<S, P> PaymentCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    pub fn new(
        contexts: ContextFactory<PaymentsContext<S, P>, S, P>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self { contexts, gateway }
    }
}

#[async_trait]
impl<S, P> CommandHandler<ProcessPayment> for PaymentCommandHandler<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    #[instrument(skip_all, fields(payment = %cmd.payment_id, order = %cmd.order_id))]
    async fn handle(&self, ctx: &AppContext, cmd: ProcessPayment) -> Result<(), AppError> {
        if cmd.amount <= 0 {
            return Err(AppError::Validation("payment amount must be positive".into()));
        }

        let mut payment = Payment::new(
            cmd.payment_id,
            cmd.order_id,
            cmd.amount,
            cmd.card_holder,
            &cmd.card_number,
        );
        let transaction = self.gateway.authorize(&payment);
        payment.settle(&transaction)?;

        let approved = transaction.status == TransactionStatus::Approved;
        let mut uow = self.contexts.begin(ctx);
        uow.add_payment(payment)?;
        uow.add_transaction(transaction)?;
        commit(&mut uow, ProcessPayment::NAME).await?;

        info!(approved, "payment processed");
        Ok(())
    }
}
