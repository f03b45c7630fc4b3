use serde::{Deserialize, Serialize};
use uow_domain::aggregate::Aggregate;
use uow_domain::error::{DomainError, DomainResult};
use uow_macros::{aggregate, domain_event, entity_id};
use uuid::Uuid;

#[entity_id]
pub struct PaymentId(Uuid);

#[entity_id]
pub struct TransactionId(Uuid);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Approved,
    Refused,
}

#[domain_event]
pub enum PaymentEvent {
    #[event(event_type = "payments.payment.approved")]
    Approved {
        payment_id: PaymentId,
        order_id: Uuid,
        amount: i64,
    },
    #[event(event_type = "payments.payment.refused")]
    Refused {
        payment_id: PaymentId,
        order_id: Uuid,
        amount: i64,
        reason: String,
    },
}

#[aggregate(name = "payment", id = PaymentId, created_at, events = PaymentEvent)]
pub struct Payment {
    pub order_id: Uuid,
    pub amount: i64,
    pub card_holder: String,
    pub card_last_digits: String,
    pub status: TransactionStatus,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        order_id: Uuid,
        amount: i64,
        card_holder: impl Into<String>,
        card_number: &str,
    ) -> Self {
        let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
        let last = digits[digits.len().saturating_sub(4)..].iter().collect();
        Self {
            id,
            order_id,
            amount,
            card_holder: card_holder.into(),
            card_last_digits: last,
            ..Default::default()
        }
    }

    /// 根据交易结果结算支付，并触发对应的事件
    pub fn settle(&mut self, transaction: &Transaction) -> DomainResult<()> {
        if self.status != TransactionStatus::Pending {
            return Err(DomainError::InvalidState {
                reason: format!("payment {} is already settled", self.id),
            });
        }
        if transaction.payment_id != self.id {
            return Err(DomainError::InvalidCommand {
                reason: format!(
                    "transaction {} does not belong to payment {}",
                    transaction.id, self.id
                ),
            });
        }

        self.status = transaction.status;
        let event = match transaction.status {
            TransactionStatus::Approved => PaymentEvent::Approved {
                payment_id: self.id.clone(),
                order_id: self.order_id,
                amount: self.amount,
            },
            TransactionStatus::Refused => PaymentEvent::Refused {
                payment_id: self.id.clone(),
                order_id: self.order_id,
                amount: self.amount,
                reason: transaction.reason.clone().unwrap_or_default(),
            },
            TransactionStatus::Pending => {
                return Err(DomainError::InvalidState {
                    reason: format!("transaction {} is still pending", transaction.id),
                });
            }
        };
        self.raise(event);
        Ok(())
    }
}

/// 网关返回的交易记录
#[aggregate(name = "transaction", id = TransactionId, created_at)]
pub struct Transaction {
    pub payment_id: PaymentId,
    pub order_id: Uuid,
    pub total: i64,
    pub status: TransactionStatus,
    pub reason: Option<String>,
}
