use super::model::{Payment, Transaction, TransactionId, TransactionStatus};
use uuid::Uuid;

/// 支付网关：对一笔支付给出交易结果
pub trait PaymentGateway: Send + Sync {
    fn authorize(&self, payment: &Payment) -> Transaction;
}

/// 按单笔限额授权的网关
#[derive(Debug, Clone, Copy)]
pub struct LimitGateway {
    limit: i64,
}

impl LimitGateway {
    pub fn new(limit: i64) -> Self {
        Self { limit }
    }
}

impl PaymentGateway for LimitGateway {
    fn authorize(&self, payment: &Payment) -> Transaction {
        let (status, reason) = if payment.amount <= self.limit {
            (TransactionStatus::Approved, None)
        } else {
            (
                TransactionStatus::Refused,
                Some(format!("amount {} exceeds limit {}", payment.amount, self.limit)),
            )
        };

        Transaction {
            id: TransactionId::new(Uuid::new_v4()),
            payment_id: payment.id.clone(),
            order_id: payment.order_id,
            total: payment.amount,
            status,
            reason,
            ..Default::default()
        }
    }
}
