//! 支付上下文
//!
//! 支付结果以 `payments.payment.approved` / `payments.payment.refused` 事件
//! 通知其它上下文；事件只在支付与交易记录落盘之后发出。
//!
mod commands;
mod context;
mod gateway;
mod model;

pub use commands::{PaymentCommandHandler, ProcessPayment};
pub use context::PaymentsContext;
pub use gateway::{LimitGateway, PaymentGateway};
pub use model::{Payment, PaymentEvent, PaymentId, Transaction, TransactionId, TransactionStatus};
