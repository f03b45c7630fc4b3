//! 销售上下文：订单、订单行与优惠券
//!
mod commands;
mod context;
mod handlers;
mod model;

pub use commands::{AddOrderItem, ApplyVoucher, CheckoutOrder, SalesCommandHandler};
pub use context::SalesContext;
pub use handlers::PaymentOutcomeHandler;
pub use model::{
    Order, OrderEvent, OrderId, OrderItem, OrderItemId, OrderStatus, Voucher, VoucherKind,
};
