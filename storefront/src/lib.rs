//! 商店示例（storefront）
//!
//! 三个限界上下文共用同一份工作单元提交协议，各自持有不同的实体集合：
//! - `catalog`：商品与分类，库存不足时触发 `LowStock`；
//! - `payments`：支付与交易记录，支付结果以事件通知订单；
//! - `sales`：订单、订单行与优惠券。
//!
//! 每个上下文类型都对 `Session<S, P>` 做一层类型化包装并实现 `UnitOfWork`，
//! 发布器能力在构造时选定。
//!
pub mod catalog;
pub mod context;
pub mod payments;
pub mod sales;

pub use context::{BoundedContext, ContextFactory};
