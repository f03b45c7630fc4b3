//! 工作单元的过程宏（uow-macros）
//!
//! - `#[aggregate]`：为结构体补齐字段并实现 `Entity` / `Aggregate`，
//!   以参数在编译期声明创建时间与领域事件两项能力；
//! - `#[entity_id]`：把单字段元组结构体包装为实体标识；
//! - `#[domain_event]`：为事件枚举实现 `DomainEvent`。
//!
//! 生成的代码通过 `::uow_domain` 路径引用领域层，使用方需要依赖 `uow-domain` 与 `serde`。
//!
use proc_macro::TokenStream;

mod aggregate;
mod domain_event;
mod entity_id;
mod utils;

/// 聚合宏
///
/// ```ignore
/// #[aggregate(name = "order", id = OrderId, created_at, events = OrderEvent)]
/// struct Order {
///     total: i64,
/// }
/// ```
#[proc_macro_attribute]
pub fn aggregate(attr: TokenStream, item: TokenStream) -> TokenStream {
    aggregate::expand(attr, item)
}

/// 实体标识宏
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}

/// 领域事件宏
///
/// ```ignore
/// #[domain_event(version = 2)]
/// enum OrderEvent {
///     #[event(event_type = "order.placed")]
///     Placed { total: i64 },
///     Cancelled,
/// }
/// ```
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
