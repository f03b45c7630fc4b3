//! 商品目录上下文
//!
mod commands;
mod context;
mod handlers;
mod model;

pub use commands::{
    CatalogCommandHandler, DebitStock, RegisterCategory, RegisterProduct, ReplenishStock,
};
pub use context::CatalogContext;
pub use handlers::LowStockAlerts;
pub use model::{Category, CategoryId, LOW_STOCK_THRESHOLD, Product, ProductEvent, ProductId};
