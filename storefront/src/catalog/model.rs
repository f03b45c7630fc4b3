use uow_domain::aggregate::Aggregate;
use uow_domain::error::{DomainError, DomainResult};
use uow_macros::{aggregate, domain_event, entity_id};
use uuid::Uuid;

/// 扣减后库存低于该值时触发 `LowStock`
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[entity_id]
pub struct CategoryId(Uuid);

#[entity_id]
pub struct ProductId(Uuid);

#[aggregate(name = "category", id = CategoryId)]
pub struct Category {
    pub name: String,
    pub code: u32,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, code: u32) -> Self {
        Self {
            id,
            name: name.into(),
            code,
        }
    }
}

#[domain_event]
pub enum ProductEvent {
    #[event(event_type = "catalog.product.low_stock")]
    LowStock { product_id: ProductId, remaining: u32 },
}

#[aggregate(name = "product", id = ProductId, created_at, events = ProductEvent)]
pub struct Product {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub active: bool,
    /// 单价（分）
    pub price: i64,
    pub stock: u32,
}

impl Product {
    pub fn new(
        id: ProductId,
        category_id: CategoryId,
        name: impl Into<String>,
        price: i64,
        stock: u32,
    ) -> Self {
        Self {
            id,
            category_id,
            name: name.into(),
            active: true,
            price,
            stock,
            ..Default::default()
        }
    }

    pub fn has_stock(&self, quantity: u32) -> bool {
        self.active && self.stock >= quantity
    }

    pub fn debit_stock(&mut self, quantity: u32) -> DomainResult<()> {
        if !self.has_stock(quantity) {
            return Err(DomainError::InvalidCommand {
                reason: format!(
                    "insufficient stock for product {}: requested={quantity}, available={}",
                    self.id, self.stock
                ),
            });
        }

        self.stock -= quantity;
        if self.stock < LOW_STOCK_THRESHOLD {
            let event = ProductEvent::LowStock {
                product_id: self.id.clone(),
                remaining: self.stock,
            };
            self.raise(event);
        }
        Ok(())
    }

    pub fn replenish_stock(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: u32) -> Product {
        Product::new(
            ProductId::new(Uuid::new_v4()),
            CategoryId::new(Uuid::new_v4()),
            "mug",
            1_500,
            stock,
        )
    }

    #[test]
    fn debit_below_threshold_raises_low_stock() {
        let mut p = product(12);
        p.debit_stock(2).unwrap();
        assert_eq!(p.pending_events_mut().map(|e| e.len()), Some(0));

        p.debit_stock(3).unwrap();
        assert_eq!(p.stock, 7);
        let pending = p.pending_events_mut().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(
            pending.iter().next().map(|e| &e.payload),
            Some(ProductEvent::LowStock { remaining: 7, .. })
        ));
    }

    #[test]
    fn debit_more_than_available_is_rejected() {
        let mut p = product(1);
        let err = p.debit_stock(2).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCommand { .. }));
        assert_eq!(p.stock, 1);

        p.active = false;
        assert!(!p.has_stock(1));
    }
}
