use serde::{Deserialize, Serialize};
use uow_domain::aggregate::Aggregate;
use uow_domain::error::{DomainError, DomainResult};
use uow_domain::stamping::Timestamp;
use uow_macros::{aggregate, domain_event, entity_id};
use uuid::Uuid;

#[entity_id]
pub struct OrderId(Uuid);

#[entity_id]
pub struct OrderItemId(Uuid);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    Started,
    Paid,
    Cancelled,
}

#[domain_event]
pub enum OrderEvent {
    #[event(event_type = "sales.order.drafted")]
    Drafted { order_id: OrderId, customer_id: Uuid },
    #[event(event_type = "sales.order.item_added")]
    ItemAdded {
        order_id: OrderId,
        product_id: Uuid,
        quantity: u32,
        unit_price: i64,
    },
    #[event(event_type = "sales.order.voucher_applied")]
    VoucherApplied {
        order_id: OrderId,
        code: String,
        discount: i64,
    },
    #[event(event_type = "sales.order.started")]
    Started { order_id: OrderId, total: i64 },
    #[event(event_type = "sales.order.paid")]
    Paid { order_id: OrderId, amount: i64 },
    #[event(event_type = "sales.order.cancelled")]
    Cancelled { order_id: OrderId, reason: String },
}

#[aggregate(name = "order", id = OrderId, created_at, events = OrderEvent)]
pub struct Order {
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub discount: i64,
    pub voucher_code: Option<String>,
}

impl Order {
    /// 新建草稿订单
    pub fn draft(id: OrderId, customer_id: Uuid) -> Self {
        let mut order = Self {
            id,
            customer_id,
            ..Default::default()
        };
        let event = OrderEvent::Drafted {
            order_id: order.id.clone(),
            customer_id,
        };
        order.raise(event);
        order
    }

    pub fn total(&self) -> i64 {
        (self.subtotal - self.discount).max(0)
    }

    fn ensure_status(&self, expected: OrderStatus, action: &str) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::InvalidState {
                reason: format!(
                    "cannot {action} order {}: status is {:?}",
                    self.id, self.status
                ),
            });
        }
        Ok(())
    }

    pub fn add_item(&mut self, item: &OrderItem) -> DomainResult<()> {
        self.ensure_status(OrderStatus::Draft, "add items to")?;
        if item.order_id != self.id {
            return Err(DomainError::InvalidCommand {
                reason: format!("item {} belongs to another order", item.id),
            });
        }

        self.subtotal += item.line_total();
        let event = OrderEvent::ItemAdded {
            order_id: self.id.clone(),
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        };
        self.raise(event);
        Ok(())
    }

    pub fn apply_voucher(&mut self, voucher: &Voucher) -> DomainResult<()> {
        self.ensure_status(OrderStatus::Draft, "apply a voucher to")?;
        if self.voucher_code.is_some() {
            return Err(DomainError::InvalidState {
                reason: format!("order {} already has a voucher", self.id),
            });
        }

        self.discount = voucher.discount_for(self.subtotal);
        self.voucher_code = Some(voucher.id.clone());
        let event = OrderEvent::VoucherApplied {
            order_id: self.id.clone(),
            code: voucher.id.clone(),
            discount: self.discount,
        };
        self.raise(event);
        Ok(())
    }

    pub fn start(&mut self) -> DomainResult<()> {
        self.ensure_status(OrderStatus::Draft, "start")?;
        if self.subtotal == 0 {
            return Err(DomainError::InvalidState {
                reason: format!("order {} has no items", self.id),
            });
        }

        self.status = OrderStatus::Started;
        let event = OrderEvent::Started {
            order_id: self.id.clone(),
            total: self.total(),
        };
        self.raise(event);
        Ok(())
    }

    pub fn mark_paid(&mut self, amount: i64) -> DomainResult<()> {
        self.ensure_status(OrderStatus::Started, "pay")?;
        if amount != self.total() {
            return Err(DomainError::InvalidCommand {
                reason: format!(
                    "payment of {amount} does not match order total {}",
                    self.total()
                ),
            });
        }

        self.status = OrderStatus::Paid;
        let event = OrderEvent::Paid {
            order_id: self.id.clone(),
            amount,
        };
        self.raise(event);
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        if matches!(self.status, OrderStatus::Paid | OrderStatus::Cancelled) {
            return Err(DomainError::InvalidState {
                reason: format!("cannot cancel order {}: status is {:?}", self.id, self.status),
            });
        }

        self.status = OrderStatus::Cancelled;
        let event = OrderEvent::Cancelled {
            order_id: self.id.clone(),
            reason: reason.into(),
        };
        self.raise(event);
        Ok(())
    }
}

#[aggregate(name = "order_item", id = OrderItemId)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: i64,
}

impl OrderItem {
    pub fn new(
        order_id: OrderId,
        product_id: Uuid,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: i64,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::InvalidCommand {
                reason: "quantity must be at least 1".to_string(),
            });
        }
        Ok(Self {
            id: OrderItemId::new(Uuid::new_v4()),
            order_id,
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        })
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// 按百分比折扣
    Percentage(u8),
    /// 固定金额（分）
    Amount(i64),
}

impl Default for VoucherKind {
    fn default() -> Self {
        VoucherKind::Amount(0)
    }
}

/// 优惠券，以券码为标识
#[aggregate(name = "voucher", created_at)]
pub struct Voucher {
    pub kind: VoucherKind,
    pub remaining: u32,
    pub active: bool,
    pub expires_at: Timestamp,
}

impl Voucher {
    pub fn new(
        code: impl Into<String>,
        kind: VoucherKind,
        remaining: u32,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id: code.into(),
            kind,
            remaining,
            active: true,
            expires_at,
            ..Default::default()
        }
    }

    pub fn validate(&self, now: Timestamp) -> DomainResult<()> {
        let problem = if !self.active {
            Some("is inactive")
        } else if self.remaining == 0 {
            Some("has been used up")
        } else if self.expires_at <= now {
            Some("has expired")
        } else {
            None
        };

        match problem {
            Some(problem) => Err(DomainError::InvalidCommand {
                reason: format!("voucher {} {problem}", self.id),
            }),
            None => Ok(()),
        }
    }

    /// 使用一次；用尽后自动停用
    pub fn redeem(&mut self, now: Timestamp) -> DomainResult<()> {
        self.validate(now)?;
        self.remaining -= 1;
        if self.remaining == 0 {
            self.active = false;
        }
        Ok(())
    }

    pub fn discount_for(&self, subtotal: i64) -> i64 {
        let discount = match self.kind {
            VoucherKind::Percentage(pct) => subtotal * i64::from(pct.min(100)) / 100,
            VoucherKind::Amount(amount) => amount,
        };
        discount.clamp(0, subtotal.max(0))
    }
}
