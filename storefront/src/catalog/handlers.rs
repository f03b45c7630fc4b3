use super::model::{ProductEvent, ProductId};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::warn;
use uow_domain::domain_event::SerializedEvent;
use uow_domain::eventing::{EventHandler, HandledEventType};

/// 低库存提醒：记录收到提醒的商品
#[derive(Default)]
pub struct LowStockAlerts {
    alerts: Mutex<Vec<(ProductId, u32)>>,
}

impl LowStockAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<(ProductId, u32)> {
        self.alerts
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventHandler for LowStockAlerts {
    fn handler_name(&self) -> &str {
        "catalog.low_stock_alerts"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::One("catalog.product.low_stock".to_string())
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        let ProductEvent::LowStock {
            product_id,
            remaining,
        } = event.to_domain_event::<ProductEvent>()?;

        warn!(product = %product_id, remaining, "product stock is running low");
        self.alerts
            .lock()
            .map_err(|_| anyhow::anyhow!("alert list poisoned"))?
            .push((product_id, remaining));
        Ok(())
    }
}
