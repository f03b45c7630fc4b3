use uow_domain::domain_event::DomainEvent;
use uow_macros::domain_event;

#[domain_event(version = 3)]
enum StockEvent {
    #[event(event_type = "stock.low", event_version = 1)]
    Low { sku: String, left: u32 },
    Replenished(u32),
    Frozen,
}

fn main() {
    let low = StockEvent::Low {
        sku: "S".into(),
        left: 1,
    };
    assert_eq!(low.event_type(), "stock.low");
    assert_eq!(low.event_version(), 1);

    let more = StockEvent::Replenished(10);
    assert_eq!(more.event_type(), "StockEvent.Replenished");
    assert_eq!(more.event_version(), 3);

    assert_eq!(StockEvent::Frozen.event_type(), "StockEvent.Frozen");
    assert_eq!(more.clone(), more);
}
