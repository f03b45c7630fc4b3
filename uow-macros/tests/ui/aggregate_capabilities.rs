use uow_domain::aggregate::Aggregate;
use uow_domain::stamping::{CREATED_AT_FIELD, CreationStamped, Timestamp};
use uow_macros::{aggregate, domain_event};

#[domain_event]
enum ParcelEvent {
    Labelled { code: String },
}

#[aggregate(name = "parcel", created_at, events = ParcelEvent)]
struct Parcel {
    weight: u32,
}

fn main() {
    let mut parcel = Parcel::default();
    parcel.weight = 3;
    parcel.raise(ParcelEvent::Labelled { code: "X1".into() });
    assert_eq!(parcel.pending_events_mut().map(|p| p.len()), Some(1));

    let at = Timestamp::default();
    parcel.set_created_at(at);
    assert_eq!(parcel.created_at(), at);
    assert_eq!(parcel.created_at_field(), CREATED_AT_FIELD);

    // 事件缓冲不进入行
    let row = serde_json::to_value(&parcel).unwrap();
    assert!(row.get("pending_events").is_none());
    assert!(row.get("created_at").is_some());

    let back: Parcel = serde_json::from_value(row).unwrap();
    assert_eq!(back.weight, 3);
}
