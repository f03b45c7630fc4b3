use uow_domain::aggregate::Aggregate;
use uow_domain::domain_event::NoEvents;
use uow_domain::entity::Entity;
use uow_macros::aggregate;

#[aggregate]
struct WarehouseSlot {
    capacity: u32,
}

#[aggregate(name = "bin", id = u64)]
#[derive(PartialEq)]
struct Bin {
    label: String,
}

fn main() {
    let mut slot = WarehouseSlot::default();
    slot.id = "s-1".to_string();
    slot.capacity = 4;
    assert_eq!(WarehouseSlot::TYPE, "warehouse_slot");
    assert_eq!(slot.id(), "s-1");
    assert!(slot.creation_stamp().is_none());
    let _: Option<&mut uow_domain::domain_event::PendingEvents<NoEvents>> =
        slot.pending_events_mut();

    let bin = Bin {
        id: 9,
        label: "A".into(),
    };
    assert_eq!(Bin::TYPE, "bin");
    assert_eq!(bin.clone(), bin);
    let row = serde_json::to_value(&bin).unwrap();
    assert_eq!(row["id"], 9);
}
