use uow_macros::entity_id;
use uuid::Uuid;

#[entity_id]
struct OrderId(Uuid);

#[entity_id]
struct Sku(String);

fn main() {
    let raw = Uuid::new_v4();
    let id = OrderId::new(raw);
    assert_eq!(id.to_string(), raw.to_string());
    assert_eq!(id.to_string().parse::<OrderId>().unwrap(), id);
    assert_eq!(Uuid::from(id.clone()), raw);

    let sku = Sku::from("SKU-1".to_string());
    assert_eq!(sku.as_ref(), "SKU-1");
    assert_eq!(serde_json::to_value(&sku).unwrap(), "SKU-1");
    assert_eq!(sku.into_inner(), "SKU-1");
}
