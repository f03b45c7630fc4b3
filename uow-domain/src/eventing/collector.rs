//! 事件收集器（EventCollector）
//!
//! 在 flush 成功后遍历全部跟踪条目（包括 `Unchanged` / `Deleted`），取走聚合上
//! 的待发布事件，写入业务上下文，并按触发序号恢复整个会话内的触发顺序。
//! 事件一经取走即从聚合上清除，不会被发布两次。
//!
use crate::domain_event::{BusinessContext, SerializedEvent};
use crate::error::DomainResult;
use crate::tracking::TrackedEntry;

#[derive(Debug, Clone, Copy, Default)]
pub struct EventCollector;

impl EventCollector {
    pub fn collect(
        entries: &mut [TrackedEntry],
        context: &BusinessContext,
    ) -> DomainResult<Vec<SerializedEvent>> {
        let mut events = Vec::new();
        for entry in entries.iter_mut() {
            events.extend(entry.take_events(context)?);
        }
        events.sort_by_key(SerializedEvent::sequence);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::tracking::ChangeTracker;
    use uow_macros::{aggregate, domain_event};

    #[aggregate(name = "cart", events = CartEvent)]
    struct Cart {
        items: u32,
    }

    #[domain_event]
    enum CartEvent {
        ItemAdded { sku: String },
    }

    #[aggregate(name = "wishlist", events = WishlistEvent)]
    struct Wishlist {
        size: u32,
    }

    #[domain_event]
    enum WishlistEvent {
        Pinned { sku: String },
    }

    fn cart(id: &str) -> Cart {
        let mut c = Cart::default();
        c.id = id.into();
        c
    }

    #[test]
    fn interleaved_raises_come_back_in_raise_order() {
        let mut tracker = ChangeTracker::new();
        tracker.insert(cart("c-1")).unwrap();
        let mut list = Wishlist::default();
        list.id = "w-1".into();
        tracker.attach(list).unwrap();

        let sku = |s: &str| s.to_string();
        tracker
            .find_mut::<Cart>(&"c-1".into())
            .unwrap()
            .raise(CartEvent::ItemAdded { sku: sku("a") });
        tracker
            .find_mut::<Wishlist>(&"w-1".into())
            .unwrap()
            .raise(WishlistEvent::Pinned { sku: sku("b") });
        tracker
            .find_mut::<Cart>(&"c-1".into())
            .unwrap()
            .raise(CartEvent::ItemAdded { sku: sku("c") });

        let ctx = BusinessContext::builder()
            .correlation_id("req-7".to_string())
            .build();
        let events = EventCollector::collect(tracker.entries_mut(), &ctx).unwrap();

        let order: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.aggregate_id(), e.event_type()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("c-1", "CartEvent.ItemAdded"),
                ("w-1", "WishlistEvent.Pinned"),
                ("c-1", "CartEvent.ItemAdded"),
            ]
        );
        assert_eq!(events[2].payload()["ItemAdded"]["sku"], "c");
        assert!(events.windows(2).all(|w| w[0].sequence() < w[1].sequence()));
        assert!(events.iter().all(|e| e.correlation_id() == Some("req-7")));

        // 已取走
        assert!(
            EventCollector::collect(tracker.entries_mut(), &ctx)
                .unwrap()
                .is_empty()
        );
    }
}
