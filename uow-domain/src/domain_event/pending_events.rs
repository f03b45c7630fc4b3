use chrono::{DateTime, Utc};
use std::slice::Iter;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::DomainEvent;

// 进程内单调递增的触发序号，用于跨聚合恢复事件触发顺序
static RAISE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// 已触发、尚未提交的事件
#[derive(Debug, Clone, PartialEq)]
pub struct RaisedEvent<E> {
    pub event_id: Uuid,
    pub sequence: u64,
    pub occurred_at: DateTime<Utc>,
    pub payload: E,
}

impl<E> RaisedEvent<E>
where
    E: DomainEvent,
{
    pub fn new(payload: E) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            sequence: RAISE_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            occurred_at: Utc::now(),
            payload,
        }
    }
}

/// 聚合上的待发布事件缓冲区
///
/// 事件由聚合显式触发（`raise`），在提交成功后由事件收集器一次性取走（`take`）；
/// 提交失败或会话被丢弃时随聚合一起丢弃。
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvents<E> {
    events: Vec<RaisedEvent<E>>,
}

impl<E> Default for PendingEvents<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> PendingEvents<E>
where
    E: DomainEvent,
{
    /// 触发一个事件
    pub fn raise(&mut self, event: E) {
        self.events.push(RaisedEvent::new(event));
    }

    /// 取走全部事件（按触发顺序）
    pub fn take(&mut self) -> Vec<RaisedEvent<E>> {
        std::mem::take(&mut self.events)
    }

    /// 并入此前触发的事件，保留其原有序号与标识
    ///
    /// 已存在的事件（如克隆带来的副本）不会重复加入。
    pub(crate) fn restore(&mut self, earlier: Vec<RaisedEvent<E>>) {
        let before = self.events.len();
        for raised in earlier {
            if !self.events[..before]
                .iter()
                .any(|e| e.event_id == raised.event_id)
            {
                self.events.push(raised);
            }
        }
        if self.events.len() > before {
            self.events.sort_by_key(|e| e.sequence);
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, RaisedEvent<E>> {
        self.events.iter()
    }
}

impl<'a, E> IntoIterator for &'a PendingEvents<E>
where
    E: DomainEvent,
{
    type Item = &'a RaisedEvent<E>;
    type IntoIter = Iter<'a, RaisedEvent<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uow_macros::domain_event;

    #[domain_event]
    enum Ping {
        Sent { n: u32 },
    }

    #[test]
    fn raise_assigns_increasing_sequence_and_take_drains() {
        let mut pending = PendingEvents::<Ping>::default();
        pending.raise(Ping::Sent { n: 1 });
        pending.raise(Ping::Sent { n: 2 });
        assert_eq!(pending.len(), 2);

        let seqs: Vec<u64> = pending.iter().map(|e| e.sequence).collect();
        assert!(seqs[0] < seqs[1]);

        let taken = pending.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].payload, Ping::Sent { n: 1 });
        assert!(pending.is_empty());
        assert!(pending.take().is_empty());
    }

    #[test]
    fn restore_keeps_original_sequence_and_identity() {
        let mut earlier = PendingEvents::<Ping>::default();
        earlier.raise(Ping::Sent { n: 1 });
        let moved = earlier.take();
        let first_id = moved[0].event_id;

        let mut current = PendingEvents::<Ping>::default();
        current.raise(Ping::Sent { n: 2 });
        current.restore(moved);

        let payloads: Vec<&Ping> = current.iter().map(|e| &e.payload).collect();
        assert_eq!(payloads, vec![&Ping::Sent { n: 1 }, &Ping::Sent { n: 2 }]);
        assert_eq!(current.iter().next().map(|e| e.event_id), Some(first_id));

        // 克隆出的副本不会重复
        let copies: Vec<RaisedEvent<Ping>> = current.iter().cloned().collect();
        current.restore(copies);
        assert_eq!(current.len(), 2);
    }
}
