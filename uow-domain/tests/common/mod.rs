#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uow_domain::domain_event::SerializedEvent;
use uow_domain::error::{DomainError, DomainResult};
use uow_domain::eventing::EventPublisher;
use uow_domain::store::{ChangeSet, DurableStore, InMemoryStore};
use uow_macros::{aggregate, domain_event};

#[domain_event]
pub enum AccountEvent {
    Opened { owner: String },
    Renamed { owner: String },
}

#[aggregate(name = "account", created_at, events = AccountEvent)]
pub struct Account {
    pub owner: String,
    pub balance: i64,
}

impl Account {
    pub fn open(id: &str, owner: &str) -> Self {
        let mut account = Account::default();
        account.id = id.to_string();
        account.owner = owner.to_string();
        account
    }
}

#[aggregate(name = "audit_note")]
pub struct AuditNote {
    pub text: String,
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// 记录收到的事件；可配置为失败或延迟
#[derive(Clone, Default)]
pub struct SpyPublisher {
    pub calls: Arc<AtomicUsize>,
    pub received: Arc<Mutex<Vec<SerializedEvent>>>,
    pub fail_with: Option<String>,
    pub delay: Option<Duration>,
}

impl SpyPublisher {
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn event_types(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect()
    }

    pub fn received(&self) -> Vec<SerializedEvent> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for SpyPublisher {
    async fn publish(&self, events: &[SerializedEvent]) -> DomainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.fail_with {
            return Err(DomainError::event_bus(reason.clone()));
        }
        self.received.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// 总是报告 0 行受影响的存储
#[derive(Clone, Default)]
pub struct ZeroRowStore {
    pub flushes: Arc<AtomicUsize>,
}

#[async_trait]
impl DurableStore for ZeroRowStore {
    async fn flush(&self, _changes: ChangeSet) -> DomainResult<usize> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn fetch(
        &self,
        _entity_type: &str,
        _entity_id: &str,
    ) -> DomainResult<Option<serde_json::Value>> {
        Ok(None)
    }
}

/// flush 前先等待一段时间的存储
#[derive(Clone)]
pub struct SlowStore {
    pub inner: InMemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl DurableStore for SlowStore {
    async fn flush(&self, changes: ChangeSet) -> DomainResult<usize> {
        tokio::time::sleep(self.delay).await;
        self.inner.flush(changes).await
    }

    async fn fetch(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> DomainResult<Option<serde_json::Value>> {
        self.inner.fetch(entity_type, entity_id).await
    }
}
