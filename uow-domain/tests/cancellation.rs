mod common;

use anyhow::Result as AnyResult;
use common::{Account, AccountEvent, SlowStore, SpyPublisher};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uow_domain::aggregate::Aggregate;
use uow_domain::error::DomainError;
use uow_domain::store::InMemoryStore;
use uow_domain::unit_of_work::{Session, SessionState};

#[tokio::test]
async fn cancelled_before_commit_touches_nothing() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::default();
    let mut uow = Session::with_publisher(store.clone(), Arc::new(publisher.clone()));
    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });

    let token = CancellationToken::new();
    token.cancel();

    let err = uow.save_changes_with_cancel(&token).await.unwrap_err();
    assert!(matches!(err, DomainError::Cancelled));
    assert_eq!(uow.state(), SessionState::Failed);
    assert_eq!(store.flush_count().await, 0);
    assert!(store.is_empty().await);
    assert_eq!(publisher.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn cancelled_while_flush_is_in_flight() -> AnyResult<()> {
    let inner = InMemoryStore::new();
    let store = SlowStore {
        inner: inner.clone(),
        delay: Duration::from_millis(500),
    };
    let publisher = SpyPublisher::default();
    let mut uow = Session::with_publisher(store, Arc::new(publisher.clone()));
    uow.insert(Account::open("a-1", "ann"))?;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = uow.save_changes_with_cancel(&token).await.unwrap_err();
    assert!(matches!(err, DomainError::Cancelled));
    assert!(inner.is_empty().await);
    assert_eq!(publisher.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn cancellation_after_flush_is_ignored() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::slow(Duration::from_millis(50));
    let mut uow = Session::with_publisher(store.clone(), Arc::new(publisher.clone()));
    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    // flush 已完成，发布阶段不再响应取消
    let outcome = uow.save_changes_with_cancel(&token).await?;
    assert!(outcome.is_committed());
    assert!(token.is_cancelled());
    assert_eq!(publisher.received().len(), 1);
    Ok(())
}

#[tokio::test]
async fn dropping_the_commit_future_does_not_abort_delivery() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::slow(Duration::from_millis(50));
    let mut uow = Session::with_publisher(store.clone(), Arc::new(publisher.clone()));
    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });

    let timed_out = tokio::time::timeout(Duration::from_millis(10), uow.save_changes())
        .await
        .is_err();
    assert!(timed_out);
    assert!(store.row("account", "a-1").await.is_some());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(publisher.received().len(), 1);
    Ok(())
}
