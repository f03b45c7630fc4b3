mod common;

use anyhow::Result as AnyResult;
use common::{Account, AccountEvent, AuditNote, SpyPublisher, ZeroRowStore, at};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use uow_domain::aggregate::Aggregate;
use uow_domain::clock::FixedClock;
use uow_domain::config::UnitOfWorkConfig;
use uow_domain::domain_event::BusinessContext;
use uow_domain::error::DomainError;
use uow_domain::store::InMemoryStore;
use uow_domain::unit_of_work::{CommitOutcome, Notification, Session, SessionState, UnitOfWork};

fn session(
    store: &InMemoryStore,
    publisher: &SpyPublisher,
) -> Session<InMemoryStore, SpyPublisher> {
    Session::with_publisher(store.clone(), Arc::new(publisher.clone()))
        .with_clock(Arc::new(FixedClock(at(1_000))))
}

async fn seed_account(store: &InMemoryStore, id: &str, owner: &str, created: i64) -> AnyResult<()> {
    let mut account = Account::open(id, owner);
    account.created_at = at(created);
    store.seed(&account).await?;
    Ok(())
}

#[tokio::test]
async fn inserted_entities_get_the_commit_instant() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    let mut first = Account::open("a-1", "ann");
    first.created_at = at(-50); // 调用方提供的值会被覆盖
    uow.insert(first)?;
    uow.insert(Account::open("a-2", "bob"))?;

    assert!(uow.commit().await?);

    let a1 = store.load::<Account>(&"a-1".to_string()).await?.unwrap();
    let a2 = store.load::<Account>(&"a-2".to_string()).await?.unwrap();
    assert_eq!(a1.created_at, at(1_000));
    assert_eq!(a2.created_at, a1.created_at);
    Ok(())
}

#[tokio::test]
async fn updated_entities_keep_their_persisted_creation_time() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "a-1", "ann", 10).await?;
    seed_account(&store, "a-2", "bob", 20).await?;
    let mut uow = session(&store, &SpyPublisher::default());

    // 通过 load 附加后修改
    let loaded = uow.load::<Account>(&"a-1".to_string()).await?.unwrap();
    loaded.owner = "ann-marie".into();
    loaded.created_at = at(999);

    // 通过 update 整体替换
    let mut replacement = Account::open("a-2", "robert");
    replacement.created_at = at(555);
    uow.update(replacement)?;

    assert!(uow.commit().await?);

    let a1 = store.load::<Account>(&"a-1".to_string()).await?.unwrap();
    let a2 = store.load::<Account>(&"a-2".to_string()).await?.unwrap();
    assert_eq!((a1.owner.as_str(), a1.created_at), ("ann-marie", at(10)));
    assert_eq!((a2.owner.as_str(), a2.created_at), ("robert", at(20)));
    Ok(())
}

#[tokio::test]
async fn zero_rows_affected_returns_false_without_publishing() -> AnyResult<()> {
    let store = ZeroRowStore::default();
    let publisher = SpyPublisher::default();
    let mut uow = Session::with_publisher(store.clone(), Arc::new(publisher.clone()));

    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });

    assert!(!uow.commit().await?);
    assert_eq!(store.flushes.load(Ordering::SeqCst), 1);
    assert_eq!(publisher.calls(), 0);
    assert_eq!(uow.state(), SessionState::Committed);
    Ok(())
}

#[tokio::test]
async fn unchanged_entities_with_events_flush_nothing() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "a-1", "ann", 10).await?;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    uow.load::<Account>(&"a-1".to_string())
        .await?
        .unwrap()
        .raise(AccountEvent::Renamed { owner: "ann".into() });

    assert_eq!(uow.save_changes().await?, CommitOutcome::NoChanges);
    assert_eq!(publisher.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn editing_only_the_creation_time_commits_nothing() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "a-1", "ann", 10).await?;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    let loaded = uow.load::<Account>(&"a-1".to_string()).await?.unwrap();
    loaded.created_at = at(999);
    loaded.raise(AccountEvent::Renamed { owner: "ann".into() });

    assert_eq!(uow.save_changes().await?, CommitOutcome::NoChanges);
    assert_eq!(publisher.calls(), 0);

    let stored = store.load::<Account>(&"a-1".to_string()).await?.unwrap();
    assert_eq!((stored.owner.as_str(), stored.created_at), ("ann", at(10)));
    Ok(())
}

#[tokio::test]
async fn events_survive_replacing_the_tracked_instance() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "a-2", "bea", 20).await?;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });
    uow.update(Account::open("a-1", "bob"))?
        .raise(AccountEvent::Renamed { owner: "bob".into() });

    uow.load::<Account>(&"a-2".to_string())
        .await?
        .unwrap()
        .raise(AccountEvent::Renamed { owner: "bea".into() });
    uow.remove(Account::open("a-2", "bea"))?;

    let outcome = uow.save_changes().await?;
    assert_eq!(
        outcome,
        CommitOutcome::Committed {
            rows_affected: 2,
            notification: Notification::Published { events: 3 },
        }
    );
    assert_eq!(
        publisher.event_types(),
        vec![
            "AccountEvent.Opened",
            "AccountEvent.Renamed",
            "AccountEvent.Renamed"
        ]
    );

    let a1 = store.load::<Account>(&"a-1".to_string()).await?.unwrap();
    assert_eq!(a1.owner, "bob");
    assert!(store.row("account", "a-2").await.is_none());
    Ok(())
}

#[tokio::test]
async fn flush_failure_publishes_nothing_and_leaves_no_partial_write() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "a-9", "zed", 0).await?;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });
    // 与已存在的行冲突：整个批次被拒绝
    uow.insert(Account::open("a-9", "zed"))?;

    let err = uow.commit().await.unwrap_err();
    assert!(matches!(err, DomainError::DuplicateKey { .. }));
    assert!(err.is_persistence());
    assert_eq!(uow.state(), SessionState::Failed);
    assert!(uow.tracker().is_empty());

    assert_eq!(publisher.calls(), 0);
    assert!(store.row("account", "a-1").await.is_none());
    assert_eq!(store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn injected_connectivity_loss_fails_the_session() -> AnyResult<()> {
    let store = InMemoryStore::new();
    store.fail_next_flush("connection reset").await;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);
    uow.insert(Account::open("a-1", "ann"))?;

    match uow.save_changes().await {
        Err(DomainError::Persistence { reason }) => assert_eq!(reason, "connection reset"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(store.is_empty().await);
    assert_eq!(publisher.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn abandoned_sessions_never_deliver_their_events() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::default();

    {
        let mut abandoned = session(&store, &publisher);
        abandoned
            .insert(Account::open("a-1", "ann"))?
            .raise(AccountEvent::Opened { owner: "ann".into() });
    }

    let mut failed = session(&store, &publisher);
    failed
        .insert(Account::open("a-2", "bob"))?
        .raise(AccountEvent::Opened { owner: "bob".into() });
    store.fail_next_flush("disk full").await;
    assert!(failed.commit().await.is_err());

    let mut ok = session(&store, &publisher);
    ok.insert(Account::open("a-3", "cy"))?
        .raise(AccountEvent::Opened { owner: "cy".into() });
    assert!(ok.commit().await?);

    let received = publisher.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].aggregate_id(), "a-3");
    assert!(store.row("account", "a-1").await.is_none());
    Ok(())
}

#[tokio::test]
async fn events_are_published_in_raise_order_across_aggregates() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    uow.insert(Account::open("a-1", "ann"))?;
    uow.insert(Account::open("a-2", "bob"))?;

    uow.find_mut::<Account>(&"a-2".to_string())
        .unwrap()
        .raise(AccountEvent::Opened { owner: "bob".into() });
    uow.find_mut::<Account>(&"a-1".to_string())
        .unwrap()
        .raise(AccountEvent::Opened { owner: "ann".into() });
    uow.find_mut::<Account>(&"a-2".to_string())
        .unwrap()
        .raise(AccountEvent::Renamed { owner: "bobby".into() });

    assert!(uow.commit().await?);

    let order: Vec<(String, String)> = publisher
        .received()
        .iter()
        .map(|e| (e.aggregate_id().to_string(), e.event_type().to_string()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a-2".to_string(), "AccountEvent.Opened".to_string()),
            ("a-1".to_string(), "AccountEvent.Opened".to_string()),
            ("a-2".to_string(), "AccountEvent.Renamed".to_string()),
        ]
    );
    assert_eq!(publisher.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn insert_and_update_in_one_session() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "b", "bea", 42).await?;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);

    uow.insert(Account::open("a", "al"))?
        .raise(AccountEvent::Opened { owner: "al".into() });

    let b = uow.load::<Account>(&"b".to_string()).await?.unwrap();
    b.owner = "beatrice".into();
    b.created_at = at(77);
    b.raise(AccountEvent::Renamed {
        owner: "beatrice".into(),
    });

    let outcome = uow.save_changes().await?;
    assert_eq!(
        outcome,
        CommitOutcome::Committed {
            rows_affected: 2,
            notification: Notification::Published { events: 2 },
        }
    );

    let a = store.load::<Account>(&"a".to_string()).await?.unwrap();
    let b = store.load::<Account>(&"b".to_string()).await?.unwrap();
    assert_eq!(a.created_at, at(1_000));
    assert_eq!(b.created_at, at(42));
    assert_eq!(b.owner, "beatrice");
    assert_eq!(
        publisher.event_types(),
        vec!["AccountEvent.Opened", "AccountEvent.Renamed"]
    );
    Ok(())
}

#[tokio::test]
async fn a_finished_session_rejects_further_commits() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher);
    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });

    assert!(uow.commit().await?);
    let again = uow.commit().await.unwrap_err();
    assert!(matches!(
        again,
        DomainError::SessionClosed {
            state: SessionState::Committed
        }
    ));
    assert!(matches!(
        uow.insert(Account::open("a-2", "bob")),
        Err(DomainError::SessionClosed { .. })
    ));
    assert_eq!(store.flush_count().await, 1);
    assert_eq!(publisher.calls(), 1);

    // 失败后的会话同样关闭
    store.fail_next_flush("boom").await;
    let mut failed = session(&store, &publisher);
    failed.insert(Account::open("a-3", "cy"))?;
    assert!(failed.commit().await.is_err());
    assert!(matches!(
        failed.commit().await,
        Err(DomainError::SessionClosed {
            state: SessionState::Failed
        })
    ));
    assert_eq!(store.flush_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn publish_failure_is_reported_but_data_stays_committed() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::failing("broker unavailable");
    let mut uow = session(&store, &publisher);
    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });

    let outcome = uow.save_changes().await?;
    assert!(outcome.is_committed());
    assert!(outcome.is_unnotified());
    match outcome.notification() {
        Some(Notification::Failed { events, reason }) => {
            assert_eq!(*events, 1);
            assert!(reason.contains("broker unavailable"));
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(store.row("account", "a-1").await.is_some());
    assert_eq!(store.flush_count().await, 1);
    assert_eq!(publisher.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn publish_failure_can_be_propagated() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let publisher = SpyPublisher::failing("broker unavailable");
    let mut uow =
        session(&store, &publisher).with_config(UnitOfWorkConfig::propagate_publish_failures());
    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });
    uow.insert(Account::open("a-2", "bob"))?;

    let err = uow.commit().await.unwrap_err();
    assert!(err.is_durable());
    assert!(!err.is_persistence());
    assert!(matches!(
        err,
        DomainError::Publish {
            rows_affected: 2,
            ..
        }
    ));
    assert_eq!(uow.state(), SessionState::Committed);

    // 不会重新 flush
    assert!(matches!(
        uow.commit().await,
        Err(DomainError::SessionClosed { .. })
    ));
    assert_eq!(store.flush_count().await, 1);
    assert_eq!(store.len().await, 2);
    Ok(())
}

#[tokio::test]
async fn sessions_without_publisher_commit_normally() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let mut uow = Session::new(store.clone()).with_clock(Arc::new(FixedClock(at(5))));

    uow.insert(Account::open("a-1", "ann"))?
        .raise(AccountEvent::Opened { owner: "ann".into() });
    let mut note = AuditNote::default();
    note.id = "n-1".into();
    note.text = "opened".into();
    uow.insert(note)?;

    let outcome = uow.save_changes().await?;
    assert_eq!(
        outcome,
        CommitOutcome::Committed {
            rows_affected: 2,
            notification: Notification::Disabled,
        }
    );
    assert_eq!(store.row("audit_note", "n-1").await.unwrap()["text"], "opened");
    Ok(())
}

#[tokio::test]
async fn deletes_count_as_affected_rows_and_carry_events() -> AnyResult<()> {
    let store = InMemoryStore::new();
    seed_account(&store, "a-1", "ann", 0).await?;
    let publisher = SpyPublisher::default();
    let mut uow = session(&store, &publisher)
        .with_context(BusinessContext::builder().actor_id("admin".to_string()).build());

    let mut account = uow.load::<Account>(&"a-1".to_string()).await?.unwrap().clone();
    account.raise(AccountEvent::Renamed { owner: "closed".into() });
    uow.remove(account)?;

    assert!(uow.commit().await?);
    assert!(store.row("account", "a-1").await.is_none());

    let received = publisher.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].actor_id(), Some("admin"));
    Ok(())
}
