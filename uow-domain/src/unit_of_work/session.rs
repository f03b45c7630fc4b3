//! 工作单元会话（Session）
//!
//! 一次业务操作对应一个会话：通过 `insert` / `update` / `remove` / `load` 记录变更，
//! 最后调用一次 `save_changes()`（或 `UnitOfWork::commit()`）：
//!
//! 1. 快照比较，把隐式修改的条目提升为 `Modified`；
//! 2. 执行字段约定（默认 `CreationStampPolicy`），时刻取自提交开始时；
//! 3. `flush`：原子写入，失败则会话进入 `Failed`、丢弃全部变更与事件；
//! 4. 受影响行数为 0 时直接结束，不收集也不发布事件；
//! 5. 否则收集事件并交给发布器。数据此时已经落盘，发布失败不会回滚，
//!    按 `PublishFailurePolicy` 报告为「已提交但未通知」或返回 `Publish` 错误。
//!
//! 会话提交后（无论成败）即关闭，再次提交返回 `SessionClosed`。
//!
use super::{CommitOutcome, Notification, SessionState, UnitOfWork};
use crate::aggregate::Aggregate;
use crate::clock::{Clock, SystemClock};
use crate::config::{PublishFailurePolicy, UnitOfWorkConfig};
use crate::domain_event::BusinessContext;
use crate::error::{DomainError, DomainResult};
use crate::eventing::{EventCollector, EventPublisher, NoPublisher};
use crate::stamping::{CreationStampPolicy, StampingPolicy};
use crate::store::DurableStore;
use crate::tracking::ChangeTracker;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub struct Session<S, P = NoPublisher> {
    store: S,
    publisher: Arc<P>,
    clock: Arc<dyn Clock>,
    stamping: Arc<dyn StampingPolicy>,
    config: UnitOfWorkConfig,
    context: BusinessContext,
    tracker: ChangeTracker,
    state: SessionState,
}

impl<S> Session<S, NoPublisher>
where
    S: DurableStore,
{
    /// 未配置发布器的会话：提交时不收集、不发布事件
    pub fn new(store: S) -> Self {
        Self::with_publisher(store, Arc::new(NoPublisher))
    }
}

impl<S, P> Session<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    pub fn with_publisher(store: S, publisher: Arc<P>) -> Self {
        Self {
            store,
            publisher,
            clock: Arc::new(SystemClock),
            stamping: Arc::new(CreationStampPolicy),
            config: UnitOfWorkConfig::default(),
            context: BusinessContext::default(),
            tracker: ChangeTracker::new(),
            state: SessionState::Idle,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stamping(mut self, stamping: Arc<dyn StampingPolicy>) -> Self {
        self.stamping = stamping;
        self
    }

    pub fn with_config(mut self, config: UnitOfWorkConfig) -> Self {
        self.config = config;
        self
    }

    /// 业务上下文会写入本次提交收集到的每个事件
    pub fn with_context(mut self, context: BusinessContext) -> Self {
        self.context = context;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &Arc<P> {
        &self.publisher
    }

    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }

    pub fn context(&self) -> &BusinessContext {
        &self.context
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.state.is_terminal() {
            return Err(DomainError::SessionClosed { state: self.state });
        }
        Ok(())
    }

    pub fn insert<A>(&mut self, aggregate: A) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        self.ensure_open()?;
        let tracked = self.tracker.insert(aggregate)?;
        self.state = SessionState::Dirty;
        Ok(tracked)
    }

    pub fn update<A>(&mut self, aggregate: A) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        self.ensure_open()?;
        let tracked = self.tracker.update(aggregate)?;
        self.state = SessionState::Dirty;
        Ok(tracked)
    }

    pub fn remove<A>(&mut self, aggregate: A) -> DomainResult<()>
    where
        A: Aggregate,
    {
        self.ensure_open()?;
        self.tracker.remove(aggregate)?;
        self.state = SessionState::Dirty;
        Ok(())
    }

    /// 按标识删除会话中已跟踪的实体
    pub fn delete<A>(&mut self, id: &A::Id) -> DomainResult<()>
    where
        A: Aggregate,
    {
        self.ensure_open()?;
        self.tracker.delete::<A>(id)?;
        self.state = SessionState::Dirty;
        Ok(())
    }

    /// 跟踪一个已持久化的实体；之后对它的修改会在提交时被检测到
    pub fn attach<A>(&mut self, aggregate: A) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        self.ensure_open()?;
        self.tracker.attach(aggregate)
    }

    /// 从存储读取并附加到会话；已跟踪时直接返回会话中的实例
    pub async fn load<A>(&mut self, id: &A::Id) -> DomainResult<Option<&mut A>>
    where
        A: Aggregate,
    {
        self.ensure_open()?;
        if self.tracker.find::<A>(id).is_some() {
            return Ok(self.tracker.find_mut::<A>(id));
        }

        let Some(row) = self.store.fetch(A::TYPE, &id.to_string()).await? else {
            return Ok(None);
        };
        let aggregate: A = serde_json::from_value(row)?;
        self.tracker.attach(aggregate).map(Some)
    }

    pub fn find<A>(&self, id: &A::Id) -> Option<&A>
    where
        A: Aggregate,
    {
        self.tracker.find::<A>(id)
    }

    pub fn find_mut<A>(&mut self, id: &A::Id) -> Option<&mut A>
    where
        A: Aggregate,
    {
        self.tracker.find_mut::<A>(id)
    }

    /// 提交本会话的全部变更
    pub async fn save_changes(&mut self) -> DomainResult<CommitOutcome> {
        self.save_changes_with_cancel(&CancellationToken::new()).await
    }

    /// 可取消的提交：仅在 flush 完成之前响应取消
    #[instrument(skip_all, fields(entries = self.tracker.len()))]
    pub async fn save_changes_with_cancel(
        &mut self,
        cancel: &CancellationToken,
    ) -> DomainResult<CommitOutcome> {
        self.ensure_open()?;
        let now = self.clock.now();
        debug!(state = ?self.state, "commit started");

        let rows_affected = match self.flush(cancel, now).await {
            Ok(rows) => rows,
            Err(err) => {
                self.tracker.clear();
                self.state = SessionState::Failed;
                error!(error = %err, "flush failed, commit abandoned");
                return Err(err);
            }
        };

        self.state = SessionState::Committed;
        if rows_affected == 0 {
            self.tracker.clear();
            debug!("flush affected no rows, nothing to publish");
            return Ok(CommitOutcome::NoChanges);
        }
        info!(rows_affected, "changes committed");

        let notification = self.notify().await;
        self.tracker.clear();

        if let Notification::Failed { events, reason } = &notification {
            warn!(rows_affected, events, %reason, "committed but not notified");
            if self.config.publish_failure == PublishFailurePolicy::Propagate {
                return Err(DomainError::Publish {
                    rows_affected,
                    reason: reason.clone(),
                });
            }
        }

        Ok(CommitOutcome::Committed {
            rows_affected,
            notification,
        })
    }

    async fn flush(
        &mut self,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> DomainResult<usize> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        self.tracker.detect_changes()?;
        self.stamping.apply(self.tracker.entries_mut(), now);
        self.tracker.settle_excluded_fields()?;
        let changes = self.tracker.change_set()?;
        debug!(changes = changes.len(), "flushing change set");

        let store = &self.store;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::Cancelled),
            result = store.flush(changes) => result,
        }
    }

    // 数据已落盘：此后的任何失败都只影响通知结果
    async fn notify(&mut self) -> Notification {
        if !P::ENABLED {
            return Notification::Disabled;
        }

        let events = match EventCollector::collect(self.tracker.entries_mut(), &self.context) {
            Ok(events) => events,
            Err(err) => {
                return Notification::Failed {
                    events: 0,
                    reason: err.to_string(),
                };
            }
        };
        if events.is_empty() {
            return Notification::Published { events: 0 };
        }

        let count = events.len();
        let publisher = Arc::clone(&self.publisher);
        // 在独立任务中发布：调用方丢弃提交 future 时投递仍会完成
        let delivery = tokio::spawn(async move { publisher.publish(&events).await });

        match delivery.await {
            Ok(Ok(())) => {
                debug!(events = count, "events published");
                Notification::Published { events: count }
            }
            Ok(Err(err)) => Notification::Failed {
                events: count,
                reason: err.to_string(),
            },
            Err(join) => Notification::Failed {
                events: count,
                reason: join.to_string(),
            },
        }
    }
}

#[async_trait]
impl<S, P> UnitOfWork for Session<S, P>
where
    S: DurableStore,
    P: EventPublisher,
{
    async fn commit(&mut self) -> DomainResult<bool> {
        Ok(self.save_changes().await?.is_committed())
    }
}

impl<S, P> std::fmt::Debug for Session<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("context", &self.context)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}
