//! 工作单元工厂
//!
//! 命令处理器不持有长生命周期的会话：每次处理命令时向工厂要一个新的工作单元，
//! 把命令上下文中的业务语境交给它，处理结束前提交一次。
//!
use crate::context::AppContext;
use std::sync::Arc;
use uow_domain::clock::{Clock, SystemClock};
use uow_domain::config::UnitOfWorkConfig;
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uow_domain::unit_of_work::{Session, UnitOfWork};

pub trait UnitOfWorkFactory: Send + Sync {
    type Uow: UnitOfWork;

    /// 为一次命令开启新的工作单元
    fn begin(&self, ctx: &AppContext) -> Self::Uow;
}

/// 以共享的存储与发布器构造 `Session`
pub struct SessionFactory<S, P = NoPublisher> {
    store: S,
    publisher: Arc<P>,
    clock: Arc<dyn Clock>,
    config: UnitOfWorkConfig,
}

impl<S> SessionFactory<S, NoPublisher>
where
    S: DurableStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self::with_publisher(store, Arc::new(NoPublisher))
    }
}

impl<S, P> SessionFactory<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    pub fn with_publisher(store: S, publisher: Arc<P>) -> Self {
        Self {
            store,
            publisher,
            clock: Arc::new(SystemClock),
            config: UnitOfWorkConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: UnitOfWorkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self, ctx: &AppContext) -> Session<S, P> {
        Session::with_publisher(self.store.clone(), Arc::clone(&self.publisher))
            .with_clock(Arc::clone(&self.clock))
            .with_config(self.config.clone())
            .with_context(ctx.biz.clone())
    }
}

impl<S, P> UnitOfWorkFactory for SessionFactory<S, P>
where
    S: DurableStore + Clone,
    P: EventPublisher,
{
    type Uow = Session<S, P>;

    fn begin(&self, ctx: &AppContext) -> Self::Uow {
        self.session(ctx)
    }
}
