//! 限界上下文与其工作单元工厂
//!
use std::marker::PhantomData;
use tracing::debug;
use uow_application::context::AppContext;
use uow_application::error::AppError;
use uow_application::unit_of_work_factory::{SessionFactory, UnitOfWorkFactory};
use uow_domain::eventing::{EventPublisher, NoPublisher};
use uow_domain::store::DurableStore;
use uow_domain::unit_of_work::{Session, UnitOfWork};

/// 对 `Session` 的类型化包装：仓储式方法 + 统一的提交契约
pub trait BoundedContext<S, P>: UnitOfWork + Sized {
    /// 上下文名称（用于日志）
    const NAME: &'static str;

    fn from_session(session: Session<S, P>) -> Self;

    fn session(&self) -> &Session<S, P>;

    fn session_mut(&mut self) -> &mut Session<S, P>;
}

/// 每次命令开启一个新的上下文实例
pub struct ContextFactory<C, S, P = NoPublisher> {
    sessions: SessionFactory<S, P>,
    _context: PhantomData<fn() -> C>,
}

impl<C, S, P> ContextFactory<C, S, P>
where
    C: BoundedContext<S, P>,
    S: DurableStore + Clone,
    P: EventPublisher,
{
    pub fn new(sessions: SessionFactory<S, P>) -> Self {
        Self {
            sessions,
            _context: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        self.sessions.store()
    }
}

impl<C, S, P> UnitOfWorkFactory for ContextFactory<C, S, P>
where
    C: BoundedContext<S, P>,
    S: DurableStore + Clone,
    P: EventPublisher,
{
    type Uow = C;

    fn begin(&self, ctx: &AppContext) -> C {
        debug!(context = C::NAME, "unit of work started");
        C::from_session(self.sessions.session(ctx))
    }
}

/// 提交并报告是否写入了数据；没有写入时记录日志，不视为错误
pub(crate) async fn commit<U>(uow: &mut U, command: &'static str) -> Result<bool, AppError>
where
    U: UnitOfWork,
{
    let committed = uow.commit().await?;
    if !committed {
        debug!(command, "command produced no changes");
    }
    Ok(committed)
}
