use crate::{
    command::Command, command_bus::CommandBus, command_handler::CommandHandler,
    context::AppContext, error::AppError,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

type CmdHandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>>;

type CmdHandlerFn =
    Arc<dyn for<'a> Fn(Box<dyn Any + Send>, &'a AppContext) -> CmdHandlerFuture<'a> + Send + Sync>;

/// 基于内存的 CommandBus 实现
/// - 通过 TypeId 注册不同 Command 对应的 Handler，每种命令只允许一个处理器
/// - 运行时以类型擦除（Any）方式进行调度
pub struct InMemoryCommandBus {
    handlers: DashMap<TypeId, CmdHandlerFn>,
}

impl Default for InMemoryCommandBus {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl InMemoryCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器；同一命令重复注册返回 `AlreadyRegisteredCommand`
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let f: CmdHandlerFn = Arc::new(move |boxed_cmd, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                // 键与闭包同属泛型 C，downcast 不会失败
                match boxed_cmd.downcast::<C>() {
                    Ok(cmd) => handler.handle(ctx, *cmd).await,
                    Err(_) => Err(AppError::TypeMismatch {
                        expected: C::NAME,
                        found: "unknown",
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(f);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl CommandBus for InMemoryCommandBus {
    async fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError> {
        let Some(f) = self.handlers.get(&TypeId::of::<C>()).map(|h| h.clone()) else {
            return Err(AppError::HandlerNotFound(C::NAME));
        };

        debug!(command = C::NAME, "dispatching command");
        (f)(Box::new(cmd), ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping {
        n: usize,
    }

    impl Command for Ping {
        const NAME: &'static str = "Ping";
    }

    struct Unrouted;

    impl Command for Unrouted {
        const NAME: &'static str = "Unrouted";
    }

    #[derive(Default)]
    struct PingHandler {
        total: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler<Ping> for PingHandler {
        async fn handle(&self, _ctx: &AppContext, cmd: Ping) -> Result<(), AppError> {
            if cmd.n == 0 {
                return Err(AppError::Validation("n must be positive".into()));
            }
            self.total.fetch_add(cmd.n, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn routes_commands_by_type() {
        let bus = InMemoryCommandBus::new();
        let handler = Arc::new(PingHandler::default());
        bus.register::<Ping, _>(handler.clone()).unwrap();

        let ctx = AppContext::default();
        bus.dispatch(&ctx, Ping { n: 2 }).await.unwrap();
        bus.dispatch(&ctx, Ping { n: 3 }).await.unwrap();
        assert_eq!(handler.total.load(Ordering::SeqCst), 5);

        let err = bus.dispatch(&ctx, Ping { n: 0 }).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let bus = InMemoryCommandBus::new();
        let err = bus
            .dispatch(&AppContext::default(), Unrouted)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HandlerNotFound("Unrouted")));
    }

    #[test]
    fn second_registration_is_rejected() {
        let bus = InMemoryCommandBus::new();
        bus.register::<Ping, _>(Arc::new(PingHandler::default()))
            .unwrap();
        let err = bus
            .register::<Ping, _>(Arc::new(PingHandler::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::AlreadyRegisteredCommand { command: "Ping" }
        ));
        assert_eq!(bus.len(), 1);
    }
}
