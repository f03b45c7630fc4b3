use uow_domain::domain_event::BusinessContext;

/// 应用层上下文（Application Context）
///
/// 承载一次命令调用的横切信息。其中的业务语境（`BusinessContext`）
/// 会被工作单元写入本次提交发布的每个事件。
///
/// ```rust
/// use uow_application::context::AppContext;
/// use uow_domain::domain_event::BusinessContext;
///
/// let ctx = AppContext {
///     biz: BusinessContext::builder()
///         .correlation_id("cor-123".to_string())
///         .actor_type("user".to_string())
///         .actor_id("u-1".to_string())
///         .build(),
/// };
/// assert_eq!(ctx.biz.actor_id(), Some("u-1"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 业务语境（链路追踪、审计主体、操作因果）
    pub biz: BusinessContext,
}
