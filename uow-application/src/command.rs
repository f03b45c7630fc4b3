/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，每个命令在一个工作单元内执行并提交一次。
/// 建议保持语义化的“动宾结构”命名，如 `PlaceOrder`、`ApprovePayment`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于日志与路由。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;
}
