//! 应用层（uow-application）
//!
//! 命令经 `CommandBus` 路由到处理器；每个处理器通过 `UnitOfWorkFactory`
//! 为一次命令开启一个新的工作单元，并在结束时提交一次。
//!
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod context;
pub mod error;
pub mod inmemory_command_bus;
pub mod unit_of_work_factory;

pub use inmemory_command_bus::InMemoryCommandBus;
pub use unit_of_work_factory::UnitOfWorkFactory;
