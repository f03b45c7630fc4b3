//! 持久化存储协议（DurableStore）
//!
use super::ChangeSet;
use crate::error::DomainResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait DurableStore: Send + Sync {
    /// 原子写入全部变更，返回受影响的行数；失败时不得留下部分写入
    async fn flush(&self, changes: ChangeSet) -> DomainResult<usize>;

    /// 读取一行
    async fn fetch(&self, entity_type: &str, entity_id: &str) -> DomainResult<Option<Value>>;
}

#[async_trait]
impl<T> DurableStore for Arc<T>
where
    T: DurableStore + ?Sized,
{
    async fn flush(&self, changes: ChangeSet) -> DomainResult<usize> {
        (**self).flush(changes).await
    }

    async fn fetch(&self, entity_type: &str, entity_id: &str) -> DomainResult<Option<Value>> {
        (**self).fetch(entity_type, entity_id).await
    }
}
