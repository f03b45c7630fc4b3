//! 内存版持久化存储（InMemoryStore）
//!
//! 以 `(实体类型, 实体标识)` 为键保存 JSON 行，满足 `DurableStore` 协议：
//! - `flush` 先校验全部变更再一次性应用，任一变更失败则不写入任何行；
//! - 插入已存在的键返回 `DuplicateKey`，更新/删除不存在的键返回 `Conflict`；
//! - 更新时 `unmodified` 中的字段保留存储中的原值；
//! - `fail_next_flush` 可注入一次性故障，便于测试失败路径。
//!
//! 克隆共享同一份数据。
use super::{ChangeSet, DurableStore, RowChange, RowKey};
use crate::aggregate::Aggregate;
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Default)]
struct StoreState {
    rows: HashMap<RowKey, Value>,
    fail_next: Option<String>,
    flushes: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下一次 flush 以给定原因失败（不写入任何行）
    pub async fn fail_next_flush(&self, reason: impl Into<String>) {
        self.state.write().await.fail_next = Some(reason.into());
    }

    /// 直接写入一行（绕过会话，用于准备数据）
    pub async fn seed<A>(&self, aggregate: &A) -> DomainResult<()>
    where
        A: Aggregate,
    {
        let key = RowKey::new(A::TYPE, aggregate.id().to_string());
        let row = serde_json::to_value(aggregate)?;
        self.state.write().await.rows.insert(key, row);
        Ok(())
    }

    pub async fn row(&self, entity_type: &str, entity_id: &str) -> Option<Value> {
        let key = RowKey::new(entity_type, entity_id);
        self.state.read().await.rows.get(&key).cloned()
    }

    /// 读取并反序列化为聚合
    pub async fn load<A>(&self, id: &A::Id) -> DomainResult<Option<A>>
    where
        A: Aggregate,
    {
        match self.row(A::TYPE, &id.to_string()).await {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.rows.is_empty()
    }

    /// 成功完成的 flush 次数
    pub async fn flush_count(&self) -> usize {
        self.state.read().await.flushes
    }

    fn validate(rows: &HashMap<RowKey, Value>, changes: &ChangeSet) -> DomainResult<()> {
        // 模拟逐条应用后的键集合，使同一批次内的先删后插等组合也能正确校验
        let mut inserted: HashSet<&RowKey> = HashSet::new();
        let mut deleted: HashSet<&RowKey> = HashSet::new();

        for change in changes {
            let key = change.key();
            let exists =
                (rows.contains_key(key) || inserted.contains(key)) && !deleted.contains(key);

            match change {
                RowChange::Insert { .. } if exists => {
                    return Err(DomainError::DuplicateKey {
                        entity_type: key.entity_type.clone(),
                        entity_id: key.entity_id.clone(),
                    });
                }
                RowChange::Insert { .. } => {
                    deleted.remove(key);
                    inserted.insert(key);
                }
                RowChange::Update { .. } | RowChange::Delete { .. } if !exists => {
                    return Err(DomainError::Conflict {
                        entity_type: key.entity_type.clone(),
                        entity_id: key.entity_id.clone(),
                        reason: "row does not exist".to_string(),
                    });
                }
                RowChange::Update { .. } => {}
                RowChange::Delete { .. } => {
                    inserted.remove(key);
                    deleted.insert(key);
                }
            }
        }
        Ok(())
    }

    fn merge_protected(stored: Option<&Value>, mut row: Value, unmodified: &[String]) -> Value {
        if let (Some(Value::Object(stored)), Value::Object(target)) = (stored, &mut row) {
            for field in unmodified {
                match stored.get(field) {
                    Some(value) => {
                        target.insert(field.clone(), value.clone());
                    }
                    None => {
                        target.remove(field);
                    }
                }
            }
        }
        row
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn flush(&self, changes: ChangeSet) -> DomainResult<usize> {
        let mut state = self.state.write().await;

        if let Some(reason) = state.fail_next.take() {
            warn!(%reason, "injected flush failure");
            return Err(DomainError::persistence(reason));
        }

        Self::validate(&state.rows, &changes)?;

        let affected = changes.len();
        for change in changes {
            match change {
                RowChange::Insert { key, row } => {
                    state.rows.insert(key, row);
                }
                RowChange::Update {
                    key,
                    row,
                    unmodified,
                } => {
                    let merged = Self::merge_protected(state.rows.get(&key), row, &unmodified);
                    state.rows.insert(key, merged);
                }
                RowChange::Delete { key } => {
                    state.rows.remove(&key);
                }
            }
        }
        state.flushes += 1;

        debug!(rows_affected = affected, "in-memory flush applied");
        Ok(affected)
    }

    async fn fetch(&self, entity_type: &str, entity_id: &str) -> DomainResult<Option<Value>> {
        Ok(self.row(entity_type, entity_id).await)
    }
}
