use super::entry::{EntryState, TrackedEntry};
use crate::aggregate::Aggregate;
use crate::error::{DomainError, DomainResult};
use crate::store::{ChangeSet, RowChange};

/// 变更跟踪器：记录自上次提交以来的全部实体变更
///
/// - `insert` → `Added`；`update` → `Modified`（已是 `Added` 时保持）；
/// - `remove` → `Deleted`（尚未持久化的 `Added` 条目直接移除）；
/// - `attach` → `Unchanged`，并在提交前通过快照比较检测隐式修改。
///
/// 同一 `(类型, 标识)` 只允许对应一个条目。
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: Vec<TrackedEntry>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, entity_type: &str, entity_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.matches(entity_type, entity_id))
    }

    fn push<A>(&mut self, entry: TrackedEntry) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        self.entries[last].downcast_or_mismatch::<A>()
    }

    fn ensure_untracked<A>(&self, entity_id: &str) -> DomainResult<()>
    where
        A: Aggregate,
    {
        match self.position(A::TYPE, entity_id) {
            Some(_) => Err(DomainError::AlreadyTracked {
                entity_type: A::TYPE.to_string(),
                entity_id: entity_id.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// 跟踪一个新实体（提交时插入）
    pub fn insert<A>(&mut self, aggregate: A) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        self.ensure_untracked::<A>(&aggregate.id().to_string())?;
        self.push(TrackedEntry::new(aggregate, EntryState::Added)?)
    }

    /// 跟踪一个已持久化、尚未修改的实体
    pub fn attach<A>(&mut self, aggregate: A) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        self.ensure_untracked::<A>(&aggregate.id().to_string())?;
        self.push(TrackedEntry::new(aggregate, EntryState::Unchanged)?)
    }

    /// 以给定实例整体更新实体
    pub fn update<A>(&mut self, aggregate: A) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        let id = aggregate.id().to_string();
        match self.position(A::TYPE, &id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                if entry.state() == EntryState::Deleted {
                    return Err(DomainError::InvalidState {
                        reason: format!("{}/{} is marked for deletion", A::TYPE, id),
                    });
                }
                entry.replace(aggregate);
                if entry.state() != EntryState::Added {
                    entry.set_state(EntryState::Modified);
                }
                entry.downcast_or_mismatch::<A>()
            }
            None => self.push(TrackedEntry::new(aggregate, EntryState::Modified)?),
        }
    }

    /// 删除实体
    pub fn remove<A>(&mut self, aggregate: A) -> DomainResult<()>
    where
        A: Aggregate,
    {
        let id = aggregate.id().to_string();
        match self.position(A::TYPE, &id) {
            Some(index) if self.entries[index].state() == EntryState::Added => {
                self.entries.remove(index);
            }
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.replace(aggregate);
                entry.set_state(EntryState::Deleted);
            }
            None => {
                self.entries
                    .push(TrackedEntry::new(aggregate, EntryState::Deleted)?);
            }
        }
        Ok(())
    }

    /// 按标识删除已跟踪的实体
    pub fn delete<A>(&mut self, id: &A::Id) -> DomainResult<()>
    where
        A: Aggregate,
    {
        let id = id.to_string();
        match self.position(A::TYPE, &id) {
            Some(index) if self.entries[index].state() == EntryState::Added => {
                self.entries.remove(index);
                Ok(())
            }
            Some(index) => {
                self.entries[index].set_state(EntryState::Deleted);
                Ok(())
            }
            None => Err(DomainError::NotFound {
                reason: format!("{}/{} is not tracked", A::TYPE, id),
            }),
        }
    }

    pub fn find<A>(&self, id: &A::Id) -> Option<&A>
    where
        A: Aggregate,
    {
        self.position(A::TYPE, &id.to_string())
            .and_then(|i| self.entries[i].downcast_ref::<A>())
    }

    pub fn find_mut<A>(&mut self, id: &A::Id) -> Option<&mut A>
    where
        A: Aggregate,
    {
        self.position(A::TYPE, &id.to_string())
            .and_then(|i| self.entries[i].downcast_mut::<A>())
    }

    pub fn entries(&self) -> &[TrackedEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [TrackedEntry] {
        &mut self.entries
    }

    /// 比较快照，把隐式修改过的 `Unchanged` 条目提升为 `Modified`，返回提升的数量
    pub fn detect_changes(&mut self) -> DomainResult<usize> {
        let mut promoted = 0;
        for entry in self.entries.iter_mut() {
            if entry.detect_change()? {
                promoted += 1;
            }
        }
        Ok(promoted)
    }

    /// 排除字段之后已无差异的 `Modified` 条目退回 `Unchanged`，返回退回的数量
    ///
    /// 须在 stamping 之后调用
    pub fn settle_excluded_fields(&mut self) -> DomainResult<usize> {
        let mut settled = 0;
        for entry in self.entries.iter_mut() {
            if entry.settle_excluded_fields()? {
                settled += 1;
            }
        }
        Ok(settled)
    }

    /// 是否存在显式标记的变更（不做快照比较）
    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.state() != EntryState::Unchanged)
    }

    /// 构建交给存储 flush 的写集合
    pub fn change_set(&self) -> DomainResult<ChangeSet> {
        let mut set = ChangeSet::new();
        for entry in &self.entries {
            let change = match entry.state() {
                EntryState::Added => RowChange::Insert {
                    key: entry.key(),
                    row: entry.to_row()?,
                },
                EntryState::Modified => RowChange::Update {
                    key: entry.key(),
                    row: entry.to_row()?,
                    unmodified: entry.unmodified_fields().map(str::to_string).collect(),
                },
                EntryState::Deleted => RowChange::Delete { key: entry.key() },
                EntryState::Unchanged => continue,
            };
            set.push(change);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 丢弃全部条目（连同其上未发布的事件）
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
