use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 行键：`(实体类型, 实体标识)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub entity_type: String,
    pub entity_id: String,
}

impl RowKey {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}

/// 单行变更
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    Insert {
        key: RowKey,
        row: Value,
    },
    /// `unmodified` 中的字段保持存储中的原值
    Update {
        key: RowKey,
        row: Value,
        unmodified: Vec<String>,
    },
    Delete {
        key: RowKey,
    },
}

impl RowChange {
    pub fn key(&self) -> &RowKey {
        match self {
            RowChange::Insert { key, .. }
            | RowChange::Update { key, .. }
            | RowChange::Delete { key } => key,
        }
    }
}

/// 一次提交的写集合，按跟踪顺序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<RowChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: RowChange) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowChange> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = RowChange;
    type IntoIter = std::vec::IntoIter<RowChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a RowChange;
    type IntoIter = std::slice::Iter<'a, RowChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl FromIterator<RowChange> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = RowChange>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}
