use crate::aggregate::Aggregate;
use crate::domain_event::{BusinessContext, SerializedEvent};
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::stamping::CreationStamped;
use crate::store::RowKey;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::any::{Any, type_name};
use std::collections::BTreeSet;

/// 跟踪条目的变更状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

// 类型擦除后的聚合：跟踪器在一个列表里持有不同类型的实体
trait TrackedRecord: Send + Sync {
    fn record_type(&self) -> &'static str;
    fn record_type_name(&self) -> &'static str;
    fn record_id(&self) -> String;
    fn record_row(&self) -> DomainResult<Value>;
    fn record_stamp(&self) -> Option<&dyn CreationStamped>;
    fn record_stamp_mut(&mut self) -> Option<&mut dyn CreationStamped>;
    fn pending_count(&mut self) -> usize;
    fn drain_events(&mut self, context: &BusinessContext) -> DomainResult<Vec<SerializedEvent>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<A> TrackedRecord for A
where
    A: Aggregate,
{
    fn record_type(&self) -> &'static str {
        A::TYPE
    }

    fn record_type_name(&self) -> &'static str {
        type_name::<A>()
    }

    fn record_id(&self) -> String {
        Entity::id(self).to_string()
    }

    fn record_row(&self) -> DomainResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn record_stamp(&self) -> Option<&dyn CreationStamped> {
        Aggregate::creation_stamp(self)
    }

    fn record_stamp_mut(&mut self) -> Option<&mut dyn CreationStamped> {
        Aggregate::creation_stamp_mut(self)
    }

    fn pending_count(&mut self) -> usize {
        Aggregate::pending_events_mut(self).map_or(0, |p| p.len())
    }

    fn drain_events(&mut self, context: &BusinessContext) -> DomainResult<Vec<SerializedEvent>> {
        let aggregate_id = Entity::id(self).to_string();
        let Some(pending) = Aggregate::pending_events_mut(self) else {
            return Ok(Vec::new());
        };

        pending
            .take()
            .iter()
            .map(|raised| SerializedEvent::from_raised(A::TYPE, &aggregate_id, raised, context))
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 跟踪条目：一个实体实例及其变更元数据
pub struct TrackedEntry {
    state: EntryState,
    record: Box<dyn TrackedRecord>,
    // 附加时的行快照，用于检测未显式标记的修改
    snapshot: Option<Value>,
    // 不参与更新的字段
    unmodified: BTreeSet<&'static str>,
}

impl TrackedEntry {
    pub(crate) fn new<A>(aggregate: A, state: EntryState) -> DomainResult<Self>
    where
        A: Aggregate,
    {
        let snapshot = match state {
            EntryState::Unchanged => Some(serde_json::to_value(&aggregate)?),
            _ => None,
        };

        Ok(Self {
            state,
            record: Box::new(aggregate),
            snapshot,
            unmodified: BTreeSet::new(),
        })
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: EntryState) {
        self.state = state;
    }

    pub fn entity_type(&self) -> &'static str {
        self.record.record_type()
    }

    pub fn entity_id(&self) -> String {
        self.record.record_id()
    }

    pub fn key(&self) -> RowKey {
        RowKey::new(self.entity_type(), self.entity_id())
    }

    pub(crate) fn matches(&self, entity_type: &str, entity_id: &str) -> bool {
        self.entity_type() == entity_type && self.entity_id() == entity_id
    }

    /// 实体是否声明了创建时间能力
    pub fn is_creation_stamped(&self) -> bool {
        self.record.record_stamp().is_some()
    }

    /// 创建时间在行中的字段名；未声明能力时为 `None`
    pub fn creation_field(&self) -> Option<&'static str> {
        self.record.record_stamp().map(|s| s.created_at_field())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.record.record_stamp().map(|s| s.created_at())
    }

    /// 写入创建时间；未声明能力时返回 `false` 且不做任何事
    pub fn set_created_at(&mut self, at: DateTime<Utc>) -> bool {
        match self.record.record_stamp_mut() {
            Some(stamp) => {
                stamp.set_created_at(at);
                true
            }
            None => false,
        }
    }

    /// 标记字段是否参与更新
    pub fn set_field_modified(&mut self, field: &'static str, modified: bool) {
        if modified {
            self.unmodified.remove(field);
        } else {
            self.unmodified.insert(field);
        }
    }

    /// 字段在更新时是否会被写入（未被排除）
    pub fn is_field_modified(&self, field: &str) -> bool {
        !self.unmodified.contains(field)
    }

    pub fn unmodified_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.unmodified.iter().copied()
    }

    /// 当前实体的行表示
    pub fn to_row(&self) -> DomainResult<Value> {
        self.record.record_row()
    }

    pub fn pending_event_count(&mut self) -> usize {
        self.record.pending_count()
    }

    pub fn downcast_ref<A>(&self) -> Option<&A>
    where
        A: Aggregate,
    {
        self.record.as_any().downcast_ref::<A>()
    }

    pub fn downcast_mut<A>(&mut self) -> Option<&mut A>
    where
        A: Aggregate,
    {
        self.record.as_any_mut().downcast_mut::<A>()
    }

    pub(crate) fn downcast_or_mismatch<A>(&mut self) -> DomainResult<&mut A>
    where
        A: Aggregate,
    {
        let found = self.record.record_type_name();
        self.record
            .as_any_mut()
            .downcast_mut::<A>()
            .ok_or_else(|| DomainError::TypeMismatch {
                expected: type_name::<A>().to_string(),
                found: found.to_string(),
            })
    }

    /// 换入新的实例；旧实例上尚未发布的事件随之转移
    pub(crate) fn replace<A>(&mut self, mut aggregate: A)
    where
        A: Aggregate,
    {
        let previous = self
            .record
            .as_any_mut()
            .downcast_mut::<A>()
            .and_then(|old| old.pending_events_mut())
            .map(|pending| pending.take());

        if let (Some(earlier), Some(pending)) = (previous, aggregate.pending_events_mut()) {
            pending.restore(earlier);
        }
        self.record = Box::new(aggregate);
    }

    /// 快照比较：未标记的条目若行内容发生变化则转为 `Modified`
    pub(crate) fn detect_change(&mut self) -> DomainResult<bool> {
        if self.state != EntryState::Unchanged {
            return Ok(false);
        }
        let Some(snapshot) = &self.snapshot else {
            return Ok(false);
        };

        if self.record.record_row()? != *snapshot {
            self.state = EntryState::Modified;
            return Ok(true);
        }

        Ok(false)
    }

    /// 去掉不参与更新的字段后与快照比较，没有其它差异时退回 `Unchanged`
    pub(crate) fn settle_excluded_fields(&mut self) -> DomainResult<bool> {
        if self.state != EntryState::Modified || self.unmodified.is_empty() {
            return Ok(false);
        }
        let Some(snapshot) = &self.snapshot else {
            return Ok(false);
        };

        let current = without_fields(self.record.record_row()?, &self.unmodified);
        if current != without_fields(snapshot.clone(), &self.unmodified) {
            return Ok(false);
        }

        self.state = EntryState::Unchanged;
        self.unmodified.clear();
        Ok(true)
    }

    pub(crate) fn take_events(
        &mut self,
        context: &BusinessContext,
    ) -> DomainResult<Vec<SerializedEvent>> {
        self.record.drain_events(context)
    }
}

fn without_fields(mut row: Value, fields: &BTreeSet<&'static str>) -> Value {
    if let Value::Object(map) = &mut row {
        for field in fields {
            map.remove(*field);
        }
    }
    row
}

impl std::fmt::Debug for TrackedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedEntry")
            .field("state", &self.state)
            .field("entity_type", &self.entity_type())
            .field("entity_id", &self.entity_id())
            .field("unmodified", &self.unmodified)
            .finish()
    }
}
