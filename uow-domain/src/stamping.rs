//! 创建时间戳约定（Stamping Policy）
//!
//! 在 flush 之前对全部跟踪条目统一执行：
//! - `Added`：把创建时间设置为本次提交开始时的时刻（同一次提交共享同一时刻）；
//! - `Modified`：把创建时间字段移出更新集合，调用方在内存中的改动不会落盘；
//! - `Deleted` / `Unchanged`：不处理。
//!
//! 不具备创建时间能力的实体直接跳过，这不是错误。
//!
use crate::tracking::{EntryState, TrackedEntry};
use chrono::{DateTime, Utc};

/// 默认的创建时间字段名（与序列化后的行字段一致）
pub const CREATED_AT_FIELD: &str = "created_at";

/// 创建时间字段的类型（宏生成的字段使用该别名）
pub type Timestamp = DateTime<Utc>;

/// 创建时间能力：由实体在编译期声明（见 `#[aggregate(created_at)]`）
pub trait CreationStamped {
    fn created_at(&self) -> DateTime<Utc>;

    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// 创建时间在持久化行中的字段名
    fn created_at_field(&self) -> &'static str {
        CREATED_AT_FIELD
    }
}

/// 提交前对跟踪条目执行的字段约定
pub trait StampingPolicy: Send + Sync {
    fn apply(&self, entries: &mut [TrackedEntry], now: DateTime<Utc>);
}

/// 创建时间：插入时写入、之后只读
#[derive(Debug, Clone, Copy, Default)]
pub struct CreationStampPolicy;

impl StampingPolicy for CreationStampPolicy {
    fn apply(&self, entries: &mut [TrackedEntry], now: DateTime<Utc>) {
        for entry in entries.iter_mut() {
            let Some(field) = entry.creation_field() else {
                continue;
            };

            match entry.state() {
                EntryState::Added => {
                    entry.set_created_at(now);
                    tracing::trace!(
                        entity_type = entry.entity_type(),
                        entity_id = %entry.entity_id(),
                        "creation timestamp stamped"
                    );
                }
                EntryState::Modified => {
                    entry.set_field_modified(field, false);
                    tracing::trace!(
                        entity_type = entry.entity_type(),
                        entity_id = %entry.entity_id(),
                        field,
                        "creation timestamp excluded from update"
                    );
                }
                EntryState::Deleted | EntryState::Unchanged => {}
            }
        }
    }
}
