//! Bulk import: the submitted category/entry tree and the persisted job
//! record that tracks its asynchronous execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::UserId;

/// Import job identifier. Minted once per accepted submission and never
/// reused; callers poll by this id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportJobId(pub Uuid);

impl ImportJobId {
    pub fn generate() -> Self {
        ImportJobId(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ImportJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Progress record for one import submission.
///
/// Created synchronously with expected counts and zero progress; mutated
/// only by the executing worker. Counters never decrease, and once
/// `complete` is set the record is frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: ImportJobId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expected_categories: u64,
    pub imported_categories: u64,
    pub expected_entries: u64,
    pub imported_entries: u64,
    pub complete: bool,
    pub success: bool,
}

/// An event to import: a point in time with an optional timezone label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_timezone: Option<String>,
}

/// A closed range to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDescriptor {
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_timezone: Option<String>,
    pub ended_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_timezone: Option<String>,
}

/// One node of a submitted import tree. Transient: exists only for the
/// duration of an import request and its execution.
///
/// An empty name is legal only at the root and means "create no category
/// for this node; attach its children directly to the account's root".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTreeNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub events: Vec<EventDescriptor>,
    #[serde(default)]
    pub ranges: Vec<RangeDescriptor>,
    #[serde(default)]
    pub children: Vec<ImportTreeNode>,
}
