//! Data Transfer Objects for the HTTP API.
//!
//! Wire shapes follow the original snake_case field naming: flat objects
//! for accounts/categories/entries, and `{imported, expected}` progress
//! pairs on import job snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository::TimeReference;
use crate::models::{Account, Category, Entry, EntryAction, EntryType, ImportJob};

/// Account representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub user_ids: Vec<i64>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.value(),
            user_ids: account.user_ids.iter().map(|u| u.value()).collect(),
        }
    }
}

/// Category representation. `parent_id` is null for an account root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub account_id: i64,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.value(),
            parent_id: category.parent_id.map(|p| p.value()),
            account_id: category.account_id.value(),
            name: category.name,
        }
    }
}

/// Entry representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category_id: i64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at_timezone: Option<String>,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id.value(),
            entry_type: entry.entry_type,
            category_id: entry.category_id.value(),
            started_at: entry.started_at,
            started_at_timezone: entry.started_at_timezone,
            ended_at: entry.ended_at,
            ended_at_timezone: entry.ended_at_timezone,
        }
    }
}

/// `{imported, expected}` progress pair on import job snapshots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportProgress {
    pub imported: u64,
    pub expected: u64,
}

/// Import job snapshot for submission responses and polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJobResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: ImportProgress,
    pub entries: ImportProgress,
    pub complete: bool,
    pub success: bool,
}

impl From<ImportJob> for ImportJobResponse {
    fn from(job: ImportJob) -> Self {
        Self {
            id: job.id.value(),
            created_at: job.created_at,
            updated_at: job.updated_at,
            categories: ImportProgress {
                imported: job.imported_categories,
                expected: job.expected_categories,
            },
            entries: ImportProgress {
                imported: job.imported_entries,
                expected: job.expected_entries,
            },
            complete: job.complete,
            success: job.success,
        }
    }
}

/// Body for `POST /categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub account_id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Body for `PUT /categories/{id}`. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl UpdateCategoryRequest {
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() && self.name.is_none() && self.parent_id.is_none()
    }
}

/// Optional body for `DELETE /categories/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteCategoryRequest {
    #[serde(default)]
    pub delete_children: bool,
}

/// Query parameters for `GET /categories`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoriesQuery {
    #[serde(default)]
    pub account_id: Option<i64>,
}

/// Body for `POST /entries`: record an event or drive the range state
/// machine. `action` is required for ranges and forbidden for events.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    pub category_id: i64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub action: Option<EntryAction>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Body for `PUT /entries/{id}`. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl UpdateEntryRequest {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.entry_type.is_none()
            && self.started_at.is_none()
            && self.ended_at.is_none()
    }
}

/// Which timestamp entry-window filters compare against.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceField {
    #[default]
    Start,
    End,
}

impl From<ReferenceField> for TimeReference {
    fn from(value: ReferenceField) -> Self {
        match value {
            ReferenceField::Start => TimeReference::Start,
            ReferenceField::End => TimeReference::End,
        }
    }
}

/// Query parameters for `GET /entries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntriesQuery {
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    /// Inclusive opening bound.
    #[serde(default)]
    pub after: Option<DateTime<Utc>>,
    /// Exclusive closing bound.
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reference: ReferenceField,
}

/// Generic `{success}` acknowledgement for deletions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
