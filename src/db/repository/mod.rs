//! Repository trait definitions.
//!
//! The storage engine behind accounts, categories, entries, users, and
//! import jobs is abstracted as a set of capability traits. Business logic
//! (ownership resolution, the import pipeline, entry actions) depends only
//! on these traits, so the backend can be swapped without touching it.
//! [`FullRepository`] is the umbrella bound used by application state.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    Account, AccountId, Category, CategoryId, Entry, EntryId, EntryType, ImportJob, ImportJobId,
    User, UserId,
};

/// Fields for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub account_id: AccountId,
    /// `None` attaches the category to the account's root.
    pub parent_id: Option<CategoryId>,
}

/// Partial update for a category. Absent fields are left untouched.
///
/// Setting `account_id` without `parent_id` re-parents the category under
/// the new account's root.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub account_id: Option<AccountId>,
    pub parent_id: Option<CategoryId>,
}

/// Fields for creating an entry with explicit timestamps (import path).
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub entry_type: EntryType,
    pub category_id: CategoryId,
    pub started_at: DateTime<Utc>,
    pub started_at_timezone: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended_at_timezone: Option<String>,
}

/// Partial update for an entry. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub category_id: Option<CategoryId>,
    pub entry_type: Option<EntryType>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Which timestamp `after`/`before` filters compare against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimeReference {
    #[default]
    Start,
    End,
}

/// Search filters for entry listings. Empty query matches everything.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    pub account_ids: Option<Vec<AccountId>>,
    pub category_ids: Option<Vec<CategoryId>>,
    pub entry_type: Option<EntryType>,
    /// Inclusive opening bound.
    pub after: Option<DateTime<Utc>>,
    /// Exclusive closing bound.
    pub before: Option<DateTime<Utc>>,
    pub reference: TimeReference,
}

/// Fields for registering an import job at submission time.
#[derive(Debug, Clone)]
pub struct NewImportJob {
    pub user_id: UserId,
    pub expected_categories: u64,
    pub expected_entries: u64,
}

/// Account persistence operations.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account owned by `owner`. Also creates the account's root
    /// category.
    async fn create_account(&self, owner: UserId) -> RepositoryResult<Account>;

    async fn fetch_account(&self, id: AccountId) -> RepositoryResult<Account>;

    async fn find_accounts_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Account>>;
}

/// Category persistence operations.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create_category(&self, new: NewCategory) -> RepositoryResult<Category>;

    async fn fetch_category(&self, id: CategoryId) -> RepositoryResult<Category>;

    async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> RepositoryResult<Category>;

    /// Delete a category. With `delete_children` false, children are
    /// re-parented onto the deleted category's parent.
    async fn delete_category(&self, id: CategoryId, delete_children: bool)
        -> RepositoryResult<()>;

    async fn find_categories_for_account(
        &self,
        account_id: AccountId,
    ) -> RepositoryResult<Vec<Category>>;

    /// The account's synthetic root category.
    async fn root_category(&self, account_id: AccountId) -> RepositoryResult<Category>;
}

/// Entry persistence operations, including the range state machine.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn create_entry(&self, new: NewEntry) -> RepositoryResult<Entry>;

    async fn fetch_entry(&self, id: EntryId) -> RepositoryResult<Entry>;

    async fn update_entry(&self, id: EntryId, update: EntryUpdate) -> RepositoryResult<Entry>;

    async fn delete_entry(&self, id: EntryId) -> RepositoryResult<()>;

    async fn find_entries(&self, query: EntryQuery) -> RepositoryResult<Vec<Entry>>;

    /// Record a closed, instantaneous event for `category` at the current
    /// time.
    async fn log_for(
        &self,
        category: &Category,
        timezone: Option<String>,
    ) -> RepositoryResult<Entry>;

    /// Open a new range for `category`. Fails with
    /// [`RepositoryError::InvalidAction`] if an open range already exists.
    async fn start_for(
        &self,
        category: &Category,
        timezone: Option<String>,
    ) -> RepositoryResult<Entry>;

    /// Close the currently open range for `category`. Fails with
    /// [`RepositoryError::InvalidAction`] if none is open.
    async fn stop_for(
        &self,
        category: &Category,
        timezone: Option<String>,
    ) -> RepositoryResult<Entry>;
}

/// Import job persistence operations.
///
/// Progress counters are mutated only through `record_*`, which also bumps
/// the job's `updated_at`; once `complete_import_job` has run, further
/// mutation attempts are internal errors.
#[async_trait]
pub trait ImportRepository: Send + Sync {
    async fn create_import_job(&self, new: NewImportJob) -> RepositoryResult<ImportJob>;

    async fn fetch_import_job(&self, id: ImportJobId) -> RepositoryResult<ImportJob>;

    async fn find_import_jobs_for_user(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Vec<ImportJob>>;

    async fn record_imported_category(&self, id: ImportJobId) -> RepositoryResult<()>;

    async fn record_imported_entry(&self, id: ImportJobId) -> RepositoryResult<()>;

    async fn complete_import_job(&self, id: ImportJobId, success: bool) -> RepositoryResult<()>;
}

/// User identity and bearer sessions. Password verification and OAuth
/// issuance live outside this crate; sessions are minted directly.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_user(&self, email: &str) -> RepositoryResult<User>;

    /// Mint a bearer token for `user_id`.
    async fn create_session(&self, user_id: UserId) -> RepositoryResult<String>;

    /// Resolve a bearer token to its user. Fails with
    /// [`RepositoryError::SessionInvalid`] for unknown tokens.
    async fn verify_session(&self, token: &str) -> RepositoryResult<UserId>;
}

/// Umbrella trait combining every repository capability.
pub trait FullRepository:
    AccountRepository + CategoryRepository + EntryRepository + ImportRepository + SessionRepository
{
}

impl<T> FullRepository for T where
    T: AccountRepository
        + CategoryRepository
        + EntryRepository
        + ImportRepository
        + SessionRepository
{
}
