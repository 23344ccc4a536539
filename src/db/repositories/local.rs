//! In-memory repository implementation.
//!
//! Backs the full repository contract with `HashMap`s behind a
//! `parking_lot::RwLock`. Used for unit testing and local development; the
//! business layer never notices the difference because it only talks to the
//! traits in [`crate::db::repository`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::repository::{
    AccountRepository, CategoryRepository, CategoryUpdate, EntryQuery, EntryRepository,
    EntryUpdate, ErrorContext, ImportRepository, NewCategory, NewEntry, NewImportJob,
    RepositoryError, RepositoryResult, SessionRepository, TimeReference,
};
use crate::models::{
    Account, AccountId, Category, CategoryId, Entry, EntryId, EntryType, ImportJob, ImportJobId,
    User, UserId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    sessions: HashMap<String, UserId>,
    accounts: HashMap<i64, Account>,
    categories: HashMap<i64, Category>,
    entries: HashMap<i64, Entry>,
    import_jobs: HashMap<Uuid, ImportJob>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn account(&self, id: AccountId) -> RepositoryResult<&Account> {
        self.accounts.get(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("account {}", id.value()),
                ErrorContext::default()
                    .with_entity("account")
                    .with_entity_id(id.value()),
            )
        })
    }

    fn category(&self, id: CategoryId) -> RepositoryResult<&Category> {
        self.categories.get(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("category {}", id.value()),
                ErrorContext::default()
                    .with_entity("category")
                    .with_entity_id(id.value()),
            )
        })
    }

    fn entry(&self, id: EntryId) -> RepositoryResult<&Entry> {
        self.entries.get(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("entry {}", id.value()),
                ErrorContext::default()
                    .with_entity("entry")
                    .with_entity_id(id.value()),
            )
        })
    }

    fn root_of(&self, account_id: AccountId) -> RepositoryResult<&Category> {
        self.categories
            .values()
            .find(|c| c.account_id == account_id && c.parent_id.is_none())
            .ok_or_else(|| {
                // Accounts are created together with their root, so a
                // missing root is a broken store, not a missing row.
                RepositoryError::internal(format!(
                    "account {} has no root category",
                    account_id.value()
                ))
            })
    }

    fn open_range_for(&self, category_id: CategoryId) -> Option<&Entry> {
        self.entries
            .values()
            .find(|e| e.category_id == category_id && e.is_open())
    }

    /// Resolve the effective parent for a category placed in `account_id`:
    /// an explicit parent must live in the same account, no parent means
    /// the account root.
    fn resolve_parent(
        &self,
        account_id: AccountId,
        parent_id: Option<CategoryId>,
    ) -> RepositoryResult<CategoryId> {
        match parent_id {
            Some(pid) => {
                let parent = self.category(pid)?;
                if parent.account_id != account_id {
                    return Err(RepositoryError::inconsistent_parent_and_account(
                        ErrorContext::new("resolve_parent")
                            .with_entity("category")
                            .with_entity_id(pid.value()),
                    ));
                }
                Ok(parent.id)
            }
            None => Ok(self.root_of(account_id)?.id),
        }
    }
}

/// In-memory implementation of the full repository contract.
pub struct LocalRepository {
    tables: RwLock<Tables>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for LocalRepository {
    async fn create_account(&self, owner: UserId) -> RepositoryResult<Account> {
        let mut tables = self.tables.write();

        let account_id = AccountId::new(tables.allocate_id());
        let account = Account {
            id: account_id,
            user_ids: vec![owner],
        };
        tables.accounts.insert(account_id.value(), account.clone());

        // Every account starts with a synthetic root category.
        let root_id = tables.allocate_id();
        tables.categories.insert(
            root_id,
            Category {
                id: CategoryId::new(root_id),
                name: String::new(),
                account_id,
                parent_id: None,
            },
        );

        Ok(account)
    }

    async fn fetch_account(&self, id: AccountId) -> RepositoryResult<Account> {
        self.tables.read().account(id).cloned()
    }

    async fn find_accounts_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Account>> {
        let tables = self.tables.read();
        let mut accounts: Vec<Account> = tables
            .accounts
            .values()
            .filter(|a| a.is_member(user_id))
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }
}

#[async_trait]
impl CategoryRepository for LocalRepository {
    async fn create_category(&self, new: NewCategory) -> RepositoryResult<Category> {
        let mut tables = self.tables.write();

        if new.name.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "category name must not be empty",
                ErrorContext::new("create_category"),
            ));
        }

        tables.account(new.account_id)?;
        let parent_id = tables.resolve_parent(new.account_id, new.parent_id)?;

        let id = CategoryId::new(tables.allocate_id());
        let category = Category {
            id,
            name: new.name,
            account_id: new.account_id,
            parent_id: Some(parent_id),
        };
        tables.categories.insert(id.value(), category.clone());
        Ok(category)
    }

    async fn fetch_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.tables.read().category(id).cloned()
    }

    async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> RepositoryResult<Category> {
        let mut tables = self.tables.write();
        let mut category = tables.category(id)?.clone();

        if category.is_root() {
            return Err(RepositoryError::validation_with_context(
                "root categories cannot be updated",
                ErrorContext::new("update_category").with_entity_id(id.value()),
            ));
        }

        if let Some(name) = update.name {
            if name.is_empty() {
                return Err(RepositoryError::validation_with_context(
                    "category name must not be empty",
                    ErrorContext::new("update_category").with_entity_id(id.value()),
                ));
            }
            category.name = name;
        }

        let mut moved_to = None;
        match (update.account_id, update.parent_id) {
            (Some(account_id), parent_id) => {
                // Moving accounts without an explicit parent lands the
                // category under the new account's root.
                tables.account(account_id)?;
                category.account_id = account_id;
                category.parent_id = Some(tables.resolve_parent(account_id, parent_id)?);
                moved_to = Some(account_id);
            }
            (None, Some(parent_id)) => {
                category.parent_id =
                    Some(tables.resolve_parent(category.account_id, Some(parent_id))?);
            }
            (None, None) => {}
        }

        tables.categories.insert(id.value(), category.clone());

        // Descendants follow their parent into the new account; their
        // parent links stay intact, so the whole subtree keeps the
        // same-account invariant.
        if let Some(account_id) = moved_to {
            let mut frontier = vec![category.id];
            while let Some(current) = frontier.pop() {
                let children: Vec<CategoryId> = tables
                    .categories
                    .values()
                    .filter(|c| c.parent_id == Some(current))
                    .map(|c| c.id)
                    .collect();
                for child_id in &children {
                    if let Some(child) = tables.categories.get_mut(&child_id.value()) {
                        child.account_id = account_id;
                    }
                }
                frontier.extend(children);
            }
        }

        Ok(category)
    }

    async fn delete_category(
        &self,
        id: CategoryId,
        delete_children: bool,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let category = tables.category(id)?.clone();

        let mut doomed = vec![category.id];
        if delete_children {
            // Collect every descendant; deletion order does not matter.
            let mut frontier = vec![category.id];
            while let Some(current) = frontier.pop() {
                let children: Vec<CategoryId> = tables
                    .categories
                    .values()
                    .filter(|c| c.parent_id == Some(current))
                    .map(|c| c.id)
                    .collect();
                doomed.extend(&children);
                frontier.extend(children);
            }
        } else {
            // Orphaned children move up to the deleted category's parent.
            let new_parent = category.parent_id;
            for child in tables.categories.values_mut() {
                if child.parent_id == Some(category.id) {
                    child.parent_id = new_parent;
                }
            }
        }

        for category_id in &doomed {
            tables.categories.remove(&category_id.value());
        }
        tables
            .entries
            .retain(|_, e| !doomed.contains(&e.category_id));
        Ok(())
    }

    async fn find_categories_for_account(
        &self,
        account_id: AccountId,
    ) -> RepositoryResult<Vec<Category>> {
        let tables = self.tables.read();
        tables.account(account_id)?;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn root_category(&self, account_id: AccountId) -> RepositoryResult<Category> {
        let tables = self.tables.read();
        tables.account(account_id)?;
        tables.root_of(account_id).cloned()
    }
}

#[async_trait]
impl EntryRepository for LocalRepository {
    async fn create_entry(&self, new: NewEntry) -> RepositoryResult<Entry> {
        let mut tables = self.tables.write();
        tables.category(new.category_id)?;

        if new.entry_type == EntryType::Event && new.ended_at.is_some() {
            return Err(RepositoryError::validation_with_context(
                "event entries cannot carry ended-at data",
                ErrorContext::new("create_entry").with_entity("entry"),
            ));
        }

        let id = EntryId::new(tables.allocate_id());
        let entry = Entry {
            id,
            entry_type: new.entry_type,
            category_id: new.category_id,
            started_at: new.started_at,
            started_at_timezone: new.started_at_timezone,
            ended_at: new.ended_at,
            ended_at_timezone: new.ended_at_timezone,
        };
        tables.entries.insert(id.value(), entry.clone());
        Ok(entry)
    }

    async fn fetch_entry(&self, id: EntryId) -> RepositoryResult<Entry> {
        self.tables.read().entry(id).cloned()
    }

    async fn update_entry(&self, id: EntryId, update: EntryUpdate) -> RepositoryResult<Entry> {
        let mut tables = self.tables.write();
        let mut entry = tables.entry(id)?.clone();

        if let Some(category_id) = update.category_id {
            tables.category(category_id)?;
            entry.category_id = category_id;
        }
        if let Some(entry_type) = update.entry_type {
            entry.entry_type = entry_type;
        }
        if let Some(started_at) = update.started_at {
            entry.started_at = started_at;
        }
        if let Some(ended_at) = update.ended_at {
            if entry.entry_type == EntryType::Event {
                return Err(RepositoryError::validation_with_context(
                    "event entries cannot carry ended-at data",
                    ErrorContext::new("update_entry").with_entity_id(id.value()),
                ));
            }
            entry.ended_at = Some(ended_at);
        }
        if entry.entry_type == EntryType::Event {
            entry.ended_at = None;
            entry.ended_at_timezone = None;
        }

        tables.entries.insert(id.value(), entry.clone());
        Ok(entry)
    }

    async fn delete_entry(&self, id: EntryId) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        tables.entry(id)?;
        tables.entries.remove(&id.value());
        Ok(())
    }

    async fn find_entries(&self, query: EntryQuery) -> RepositoryResult<Vec<Entry>> {
        let tables = self.tables.read();
        let mut results: Vec<Entry> = tables
            .entries
            .values()
            .filter(|entry| {
                if let Some(ref category_ids) = query.category_ids {
                    if !category_ids.contains(&entry.category_id) {
                        return false;
                    }
                }
                if let Some(ref account_ids) = query.account_ids {
                    let owned = tables
                        .categories
                        .get(&entry.category_id.value())
                        .map(|c| account_ids.contains(&c.account_id))
                        .unwrap_or(false);
                    if !owned {
                        return false;
                    }
                }
                if let Some(entry_type) = query.entry_type {
                    if entry.entry_type != entry_type {
                        return false;
                    }
                }
                let reference = match query.reference {
                    TimeReference::Start => Some(entry.started_at),
                    TimeReference::End => entry.ended_at,
                };
                if let Some(after) = query.after {
                    match reference {
                        Some(ts) if ts >= after => {}
                        _ => return false,
                    }
                }
                if let Some(before) = query.before {
                    match reference {
                        Some(ts) if ts < before => {}
                        _ => return false,
                    }
                }
                true
            })
            .cloned()
            .collect();
        results.sort_by_key(|e| e.id);
        Ok(results)
    }

    async fn log_for(
        &self,
        category: &Category,
        timezone: Option<String>,
    ) -> RepositoryResult<Entry> {
        let mut tables = self.tables.write();
        tables.category(category.id)?;

        let id = EntryId::new(tables.allocate_id());
        let entry = Entry {
            id,
            entry_type: EntryType::Event,
            category_id: category.id,
            started_at: Utc::now(),
            started_at_timezone: timezone,
            ended_at: None,
            ended_at_timezone: None,
        };
        tables.entries.insert(id.value(), entry.clone());
        Ok(entry)
    }

    async fn start_for(
        &self,
        category: &Category,
        timezone: Option<String>,
    ) -> RepositoryResult<Entry> {
        let mut tables = self.tables.write();
        tables.category(category.id)?;

        if tables.open_range_for(category.id).is_some() {
            return Err(RepositoryError::invalid_action_with_context(
                "an open range already exists for this category",
                ErrorContext::new("start_for")
                    .with_entity("category")
                    .with_entity_id(category.id.value()),
            ));
        }

        let id = EntryId::new(tables.allocate_id());
        let entry = Entry {
            id,
            entry_type: EntryType::Range,
            category_id: category.id,
            started_at: Utc::now(),
            started_at_timezone: timezone,
            ended_at: None,
            ended_at_timezone: None,
        };
        tables.entries.insert(id.value(), entry.clone());
        Ok(entry)
    }

    async fn stop_for(
        &self,
        category: &Category,
        timezone: Option<String>,
    ) -> RepositoryResult<Entry> {
        let mut tables = self.tables.write();
        tables.category(category.id)?;

        let open_id = match tables.open_range_for(category.id) {
            Some(entry) => entry.id,
            None => {
                return Err(RepositoryError::invalid_action_with_context(
                    "no open range exists for this category",
                    ErrorContext::new("stop_for")
                        .with_entity("category")
                        .with_entity_id(category.id.value()),
                ))
            }
        };

        let entry = tables
            .entries
            .get_mut(&open_id.value())
            .ok_or_else(|| RepositoryError::internal("open range vanished during stop"))?;
        entry.ended_at = Some(Utc::now());
        entry.ended_at_timezone = timezone;
        Ok(entry.clone())
    }
}

#[async_trait]
impl ImportRepository for LocalRepository {
    async fn create_import_job(&self, new: NewImportJob) -> RepositoryResult<ImportJob> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let job = ImportJob {
            id: ImportJobId::generate(),
            user_id: new.user_id,
            created_at: now,
            updated_at: now,
            expected_categories: new.expected_categories,
            imported_categories: 0,
            expected_entries: new.expected_entries,
            imported_entries: 0,
            complete: false,
            success: false,
        };
        tables.import_jobs.insert(job.id.value(), job.clone());
        Ok(job)
    }

    async fn fetch_import_job(&self, id: ImportJobId) -> RepositoryResult<ImportJob> {
        self.tables
            .read()
            .import_jobs
            .get(&id.value())
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("import job {}", id),
                    ErrorContext::default()
                        .with_entity("import_job")
                        .with_entity_id(id),
                )
            })
    }

    async fn find_import_jobs_for_user(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Vec<ImportJob>> {
        let tables = self.tables.read();
        let mut jobs: Vec<ImportJob> = tables
            .import_jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn record_imported_category(&self, id: ImportJobId) -> RepositoryResult<()> {
        self.mutate_job(id, "record_imported_category", |job| {
            job.imported_categories += 1;
        })
    }

    async fn record_imported_entry(&self, id: ImportJobId) -> RepositoryResult<()> {
        self.mutate_job(id, "record_imported_entry", |job| {
            job.imported_entries += 1;
        })
    }

    async fn complete_import_job(&self, id: ImportJobId, success: bool) -> RepositoryResult<()> {
        self.mutate_job(id, "complete_import_job", |job| {
            job.complete = true;
            job.success = success;
        })
    }
}

impl LocalRepository {
    /// Apply a progress mutation to a job, refusing writes after the job
    /// has reached its terminal state.
    fn mutate_job(
        &self,
        id: ImportJobId,
        operation: &str,
        apply: impl FnOnce(&mut ImportJob),
    ) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let job = tables.import_jobs.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("import job {}", id),
                ErrorContext::new(operation).with_entity("import_job"),
            )
        })?;
        if job.complete {
            return Err(RepositoryError::internal(format!(
                "import job {} is already complete",
                id
            ))
            .with_operation(operation));
        }
        apply(job);
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for LocalRepository {
    async fn create_user(&self, email: &str) -> RepositoryResult<User> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::validation_with_context(
                "email already registered",
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }
        let id = UserId::new(tables.allocate_id());
        let user = User {
            id,
            email: email.to_string(),
        };
        tables.users.insert(id.value(), user.clone());
        Ok(user)
    }

    async fn create_session(&self, user_id: UserId) -> RepositoryResult<String> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("user {}", user_id.value()),
                ErrorContext::new("create_session").with_entity("user"),
            ));
        }
        let token = Uuid::new_v4().to_string();
        tables.sessions.insert(token.clone(), user_id);
        Ok(token)
    }

    async fn verify_session(&self, token: &str) -> RepositoryResult<UserId> {
        self.tables
            .read()
            .sessions
            .get(token)
            .copied()
            .ok_or_else(RepositoryError::session_invalid)
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod local_tests;
