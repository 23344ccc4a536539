//! Ownership-chain authorization.
//!
//! Categories belong to accounts and entries belong to categories, so the
//! only way to decide whether a user may touch a resource is to walk that
//! chain back to the account's user set. Every mutation and read endpoint
//! goes through these resolvers; resolution is performed fresh per request
//! with no caching.

use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{Category, CategoryId, Entry, EntryId, ImportJob, ImportJobId, UserId};

/// Authorization failure.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The resource exists but the user is not a member of the owning
    /// account.
    #[error("user is not authorized for this resource")]
    Unauthorized,

    /// A stored entry references a category that no longer resolves. The
    /// store should make this impossible, so it is reported as a malformed
    /// request rather than a server fault.
    #[error("stored entry references a missing category")]
    DataInconsistency,

    /// Any other store failure while resolving the chain.
    #[error(transparent)]
    Store(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => AuthError::NotFound,
            other => AuthError::Store(other),
        }
    }
}

/// Authorize `user_id` against a category.
///
/// Fetches the category, then its owning account, and requires the user to
/// be a member of the account. Returns the category so callers do not fetch
/// it twice.
pub async fn authorize_category(
    repo: &dyn FullRepository,
    user_id: UserId,
    category_id: CategoryId,
) -> Result<Category, AuthError> {
    let category = repo.fetch_category(category_id).await?;
    let account = repo.fetch_account(category.account_id).await?;

    if !account.is_member(user_id) {
        return Err(AuthError::Unauthorized);
    }

    Ok(category)
}

/// Authorize `user_id` against an entry by resolving its category chain.
///
/// A missing entry is `NotFound`; a missing *category* behind an existing
/// entry is a data inconsistency and surfaces as `DataInconsistency`.
pub async fn authorize_entry(
    repo: &dyn FullRepository,
    user_id: UserId,
    entry_id: EntryId,
) -> Result<Entry, AuthError> {
    let entry = repo.fetch_entry(entry_id).await?;

    match authorize_category(repo, user_id, entry.category_id).await {
        Ok(_) => Ok(entry),
        Err(AuthError::NotFound) => Err(AuthError::DataInconsistency),
        Err(other) => Err(other),
    }
}

/// Authorize `user_id` against an import job. Jobs are owned by a single
/// user and are private to them: another user's job id behaves exactly
/// like an unknown one, so existence is never confirmed across users.
pub async fn authorize_import(
    repo: &dyn FullRepository,
    user_id: UserId,
    import_id: ImportJobId,
) -> Result<ImportJob, AuthError> {
    let job = repo.fetch_import_job(import_id).await?;

    if job.user_id != user_id {
        return Err(AuthError::NotFound);
    }

    Ok(job)
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod ownership_tests;
