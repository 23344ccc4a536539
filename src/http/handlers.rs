//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint, performs request-level
//! validation, and delegates to the service layer. Every category and
//! entry operation resolves ownership before touching entity logic.

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::dto::{
    AccountResponse, CategoriesQuery, CategoryResponse, CreateCategoryRequest, CreateEntryRequest,
    DeleteCategoryRequest, EntriesQuery, EntryResponse, HealthResponse, ImportJobResponse,
    SuccessResponse, UpdateCategoryRequest, UpdateEntryRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::{CategoryUpdate, EntryQuery, EntryUpdate, NewCategory};
use crate::models::{AccountId, CategoryId, EntryId, ImportJobId, ImportTreeNode};
use crate::services::{
    apply_entry_operation, authorize_category, authorize_entry, authorize_import,
    resolve_entry_action, submit_import,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
    })
}

// =============================================================================
// Accounts
// =============================================================================

/// GET /accounts
///
/// List the accounts the authenticated user belongs to.
pub async fn list_accounts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<Vec<AccountResponse>> {
    let accounts = state
        .repository
        .find_accounts_for_user(user.user_id)
        .await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// POST /accounts
///
/// Create a new account owned by the caller. The account's root category
/// is created alongside it.
pub async fn create_account(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<AccountResponse> {
    let account = state.repository.create_account(user.user_id).await?;
    Ok(Json(account.into()))
}

/// GET /accounts/{id}
pub async fn get_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> HandlerResult<AccountResponse> {
    let account = state.repository.fetch_account(AccountId::new(id)).await?;
    if !account.is_member(user.user_id) {
        return Err(AppError::Unauthorized);
    }
    Ok(Json(account.into()))
}

// =============================================================================
// Categories
// =============================================================================

/// GET /categories
///
/// List categories across all of the caller's accounts, optionally
/// filtered to one account.
pub async fn list_categories(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<CategoriesQuery>,
) -> HandlerResult<Vec<CategoryResponse>> {
    let mut accounts = state
        .repository
        .find_accounts_for_user(user.user_id)
        .await?;
    if let Some(filter) = query.account_id {
        accounts.retain(|a| a.id.value() == filter);
    }

    let mut categories = Vec::new();
    for account in accounts {
        categories.extend(
            state
                .repository
                .find_categories_for_account(account.id)
                .await?,
        );
    }

    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// POST /categories
///
/// Create a category in one of the caller's accounts. A missing target
/// account (or one the caller does not belong to) is an authorization
/// failure; a missing parent is a bad request.
pub async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateCategoryRequest>,
) -> HandlerResult<CategoryResponse> {
    let accounts = state
        .repository
        .find_accounts_for_user(user.user_id)
        .await?;
    let allowed = accounts.iter().any(|a| a.id.value() == request.account_id);
    if !allowed {
        return Err(AppError::Unauthorized);
    }

    let parent_id = match request.parent_id {
        Some(parent_id) => {
            let parent = state
                .repository
                .fetch_category(CategoryId::new(parent_id))
                .await
                .map_err(|_| AppError::BadRequest("Parent category not found".into()))?;
            Some(parent.id)
        }
        None => None,
    };

    let category = state
        .repository
        .create_category(NewCategory {
            name: request.name,
            account_id: AccountId::new(request.account_id),
            parent_id,
        })
        .await?;

    Ok(Json(category.into()))
}

/// GET /categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> HandlerResult<CategoryResponse> {
    let category =
        authorize_category(state.repository.as_ref(), user.user_id, CategoryId::new(id)).await?;
    Ok(Json(category.into()))
}

/// PUT /categories/{id}
///
/// Rename, re-account, or re-parent a category. Target accounts and
/// parents must also be owned by the caller.
pub async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> HandlerResult<CategoryResponse> {
    if request.is_empty() {
        return Err(AppError::BadRequest(
            "At least one of account_id, name, or parent_id is required".into(),
        ));
    }

    let category =
        authorize_category(state.repository.as_ref(), user.user_id, CategoryId::new(id)).await?;

    if let Some(account_id) = request.account_id {
        let account = state
            .repository
            .fetch_account(AccountId::new(account_id))
            .await?;
        if !account.is_member(user.user_id) {
            return Err(AppError::Unauthorized);
        }
    }

    if let Some(parent_id) = request.parent_id {
        authorize_category(
            state.repository.as_ref(),
            user.user_id,
            CategoryId::new(parent_id),
        )
        .await?;
    }

    let updated = state
        .repository
        .update_category(
            category.id,
            CategoryUpdate {
                name: request.name,
                account_id: request.account_id.map(AccountId::new),
                parent_id: request.parent_id.map(CategoryId::new),
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// DELETE /categories/{id}
///
/// Delete a category. Children are re-parented unless the optional body
/// sets `delete_children`.
pub async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    request: Option<Json<DeleteCategoryRequest>>,
) -> HandlerResult<SuccessResponse> {
    let category =
        authorize_category(state.repository.as_ref(), user.user_id, CategoryId::new(id)).await?;

    let delete_children = request.map(|Json(r)| r.delete_children).unwrap_or(false);
    state
        .repository
        .delete_category(category.id, delete_children)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

// =============================================================================
// Entries
// =============================================================================

/// GET /entries
///
/// List entries across the caller's accounts with optional filters.
pub async fn list_entries(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<EntriesQuery>,
) -> HandlerResult<Vec<EntryResponse>> {
    let accounts = state
        .repository
        .find_accounts_for_user(user.user_id)
        .await?;
    let mut account_ids: Vec<AccountId> = accounts.iter().map(|a| a.id).collect();
    if let Some(filter) = query.account_id {
        account_ids.retain(|id| id.value() == filter);
    }

    let entries = state
        .repository
        .find_entries(EntryQuery {
            account_ids: Some(account_ids),
            category_ids: query.category_id.map(|id| vec![CategoryId::new(id)]),
            entry_type: query.entry_type,
            after: query.after,
            before: query.before,
            reference: query.reference.into(),
        })
        .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// POST /entries
///
/// Record an event or drive the range state machine for a category. The
/// `(type, action)` pair is validated before any store call; illegal
/// transitions surface as bad requests.
pub async fn create_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateEntryRequest>,
) -> HandlerResult<EntryResponse> {
    let category = authorize_category(
        state.repository.as_ref(),
        user.user_id,
        CategoryId::new(request.category_id),
    )
    .await?;

    let operation = resolve_entry_action(request.entry_type, request.action)?;
    let entry = apply_entry_operation(
        state.repository.as_ref(),
        operation,
        &category,
        request.timezone,
    )
    .await?;

    Ok(Json(entry.into()))
}

/// GET /entries/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> HandlerResult<EntryResponse> {
    let entry = authorize_entry(state.repository.as_ref(), user.user_id, EntryId::new(id)).await?;
    Ok(Json(entry.into()))
}

/// PUT /entries/{id}
///
/// Update an entry's category, type, or timestamps. A new category must
/// also pass ownership resolution.
pub async fn update_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEntryRequest>,
) -> HandlerResult<EntryResponse> {
    if request.is_empty() {
        return Err(AppError::BadRequest(
            "At least one of category_id, type, started_at, or ended_at is required".into(),
        ));
    }

    let entry = authorize_entry(state.repository.as_ref(), user.user_id, EntryId::new(id)).await?;

    let category_id = match request.category_id {
        Some(category_id) => {
            let category = authorize_category(
                state.repository.as_ref(),
                user.user_id,
                CategoryId::new(category_id),
            )
            .await?;
            Some(category.id)
        }
        None => None,
    };

    let updated = state
        .repository
        .update_entry(
            entry.id,
            EntryUpdate {
                category_id,
                entry_type: request.entry_type,
                started_at: request.started_at,
                ended_at: request.ended_at,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// DELETE /entries/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> HandlerResult<SuccessResponse> {
    let entry = authorize_entry(state.repository.as_ref(), user.user_id, EntryId::new(id)).await?;
    state.repository.delete_entry(entry.id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// =============================================================================
// Import
// =============================================================================

/// POST /import
///
/// Validate and accept an import tree. The response is the freshly
/// registered job with zero progress; execution happens in the background
/// and is observable only by polling.
pub async fn create_import(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(tree): Json<ImportTreeNode>,
) -> HandlerResult<ImportJobResponse> {
    let job = submit_import(
        state.repository.clone(),
        &state.import_queue,
        user.user_id,
        tree,
    )
    .await?;
    Ok(Json(job.into()))
}

/// GET /import
///
/// List all of the caller's import jobs.
pub async fn list_imports(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<Vec<ImportJobResponse>> {
    let jobs = state
        .repository
        .find_import_jobs_for_user(user.user_id)
        .await?;
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

/// GET /import/{id}
///
/// Poll one import job's progress snapshot.
pub async fn get_import(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> HandlerResult<ImportJobResponse> {
    let job = authorize_import(state.repository.as_ref(), user.user_id, ImportJobId(id)).await?;
    Ok(Json(job.into()))
}

/// GET /import/{id}/events
///
/// Stream import job snapshots via Server-Sent Events until the job
/// reaches a terminal state.
pub async fn stream_import_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let job_id = ImportJobId(id);
    // Ownership is checked once up front; the job's owner never changes.
    authorize_import(state.repository.as_ref(), user.user_id, job_id).await?;

    let repository = state.repository.clone();
    let stream = async_stream::stream! {
        loop {
            let Ok(job) = repository.fetch_import_job(job_id).await else {
                break;
            };
            let terminal = job.complete;
            let snapshot = ImportJobResponse::from(job);
            let data = serde_json::to_string(&snapshot).unwrap_or_default();

            if terminal {
                yield Ok(Event::default().event("complete").data(data));
                break;
            }
            yield Ok(Event::default().data(data));

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
