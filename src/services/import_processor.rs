//! Import job registration and asynchronous execution.
//!
//! Submission is synchronous: validate the tree, persist a zero-progress
//! job record, hand the work to the queue, and return the snapshot. The
//! caller never waits for execution and never hears about its outcome
//! except by polling the job record.
//!
//! Execution is strictly sequential within one job. Category creation
//! order encodes the parent-child dependency and entries require their
//! category's id, so parallelizing either pass would corrupt the import.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::db::repository::{
    FullRepository, NewCategory, NewEntry, NewImportJob, RepositoryError, RepositoryResult,
};
use crate::models::{
    CategoryId, EntryType, EventDescriptor, ImportJob, ImportJobId, ImportTreeNode,
    RangeDescriptor, UserId,
};
use crate::services::import_validator::{validate_tree, TreeValidationError};

/// Pending submissions the queue will hold before `submit_import` awaits
/// worker capacity.
const QUEUE_CAPACITY: usize = 64;

/// Errors surfaced synchronously to the submitter. Everything after the
/// job is registered is recorded on the job instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportSubmitError {
    #[error(transparent)]
    InvalidTree(#[from] TreeValidationError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

struct ImportTask {
    job_id: ImportJobId,
    user_id: UserId,
    tree: ImportTreeNode,
}

/// Bounded queue feeding a fixed set of import workers.
///
/// Replaces fire-and-forget task spawning: accepted submissions line up on
/// an `mpsc` channel and a small worker pool drains it. Jobs from
/// different submissions may interleave across workers; one job is only
/// ever executed by one worker.
#[derive(Clone)]
pub struct ImportQueue {
    sender: mpsc::Sender<ImportTask>,
}

impl ImportQueue {
    /// Start `workers` background workers draining the queue against
    /// `repo`. Workers run for the life of the process.
    pub fn start(repo: Arc<dyn FullRepository>, workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<ImportTask>(QUEUE_CAPACITY);
        let receiver = Arc::new(Mutex::new(receiver));

        for worker in 0..workers.max(1) {
            let repo = Arc::clone(&repo);
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move {
                debug!(worker, "import worker started");
                loop {
                    let task = { receiver.lock().await.recv().await };
                    let Some(task) = task else {
                        debug!(worker, "import queue closed, worker exiting");
                        break;
                    };
                    execute_import(repo.as_ref(), task.job_id, task.user_id, task.tree).await;
                }
            });
        }

        Self { sender }
    }

    async fn enqueue(&self, task: ImportTask) -> Result<(), ImportTask> {
        self.sender.send(task).await.map_err(|err| err.0)
    }
}

/// Validate a tree and register its import job.
///
/// On success the returned snapshot always shows zero progress; execution
/// has not necessarily begun when the caller sees it. Validation failures
/// register nothing.
pub async fn submit_import(
    repo: Arc<dyn FullRepository>,
    queue: &ImportQueue,
    user_id: UserId,
    tree: ImportTreeNode,
) -> Result<ImportJob, ImportSubmitError> {
    let counts = validate_tree(&tree)?;

    let job = repo
        .create_import_job(NewImportJob {
            user_id,
            expected_categories: counts.categories,
            expected_entries: counts.entries(),
        })
        .await?;

    info!(
        job = %job.id,
        categories = counts.categories,
        entries = counts.entries(),
        "import job accepted"
    );

    let task = ImportTask {
        job_id: job.id,
        user_id,
        tree,
    };
    if queue.enqueue(task).await.is_err() {
        // Queue shut down between registration and enqueue. The job is
        // already visible to the caller, so it terminates as failed rather
        // than erroring the submission.
        error!(job = %job.id, "import queue unavailable, failing job");
        if let Err(err) = repo.complete_import_job(job.id, false).await {
            error!(job = %job.id, error = %err, "unable to record queue failure");
        }
    }

    Ok(job)
}

/// A flattened batch of entry descriptors bound to a created category.
struct EntrySlot<'a> {
    category_id: CategoryId,
    events: &'a [EventDescriptor],
    ranges: &'a [RangeDescriptor],
}

/// Execute one accepted import to completion.
///
/// Never returns an error: any failure terminates the job as
/// `complete = true, success = false` and is logged, leaving partial
/// progress in place. No rollback, no retry.
pub async fn execute_import(
    repo: &dyn FullRepository,
    job_id: ImportJobId,
    user_id: UserId,
    tree: ImportTreeNode,
) {
    match run(repo, job_id, user_id, &tree).await {
        Ok(()) => {
            if let Err(err) = repo.complete_import_job(job_id, true).await {
                error!(job = %job_id, error = %err, "unable to mark import complete");
            } else {
                info!(job = %job_id, "import complete");
            }
        }
        Err(err) => {
            error!(job = %job_id, error = %err, "import execution failed");
            if let Err(err) = repo.complete_import_job(job_id, false).await {
                error!(job = %job_id, error = %err, "unable to mark import failed");
            }
        }
    }
}

async fn run(
    repo: &dyn FullRepository,
    job_id: ImportJobId,
    user_id: UserId,
    tree: &ImportTreeNode,
) -> RepositoryResult<()> {
    // Every import lands in a fresh account; the store creates the
    // account's root category as part of this call.
    let account = repo.create_account(user_id).await?;

    // Category pass: depth-first pre-order so parents exist before their
    // children. Created ids go into a side table instead of back onto the
    // input tree.
    let mut slots: Vec<EntrySlot<'_>> = Vec::new();
    let mut stack: Vec<(&ImportTreeNode, Option<CategoryId>)> = vec![(tree, None)];

    while let Some((node, parent_id)) = stack.pop() {
        let assigned = if node.name.is_empty() {
            // Unnamed root: no category of its own, children attach to the
            // account root.
            parent_id
        } else {
            let category = repo
                .create_category(NewCategory {
                    name: node.name.clone(),
                    account_id: account.id,
                    parent_id,
                })
                .await?;
            repo.record_imported_category(job_id).await?;
            Some(category.id)
        };

        if let Some(category_id) = assigned {
            if !node.events.is_empty() || !node.ranges.is_empty() {
                slots.push(EntrySlot {
                    category_id,
                    events: &node.events,
                    ranges: &node.ranges,
                });
            }
        }

        for child in node.children.iter().rev() {
            stack.push((child, assigned));
        }
    }

    // Entry pass: only after every category id is resolved.
    for slot in &slots {
        for event in slot.events {
            repo.create_entry(NewEntry {
                entry_type: EntryType::Event,
                category_id: slot.category_id,
                started_at: event.started_at,
                started_at_timezone: event.started_at_timezone.clone(),
                ended_at: None,
                ended_at_timezone: None,
            })
            .await?;
            repo.record_imported_entry(job_id).await?;
        }
        for range in slot.ranges {
            repo.create_entry(NewEntry {
                entry_type: EntryType::Range,
                category_id: slot.category_id,
                started_at: range.started_at,
                started_at_timezone: range.started_at_timezone.clone(),
                ended_at: Some(range.ended_at),
                ended_at_timezone: range.ended_at_timezone.clone(),
            })
            .await?;
            repo.record_imported_entry(job_id).await?;
        }
    }

    Ok(())
}
