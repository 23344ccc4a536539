//! End-to-end tests for the bulk import pipeline: validation, job
//! registration, queued execution, and progress reporting.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use time_backend::db::repositories::LocalRepository;
use time_backend::db::repository::{
    EntryQuery, FullRepository, ImportRepository, SessionRepository,
};
use time_backend::models::{EntryType, EventDescriptor, ImportJob, ImportTreeNode, RangeDescriptor};
use time_backend::services::{
    execute_import, submit_import, validate_tree, ImportQueue, ImportSubmitError,
};

fn event(hour: u32) -> EventDescriptor {
    EventDescriptor {
        started_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        started_at_timezone: Some("Europe/Madrid".to_string()),
    }
}

fn range(hour: u32) -> RangeDescriptor {
    RangeDescriptor {
        started_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        started_at_timezone: None,
        ended_at: Utc.with_ymd_and_hms(2024, 3, 1, hour + 1, 0, 0).unwrap(),
        ended_at_timezone: None,
    }
}

fn leaf(name: &str, events: Vec<EventDescriptor>, ranges: Vec<RangeDescriptor>) -> ImportTreeNode {
    ImportTreeNode {
        name: name.to_string(),
        events,
        ranges,
        children: vec![],
    }
}

/// A small but representative tree:
///
/// ```text
/// ""                       (unnamed root, no category)
/// ├── Work                 1 range
/// │   ├── Meetings         2 events
/// │   └── Deep Focus       1 range
/// └── Personal             1 event
/// ```
fn sample_tree() -> ImportTreeNode {
    ImportTreeNode {
        name: String::new(),
        events: vec![],
        ranges: vec![],
        children: vec![
            ImportTreeNode {
                name: "Work".to_string(),
                events: vec![],
                ranges: vec![range(9)],
                children: vec![
                    leaf("Meetings", vec![event(10), event(11)], vec![]),
                    leaf("Deep Focus", vec![], vec![range(14)]),
                ],
            },
            leaf("Personal", vec![event(19)], vec![]),
        ],
    }
}

async fn wait_for_completion(repo: &dyn FullRepository, job: &ImportJob) -> ImportJob {
    for _ in 0..100 {
        let snapshot = repo.fetch_import_job(job.id).await.unwrap();
        if snapshot.complete {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("import job never completed");
}

#[tokio::test]
async fn submission_registers_zero_progress_job() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 1);
    let user = repo.create_user("alice@example.com").await.unwrap();

    let job = submit_import(Arc::clone(&repo), &queue, user.id, sample_tree())
        .await
        .unwrap();

    assert_eq!(job.expected_categories, 4);
    assert_eq!(job.expected_entries, 5);
    assert_eq!(job.imported_categories, 0);
    assert_eq!(job.imported_entries, 0);
    assert!(!job.complete);
    assert!(!job.success);
}

#[tokio::test]
async fn queued_import_runs_to_successful_completion() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 2);
    let user = repo.create_user("alice@example.com").await.unwrap();

    let job = submit_import(Arc::clone(&repo), &queue, user.id, sample_tree())
        .await
        .unwrap();
    let done = wait_for_completion(repo.as_ref(), &job).await;

    assert!(done.success);
    assert_eq!(done.imported_categories, done.expected_categories);
    assert_eq!(done.imported_entries, done.expected_entries);
    assert!(done.updated_at >= done.created_at);

    // The import created a fresh account holding the whole tree.
    let accounts = repo.find_accounts_for_user(user.id).await.unwrap();
    assert_eq!(accounts.len(), 1);
    let account = &accounts[0];

    let categories = repo.find_categories_for_account(account.id).await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"Work"));
    assert!(names.contains(&"Meetings"));
    assert!(names.contains(&"Deep Focus"));
    assert!(names.contains(&"Personal"));

    // Parent links follow the submitted shape: top-level nodes hang off
    // the account root, nested ones off their tree parent.
    let root = repo.root_category(account.id).await.unwrap();
    let by_name = |n: &str| categories.iter().find(|c| c.name == n).unwrap();
    assert_eq!(by_name("Work").parent_id, Some(root.id));
    assert_eq!(by_name("Personal").parent_id, Some(root.id));
    assert_eq!(by_name("Meetings").parent_id, Some(by_name("Work").id));
    assert_eq!(by_name("Deep Focus").parent_id, Some(by_name("Work").id));

    let entries = repo
        .find_entries(EntryQuery {
            account_ids: Some(vec![account.id]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Event)
            .count(),
        3
    );
    // Imported ranges arrive closed; none may be left open.
    assert!(entries.iter().all(|e| !e.is_open()));
}

#[tokio::test]
async fn single_category_with_event() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let user = repo.create_user("bob@example.com").await.unwrap();

    let tree = ImportTreeNode {
        name: String::new(),
        events: vec![],
        ranges: vec![],
        children: vec![leaf("Work", vec![event(9)], vec![])],
    };

    let counts = validate_tree(&tree).unwrap();
    assert_eq!(counts.categories, 1);
    assert_eq!(counts.entries(), 1);

    let queue = ImportQueue::start(Arc::clone(&repo), 1);
    let job = submit_import(Arc::clone(&repo), &queue, user.id, tree)
        .await
        .unwrap();
    let done = wait_for_completion(repo.as_ref(), &job).await;

    assert!(done.success);
    assert_eq!(done.imported_categories, 1);
    assert_eq!(done.imported_entries, 1);
}

#[tokio::test]
async fn named_root_becomes_a_category() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 1);
    let user = repo.create_user("carol@example.com").await.unwrap();

    let tree = ImportTreeNode {
        name: "Everything".to_string(),
        events: vec![event(8)],
        ranges: vec![],
        children: vec![leaf("Inner", vec![], vec![range(9)])],
    };

    let job = submit_import(Arc::clone(&repo), &queue, user.id, tree)
        .await
        .unwrap();
    assert_eq!(job.expected_categories, 2);
    let done = wait_for_completion(repo.as_ref(), &job).await;
    assert!(done.success);
    assert_eq!(done.imported_categories, 2);
    assert_eq!(done.imported_entries, 2);

    let account = repo.find_accounts_for_user(user.id).await.unwrap()[0].clone();
    let categories = repo.find_categories_for_account(account.id).await.unwrap();
    let root = repo.root_category(account.id).await.unwrap();
    let everything = categories.iter().find(|c| c.name == "Everything").unwrap();
    let inner = categories.iter().find(|c| c.name == "Inner").unwrap();
    assert_eq!(everything.parent_id, Some(root.id));
    assert_eq!(inner.parent_id, Some(everything.id));
}

#[tokio::test]
async fn invalid_tree_registers_nothing() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 1);
    let user = repo.create_user("dave@example.com").await.unwrap();

    let tree = ImportTreeNode {
        name: String::new(),
        events: vec![],
        ranges: vec![],
        children: vec![ImportTreeNode {
            name: "Work".to_string(),
            events: vec![],
            ranges: vec![],
            // Empty names below the root are rejected.
            children: vec![leaf("", vec![event(9)], vec![])],
        }],
    };

    let err = submit_import(Arc::clone(&repo), &queue, user.id, tree)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportSubmitError::InvalidTree(_)));

    // Rejected submissions leave no trace: no job, no account, no data.
    assert!(repo
        .find_import_jobs_for_user(user.id)
        .await
        .unwrap()
        .is_empty());
    assert!(repo.find_accounts_for_user(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn resubmission_creates_a_second_account() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 1);
    let user = repo.create_user("erin@example.com").await.unwrap();

    let first = submit_import(Arc::clone(&repo), &queue, user.id, sample_tree())
        .await
        .unwrap();
    wait_for_completion(repo.as_ref(), &first).await;
    let second = submit_import(Arc::clone(&repo), &queue, user.id, sample_tree())
        .await
        .unwrap();
    wait_for_completion(repo.as_ref(), &second).await;

    assert_ne!(first.id, second.id);

    // Imports are not idempotent: every submission lands in its own
    // account with its own copy of the data.
    let accounts = repo.find_accounts_for_user(user.id).await.unwrap();
    assert_eq!(accounts.len(), 2);
    for account in &accounts {
        let entries = repo
            .find_entries(EntryQuery {
                account_ids: Some(vec![account.id]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 5);
    }
}

#[tokio::test]
async fn progress_counters_are_monotonic() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 1);
    let user = repo.create_user("frank@example.com").await.unwrap();

    // A wide tree so the poller has a chance to observe several
    // intermediate snapshots.
    let children: Vec<ImportTreeNode> = (0..50)
        .map(|i| leaf(&format!("cat-{i}"), vec![event(1), event(2)], vec![]))
        .collect();
    let tree = ImportTreeNode {
        name: String::new(),
        events: vec![],
        ranges: vec![],
        children,
    };

    let job = submit_import(Arc::clone(&repo), &queue, user.id, tree)
        .await
        .unwrap();

    let mut last = (0u64, 0u64);
    loop {
        let snapshot = repo.fetch_import_job(job.id).await.unwrap();
        let now = (snapshot.imported_categories, snapshot.imported_entries);
        assert!(now.0 >= last.0, "category counter went backwards");
        assert!(now.1 >= last.1, "entry counter went backwards");
        assert!(now.0 <= snapshot.expected_categories);
        assert!(now.1 <= snapshot.expected_entries);
        last = now;
        if snapshot.complete {
            assert!(snapshot.success);
            assert_eq!(now.0, snapshot.expected_categories);
            assert_eq!(now.1, snapshot.expected_entries);
            break;
        }
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn direct_execution_without_queue() {
    let repo = LocalRepository::new();
    let user = repo.create_user("grace@example.com").await.unwrap();

    let tree = sample_tree();
    let counts = validate_tree(&tree).unwrap();
    let job = repo
        .create_import_job(time_backend::db::repository::NewImportJob {
            user_id: user.id,
            expected_categories: counts.categories,
            expected_entries: counts.entries(),
        })
        .await
        .unwrap();

    execute_import(&repo, job.id, user.id, tree).await;

    let done = repo.fetch_import_job(job.id).await.unwrap();
    assert!(done.complete);
    assert!(done.success);
    assert_eq!(done.imported_categories, 4);
    assert_eq!(done.imported_entries, 5);
}

#[tokio::test]
async fn concurrent_imports_do_not_cross_jobs() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let queue = ImportQueue::start(Arc::clone(&repo), 4);
    let user = repo.create_user("heidi@example.com").await.unwrap();

    let mut jobs = Vec::new();
    for _ in 0..4 {
        let job = submit_import(Arc::clone(&repo), &queue, user.id, sample_tree())
            .await
            .unwrap();
        jobs.push(job);
    }

    for job in &jobs {
        let done = wait_for_completion(repo.as_ref(), job).await;
        assert!(done.success);
        assert_eq!(done.imported_categories, 4);
        assert_eq!(done.imported_entries, 5);
    }

    let accounts = repo.find_accounts_for_user(user.id).await.unwrap();
    assert_eq!(accounts.len(), 4);
}
