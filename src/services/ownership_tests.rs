use super::{authorize_category, authorize_entry, authorize_import, AuthError};
use crate::db::repository::{
    AccountRepository, CategoryRepository, EntryRepository, ImportRepository, NewCategory,
    NewImportJob, SessionRepository,
};
use crate::db::LocalRepository;
use crate::models::{Category, CategoryId, EntryId, ImportJobId, UserId};
use uuid::Uuid;

struct Fixture {
    repo: LocalRepository,
    owner: UserId,
    outsider: UserId,
    category: Category,
}

async fn fixture() -> Fixture {
    let repo = LocalRepository::new();
    let owner = repo.create_user("owner@example.com").await.unwrap().id;
    let outsider = repo.create_user("outsider@example.com").await.unwrap().id;
    let account = repo.create_account(owner).await.unwrap();
    let category = repo
        .create_category(NewCategory {
            name: "Work".into(),
            account_id: account.id,
            parent_id: None,
        })
        .await
        .unwrap();
    Fixture {
        repo,
        owner,
        outsider,
        category,
    }
}

#[tokio::test]
async fn member_is_authorized_for_category() {
    let f = fixture().await;
    let category = authorize_category(&f.repo, f.owner, f.category.id)
        .await
        .unwrap();
    assert_eq!(category.id, f.category.id);
}

#[tokio::test]
async fn non_member_gets_unauthorized_not_not_found() {
    let f = fixture().await;
    let err = authorize_category(&f.repo, f.outsider, f.category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn missing_category_is_not_found() {
    let f = fixture().await;
    let err = authorize_category(&f.repo, f.owner, CategoryId::new(9999))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn entry_resolution_returns_the_entry() {
    let f = fixture().await;
    let entry = f.repo.log_for(&f.category, None).await.unwrap();

    let resolved = authorize_entry(&f.repo, f.owner, entry.id).await.unwrap();
    assert_eq!(resolved.id, entry.id);
    assert_eq!(resolved.category_id, f.category.id);
}

#[tokio::test]
async fn foreign_entry_is_unauthorized() {
    let f = fixture().await;
    let entry = f.repo.log_for(&f.category, None).await.unwrap();

    let err = authorize_entry(&f.repo, f.outsider, entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn missing_entry_is_not_found() {
    let f = fixture().await;
    let err = authorize_entry(&f.repo, f.owner, EntryId::new(9999))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn store_refuses_dangling_category_references() {
    // The DataInconsistency path in authorize_entry exists for stores that
    // can hold dangling references; the local store refuses to create one
    // in the first place.
    let f = fixture().await;
    let entry = f.repo.log_for(&f.category, None).await.unwrap();

    let err = f
        .repo
        .update_entry(
            entry.id,
            crate::db::repository::EntryUpdate {
                category_id: Some(CategoryId::new(424242)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        crate::db::repository::RepositoryError::NotFound { .. }
    ));
}

#[tokio::test]
async fn import_job_ownership_is_enforced() {
    let f = fixture().await;
    let job = f
        .repo
        .create_import_job(NewImportJob {
            user_id: f.owner,
            expected_categories: 1,
            expected_entries: 0,
        })
        .await
        .unwrap();

    let fetched = authorize_import(&f.repo, f.owner, job.id).await.unwrap();
    assert_eq!(fetched.id, job.id);

    // Foreign jobs look exactly like missing ones.
    let err = authorize_import(&f.repo, f.outsider, job.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));

    let err = authorize_import(&f.repo, f.owner, ImportJobId(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}
