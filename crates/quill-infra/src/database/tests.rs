use std::collections::BTreeMap;

use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use quill_core::domain::{BlogPost, PageRequest};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, BlogRepository, UserRepository};

use crate::database::entity::{blog, user};
use crate::database::postgres_base::map_db_err;
use crate::database::postgres_repo::{PostgresBlogRepository, PostgresUserRepository};

fn blog_model(owner_id: Uuid, title: &str) -> blog::Model {
    let now = chrono::Utc::now();
    blog::Model {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_owned(),
        content: "Content".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn user_model(name: &str, email: &str) -> user::Model {
    let now = chrono::Utc::now();
    user::Model {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        email: email.to_owned(),
        password_hash: "hash".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_blog_by_id() {
    let model = blog_model(Uuid::new_v4(), "Test Post");
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();

    let repo = PostgresBlogRepository::new(db);

    let result: Option<BlogPost> = repo.find_by_id(post_id).await.unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
}

#[tokio::test]
async fn test_find_user_by_email() {
    let model = user_model("Alice", "a@x.com");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let found = repo.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, model.id);
    assert_eq!(found.name, "Alice");
}

#[test]
fn test_missing_row_on_update_maps_to_not_found() {
    assert!(matches!(map_db_err(DbErr::RecordNotUpdated), RepoError::NotFound));
    assert!(matches!(
        map_db_err(DbErr::Custom("boom".to_owned())),
        RepoError::Query(_)
    ));
}

#[tokio::test]
async fn test_delete_missing_blog_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresBlogRepository::new(db);

    let result: Result<(), RepoError> =
        BaseRepository::<BlogPost, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_page_reports_totals() {
    let owner = Uuid::new_v4();
    let count_row = BTreeMap::from([("num_items", Value::from(12i64))]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row]])
        .append_query_results(vec![vec![
            blog_model(owner, "eleven"),
            blog_model(owner, "twelve"),
        ]])
        .into_connection();

    let repo = PostgresBlogRepository::new(db);

    let page = repo
        .find_page(Some(owner), PageRequest::new(2))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page, 2);
    assert_eq!(page.total_items, 12);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn test_find_page_beyond_last_page_is_empty() {
    let count_row = BTreeMap::from([("num_items", Value::from(3i64))]);

    // Only the count query has a result: fetching rows would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row]])
        .into_connection();

    let repo = PostgresBlogRepository::new(db);

    let page = repo
        .find_page(None, PageRequest::new(u64::MAX))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.page, u64::MAX);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn test_names_by_ids_without_ids_skips_query() {
    // No results appended: any query would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresUserRepository::new(db);

    assert!(repo.names_by_ids(&[]).await.unwrap().is_empty());
}
