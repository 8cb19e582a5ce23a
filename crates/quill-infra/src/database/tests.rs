use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use quill_core::domain::{PageRequest, Post, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

fn user_model(username: &str) -> user::Model {
    let now = Utc::now();
    user::Model {
        id: Uuid::now_v7(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password_hash: "$argon2id$stub".to_owned(),
        image_file: "default.jpg".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn post_model(user_id: Uuid, title: &str) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::now_v7(),
        user_id,
        title: title.to_owned(),
        content: "Content".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author = user_model("alice");
    let model = post_model(author.id, "Test Post");
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.user_id, author.id);
}

#[tokio::test]
async fn test_find_user_by_username() {
    let model = user_model("alice");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let found: User = repo.find_by_username("alice").await.unwrap().unwrap();

    assert_eq!(found.id, model.id);
    assert_eq!(found.email, "alice@example.com");
    assert_eq!(found.image_file, "default.jpg");
}

#[tokio::test]
async fn test_unknown_email_is_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_user_returns_stored_row() {
    let model = user_model("alice");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let saved = repo.insert(User::from(model.clone())).await.unwrap();

    assert_eq!(saved.id, model.id);
    assert_eq!(saved.username, "alice");
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::now_v7()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_update_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let ghost = Post::new(Uuid::now_v7(), "T".into(), "C".into());

    assert!(matches!(repo.update(ghost).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_list_recent_joins_authors() {
    let author = user_model("alice");
    let newer = post_model(author.id, "Newer");
    let older = post_model(author.id, "Older");

    let count_row = BTreeMap::from([("num_items", Value::BigInt(Some(7)))]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row]])
        .append_query_results(vec![vec![
            (newer.clone(), author.clone()),
            (older.clone(), author.clone()),
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo.list_recent(PageRequest::new(1, 5)).await.unwrap();

    assert_eq!(page.total, 7);
    assert_eq!(page.pages(), 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].post.title, "Newer");
    assert_eq!(page.items[0].author.username, "alice");
}
