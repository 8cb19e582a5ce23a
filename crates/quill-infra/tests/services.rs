//! Account, session and post rules exercised against the in-memory stores.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use uuid::Uuid;

use quill_core::domain::{DEFAULT_IMAGE_FILE, User};
use quill_core::error::{DomainError, RepoError};
use quill_core::ports::{BaseRepository, SessionTokenService, UserRepository};
use quill_core::services::{
    AccountService, AvatarUpload, NewAccount, PostDraft, PostService, ProfileUpdate,
    SessionManager,
};
use quill_infra::{
    Argon2PasswordService, AvatarConfig, InMemoryPostRepository, InMemoryUserRepository,
    JwtSessionConfig, JwtSessionService, LocalAvatarStore,
};

struct Harness {
    users: Arc<InMemoryUserRepository>,
    tokens: Arc<JwtSessionService>,
    accounts: AccountService,
    posts: PostService,
    sessions: SessionManager,
    avatar_dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let users = Arc::new(InMemoryUserRepository::new());
    let posts = Arc::new(InMemoryPostRepository::new(users.clone()));
    let passwords = Arc::new(Argon2PasswordService::with_cost(1024, 1, 1).unwrap());
    let tokens = Arc::new(JwtSessionService::new(JwtSessionConfig {
        secret: "services-test".into(),
        ..JwtSessionConfig::default()
    }));
    let avatar_dir = tempfile::tempdir().unwrap();
    let avatars = Arc::new(LocalAvatarStore::new(AvatarConfig {
        dir: avatar_dir.path().to_path_buf(),
        size: 125,
    }));

    Harness {
        accounts: AccountService::new(users.clone(), passwords, avatars),
        posts: PostService::new(posts, users.clone(), 5),
        sessions: SessionManager::new(tokens.clone(), users.clone()),
        users,
        tokens,
        avatar_dir,
    }
}

fn account(username: &str, email: &str, password: &str) -> NewAccount {
    NewAccount {
        username: username.into(),
        email: email.into(),
        password: password.into(),
    }
}

fn draft(title: &str) -> PostDraft {
    PostDraft {
        title: title.into(),
        content: format!("{title} body"),
    }
}

fn jpeg_upload() -> AvatarUpload {
    let img = ImageBuffer::from_pixel(300, 300, Rgb([10u8, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    AvatarUpload {
        file_name: "portrait.jpg".into(),
        bytes: out.into_inner(),
    }
}

fn field_errors(err: DomainError) -> quill_core::FieldErrors {
    match err {
        DomainError::Validation(fields) => fields,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let h = harness();
    h.accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let err = h
        .accounts
        .register(account("alice", "b@x.com", "pw2"))
        .await
        .unwrap_err();

    let fields = field_errors(err);
    assert!(fields.contains("username"));
    assert!(!fields.contains("email"));
    assert_eq!(h.users.len().await, 1);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let h = harness();
    h.accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let err = h
        .accounts
        .register(account("alicia", "a@x.com", "pw2"))
        .await
        .unwrap_err();

    assert!(field_errors(err).contains("email"));
    assert_eq!(h.users.len().await, 1);
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let h = harness();
    let user = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    assert_ne!(user.password_hash, "pw1");
    assert!(user.password_hash.starts_with("$argon2"));
    assert_eq!(user.image_file, DEFAULT_IMAGE_FILE);
}

/// Hides existing rows from the pre-check, as a concurrent registration would.
struct RacingUsers(Arc<InMemoryUserRepository>);

#[async_trait]
impl BaseRepository<User, Uuid> for RacingUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        self.0.find_by_id(id).await
    }
    async fn insert(&self, user: User) -> Result<User, RepoError> {
        self.0.insert(user).await
    }
    async fn update(&self, user: User) -> Result<User, RepoError> {
        self.0.update(user).await
    }
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.0.delete(id).await
    }
}

#[async_trait]
impl UserRepository for RacingUsers {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
        Ok(None)
    }
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, RepoError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_constraint_violation_becomes_validation_error() {
    let h = harness();
    h.accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let racing = AccountService::new(
        Arc::new(RacingUsers(h.users.clone())),
        Arc::new(Argon2PasswordService::with_cost(1024, 1, 1).unwrap()),
        Arc::new(LocalAvatarStore::new(AvatarConfig::default())),
    );

    let err = racing
        .register(account("alice", "other@x.com", "pw"))
        .await
        .unwrap_err();

    assert!(field_errors(err).contains("username"));
    assert_eq!(h.users.len().await, 1);
}

#[tokio::test]
async fn test_authenticate_checks_password() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let ok = h.accounts.authenticate("a@x.com", "pw1").await.unwrap();
    assert_eq!(ok.map(|u| u.id), Some(alice.id));

    assert!(h.accounts.authenticate("a@x.com", "nope").await.unwrap().is_none());
    assert!(h.accounts.authenticate("ghost@x.com", "pw1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_resolves_logged_in_user() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let session = h.sessions.login(&alice, false).unwrap();
    let current = h.sessions.current_identity(Some(&session.token)).await.unwrap();
    assert_eq!(current.map(|u| u.id), Some(alice.id));
}

/// A user store that is down.
struct UnreachableUsers;

#[async_trait]
impl BaseRepository<User, Uuid> for UnreachableUsers {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
        Err(RepoError::Connection("connection refused".into()))
    }
    async fn insert(&self, _user: User) -> Result<User, RepoError> {
        Err(RepoError::Connection("connection refused".into()))
    }
    async fn update(&self, _user: User) -> Result<User, RepoError> {
        Err(RepoError::Connection("connection refused".into()))
    }
    async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
        Err(RepoError::Connection("connection refused".into()))
    }
}

#[async_trait]
impl UserRepository for UnreachableUsers {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
        Err(RepoError::Connection("connection refused".into()))
    }
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, RepoError> {
        Err(RepoError::Connection("connection refused".into()))
    }
}

#[tokio::test]
async fn test_session_store_failure_is_surfaced() {
    let h = harness();
    let sessions = SessionManager::new(h.tokens.clone(), Arc::new(UnreachableUsers));
    let session = h.tokens.issue(Uuid::now_v7(), false).unwrap();

    let err = sessions
        .current_identity(Some(&session.token))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Internal(_)));

    // No token means no lookup, so an outage cannot turn it into an error.
    assert!(sessions.current_identity(None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_sessions_degrade_to_anonymous() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    assert!(h.sessions.current_identity(Some("garbage")).await.unwrap().is_none());

    let foreign = JwtSessionService::new(JwtSessionConfig {
        secret: "someone-else".into(),
        ..JwtSessionConfig::default()
    })
    .issue(alice.id, false)
    .unwrap();
    assert!(h.sessions.current_identity(Some(&foreign.token)).await.unwrap().is_none());

    let orphan = h.tokens.issue(Uuid::now_v7(), false).unwrap();
    assert!(h.sessions.current_identity(Some(&orphan.token)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_only_author_may_update_or_delete() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    let bob = h
        .accounts
        .register(account("bob", "b@x.com", "pw2"))
        .await
        .unwrap();

    let post = h.posts.create_post(&alice, draft("T")).await.unwrap();
    assert_eq!(post.user_id, alice.id);

    assert!(matches!(
        h.posts.update_post(&bob, post.id, draft("Hijack")).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        h.posts.delete_post(&bob, post.id).await,
        Err(DomainError::Forbidden)
    ));

    let updated = h.posts.update_post(&alice, post.id, draft("T2")).await.unwrap();
    assert_eq!(updated.title, "T2");
    assert_eq!(updated.user_id, alice.id);

    h.posts.delete_post(&alice, post.id).await.unwrap();
    assert!(h.posts.get_post(post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_post_is_not_found() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let missing = Uuid::now_v7();
    assert!(matches!(
        h.posts.update_post(&alice, missing, draft("x")).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        h.posts.delete_post(&alice, missing).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_author_feed_pages_newest_first() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    let bob = h
        .accounts
        .register(account("bob", "b@x.com", "pw2"))
        .await
        .unwrap();

    for i in 0..12 {
        h.posts
            .create_post(&alice, draft(&format!("post {i}")))
            .await
            .unwrap();
    }
    h.posts.create_post(&bob, draft("bob's")).await.unwrap();

    let mut sizes = Vec::new();
    let mut titles = Vec::new();
    for page in 1..=3 {
        let feed = h.posts.list_posts_by_author("alice", page).await.unwrap();
        assert_eq!(feed.author.username, "alice");
        assert_eq!(feed.posts.total, 12);
        sizes.push(feed.posts.items.len());
        titles.extend(feed.posts.items.into_iter().map(|p| p.post.title));
    }

    assert_eq!(sizes, vec![5, 5, 2]);
    assert_eq!(titles.first().map(String::as_str), Some("post 11"));
    assert_eq!(titles.last().map(String::as_str), Some("post 0"));

    let beyond = h.posts.list_posts_by_author("alice", 4).await.unwrap();
    assert!(beyond.posts.items.is_empty());

    let home = h.posts.list_posts(1).await.unwrap();
    assert_eq!(home.total, 13);
    assert_eq!(home.items[0].post.title, "bob's");
}

#[tokio::test]
async fn test_unknown_author_feed_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.posts.list_posts_by_author("nobody", 1).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_profile_update_uniqueness_excludes_self() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    h.accounts
        .register(account("bob", "b@x.com", "pw2"))
        .await
        .unwrap();

    let same = h
        .accounts
        .update_profile(
            &alice,
            ProfileUpdate {
                username: "alice".into(),
                email: "a@x.com".into(),
                avatar: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(same.username, "alice");

    let err = h
        .accounts
        .update_profile(
            &alice,
            ProfileUpdate {
                username: "bob".into(),
                email: "b@x.com".into(),
                avatar: None,
            },
        )
        .await
        .unwrap_err();
    let fields = field_errors(err);
    assert!(fields.contains("username"));
    assert!(fields.contains("email"));

    let renamed = h
        .accounts
        .update_profile(
            &alice,
            ProfileUpdate {
                username: "alice2".into(),
                email: "a2@x.com".into(),
                avatar: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.username, "alice2");
    assert!(h.users.find_by_username("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_avatar_replacement_removes_previous_file() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let with_avatar = |user: &User| ProfileUpdate {
        username: user.username.clone(),
        email: user.email.clone(),
        avatar: Some(jpeg_upload()),
    };

    let first = h
        .accounts
        .update_profile(&alice, with_avatar(&alice))
        .await
        .unwrap();
    assert_ne!(first.image_file, DEFAULT_IMAGE_FILE);
    assert!(h.avatar_dir.path().join(&first.image_file).exists());

    let second = h
        .accounts
        .update_profile(&first, with_avatar(&first))
        .await
        .unwrap();
    assert!(h.avatar_dir.path().join(&second.image_file).exists());
    assert!(!h.avatar_dir.path().join(&first.image_file).exists());
}

#[tokio::test]
async fn test_rejected_avatar_type_is_field_error() {
    let h = harness();
    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let err = h
        .accounts
        .update_profile(
            &alice,
            ProfileUpdate {
                username: "alice".into(),
                email: "a@x.com".into(),
                avatar: Some(AvatarUpload {
                    file_name: "anim.gif".into(),
                    bytes: vec![0; 16],
                }),
            },
        )
        .await
        .unwrap_err();

    assert!(field_errors(err).contains("picture"));
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let h = harness();

    let alice = h
        .accounts
        .register(account("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    assert!(matches!(
        h.accounts.register(account("alice", "b@x.com", "pw2")).await,
        Err(DomainError::Validation(_))
    ));
    let bob = h
        .accounts
        .register(account("bob", "b@x.com", "pw2"))
        .await
        .unwrap();

    let logged_in = h
        .accounts
        .authenticate("a@x.com", "pw1")
        .await
        .unwrap()
        .unwrap();
    let session = h.sessions.login(&logged_in, true).unwrap();
    let current = h
        .sessions
        .current_identity(Some(&session.token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.username, "alice");

    let post = h
        .posts
        .create_post(&current, PostDraft {
            title: "T".into(),
            content: "C".into(),
        })
        .await
        .unwrap();
    let shown = h.posts.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(shown.author.id, alice.id);

    assert!(matches!(
        h.posts.delete_post(&bob, post.id).await,
        Err(DomainError::Forbidden)
    ));
}
