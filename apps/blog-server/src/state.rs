//! Application state - shared across all handlers.

use std::io;
use std::sync::Arc;

use quill_core::ports::{
    AvatarStore, PasswordService, PostRepository, SessionTokenService, UserRepository,
};
use quill_core::services::{AccountService, PostService, SessionManager};
use quill_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtSessionService,
    LocalAvatarStore,
};

use crate::config::AppConfig;

/// Shared application state. Everything in here is stateless or internally
/// synchronised, so clones are cheap handles onto the same services.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub sessions: Arc<SessionManager>,
    pub cookie_secure: bool,
}

/// The storage pair every service is built on.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new(users.clone()));
        Self { users, posts }
    }
}

impl AppState {
    /// Build the application state, connecting to PostgreSQL when configured.
    /// A configured database that cannot be reached is an error.
    pub async fn new(config: &AppConfig) -> io::Result<Self> {
        let repos = Self::repositories(config).await?;
        Ok(Self::with_repositories(config, repos))
    }

    /// Wire services over the given repositories.
    pub fn with_repositories(config: &AppConfig, repos: Repositories) -> Self {
        let tokens: Arc<dyn SessionTokenService> =
            Arc::new(JwtSessionService::new(config.session.clone()));
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        Self::assemble(config, repos, tokens, passwords)
    }

    /// Like [`with_repositories`](Self::with_repositories) with a caller-chosen
    /// password hasher, e.g. a cheap one in tests.
    pub fn assemble(
        config: &AppConfig,
        repos: Repositories,
        tokens: Arc<dyn SessionTokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        let avatars: Arc<dyn AvatarStore> = Arc::new(LocalAvatarStore::new(config.avatar.clone()));

        let accounts = AccountService::new(repos.users.clone(), passwords, avatars);
        let posts = PostService::new(repos.posts, repos.users.clone(), config.posts_per_page);
        let sessions = SessionManager::new(tokens, repos.users);

        tracing::info!(per_page = config.posts_per_page, "Application state initialized");

        Self {
            accounts: Arc::new(accounts),
            posts: Arc::new(posts),
            sessions: Arc::new(sessions),
            cookie_secure: config.cookie_secure,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> io::Result<Repositories> {
        use quill_infra::{PostgresPostRepository, PostgresUserRepository};

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Ok(Repositories::in_memory());
        };

        let conn = quill_infra::connect(db_config).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            io::Error::other(format!("database connection failed: {}", e))
        })?;

        Ok(Repositories {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn)),
        })
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(config: &AppConfig) -> io::Result<Repositories> {
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
        }
        tracing::info!("Running without postgres feature - using in-memory repositories");
        Ok(Repositories::in_memory())
    }
}
