//! In-memory repositories - used when no database is configured, and in tests.
//!
//! Uniqueness and foreign keys are enforced the way the real schema does, so
//! the services see the same errors. Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Author, Page, PageRequest, Post, PostWithAuthor, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

use super::mask_email;

/// In-memory user store with `UNIQUE(username)` and `UNIQUE(email)`.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    async fn authors(&self) -> HashMap<Uuid, Author> {
        self.users
            .read()
            .await
            .values()
            .map(|u| (u.id, Author::from(u)))
            .collect()
    }

    fn check_unique(users: &HashMap<Uuid, User>, candidate: &User) -> Result<(), RepoError> {
        for other in users.values().filter(|u| u.id != candidate.id) {
            if other.username == candidate.username {
                return Err(RepoError::Constraint("users.username".to_string()));
            }
            if other.email == candidate.email {
                return Err(RepoError::Constraint("users.email".to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        // one write lock spans check and insert
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users.id".to_string()));
        }
        Self::check_unique(&users, &user)?;

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        Self::check_unique(&users, &user)?;

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

/// In-memory post store. Authors are resolved against the shared user store.
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryPostRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            users,
        }
    }

    async fn page_where(
        &self,
        request: PageRequest,
        keep: impl Fn(&Post) -> bool,
    ) -> Result<Page<PostWithAuthor>, RepoError> {
        let authors = self.users.authors().await;

        let mut matching: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| keep(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let rows = matching
            .into_iter()
            .map(|post| with_author(post, &authors))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::from_ordered(rows, request))
    }
}

fn with_author(post: Post, authors: &HashMap<Uuid, Author>) -> Result<PostWithAuthor, RepoError> {
    let author = authors
        .get(&post.user_id)
        .cloned()
        .ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;

    Ok(PostWithAuthor { post, author })
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        if self.users.find_by_id(post.user_id).await?.is_none() {
            return Err(RepoError::Constraint("posts.user_id".to_string()));
        }

        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts.id".to_string()));
        }

        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let existing = posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        *existing = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let Some(post) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let authors = self.users.authors().await;

        with_author(post, &authors).map(Some)
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Page<PostWithAuthor>, RepoError> {
        self.page_where(page, |_| true).await
    }

    async fn list_by_author(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<PostWithAuthor>, RepoError> {
        self.page_where(page, |p| p.user_id == user_id).await
    }
}
