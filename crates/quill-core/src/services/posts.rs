use std::sync::Arc;

use uuid::Uuid;

use crate::access::ensure_author;
use crate::domain::{Author, Page, PageRequest, Post, PostWithAuthor, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, UserRepository};

/// Title and body submitted through the post form.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

/// An author's profile header plus one page of their posts.
#[derive(Debug, Clone)]
pub struct AuthorFeed {
    pub author: Author,
    pub posts: Page<PostWithAuthor>,
}

/// Post lifecycle and listings.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    per_page: u64,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        per_page: u64,
    ) -> Self {
        Self {
            posts,
            users,
            per_page,
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub async fn create_post(&self, author: &User, draft: PostDraft) -> Result<Post, DomainError> {
        let post = Post::new(author.id, draft.title, draft.content);
        let saved = self.posts.insert(post).await?;
        tracing::info!(post_id = %saved.id, user_id = %author.id, "Post created");
        Ok(saved)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<PostWithAuthor>, DomainError> {
        Ok(self.posts.find_with_author(id).await?)
    }

    /// Load a post the actor is about to edit.
    pub async fn post_for_edit(&self, actor: &User, id: Uuid) -> Result<Post, DomainError> {
        let post = self.require(id).await?;
        ensure_author(&post, actor)?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        actor: &User,
        id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let mut post = self.post_for_edit(actor, id).await?;
        post.revise(draft.title, draft.content);

        let saved = self.posts.update(post).await.map_err(|e| missing_post(e, id))?;
        tracing::info!(post_id = %id, "Post updated");
        Ok(saved)
    }

    pub async fn delete_post(&self, actor: &User, id: Uuid) -> Result<(), DomainError> {
        let post = self.require(id).await?;
        ensure_author(&post, actor)?;

        self.posts.delete(id).await.map_err(|e| missing_post(e, id))?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Home feed, newest first. Out-of-range pages come back empty.
    pub async fn list_posts(&self, page: u64) -> Result<Page<PostWithAuthor>, DomainError> {
        let request = PageRequest::new(page, self.per_page);
        Ok(self.posts.list_recent(request).await?)
    }

    /// One author's posts, newest first. Unknown usernames are not found.
    pub async fn list_posts_by_author(
        &self,
        username: &str,
        page: u64,
    ) -> Result<AuthorFeed, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let request = PageRequest::new(page, self.per_page);
        let posts = self.posts.list_by_author(user.id, request).await?;

        Ok(AuthorFeed {
            author: user.into(),
            posts,
        })
    }

    async fn require(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }
}

fn missing_post(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found("post", id),
        other => other.into(),
    }
}
