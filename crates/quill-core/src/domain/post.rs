use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Author;

/// Post entity - a blog post owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. Ids are time-ordered so insertion order survives
    /// equal timestamps.
    pub fn new(user_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Replace title and content. The author never changes.
    pub fn revise(&mut self, title: String, content: String) {
        self.title = title;
        self.content = content;
        self.updated_at = Utc::now();
    }
}

/// A post joined with its author, as listed on the feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Author,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revise_keeps_author_and_creation_time() {
        let author = Uuid::new_v4();
        let mut post = Post::new(author, "Title".into(), "Body".into());
        let created = post.created_at;

        post.revise("New title".into(), "New body".into());

        assert_eq!(post.user_id, author);
        assert_eq!(post.created_at, created);
        assert_eq!(post.title, "New title");
        assert!(post.updated_at >= created);
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let author = Uuid::new_v4();
        let first = Post::new(author, "a".into(), "a".into());
        let second = Post::new(author, "b".into(), "b".into());
        assert!(second.id > first.id);
    }
}
