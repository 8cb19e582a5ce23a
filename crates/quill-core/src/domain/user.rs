use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Avatar every account starts with.
pub const DEFAULT_IMAGE_FILE: &str = "default.jpg";

/// User entity - a registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub image_file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID, timestamps and the default avatar.
    ///
    /// `password_hash` must come from a [`PasswordService`](crate::ports::PasswordService).
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username,
            email,
            password_hash,
            image_file: DEFAULT_IMAGE_FILE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_default_image(&self) -> bool {
        self.image_file == DEFAULT_IMAGE_FILE
    }
}

/// Public attribution shown next to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub image_file: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            image_file: user.image_file.clone(),
        }
    }
}

impl From<User> for Author {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            image_file: user.image_file,
        }
    }
}
