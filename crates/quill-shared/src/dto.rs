//! Data Transfer Objects - submitted forms and the public shapes rendered
//! into views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegistrationForm {
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,

    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Field cannot be longer than 120 characters.")
    )]
    pub email: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    #[serde(skip_serializing)]
    #[validate(must_match(other = "password", message = "Field must be equal to password."))]
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn trimmed(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    #[serde(default, deserialize_with = "checkbox")]
    pub remember: bool,
}

impl LoginForm {
    pub fn trimmed(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

/// Profile form. The picture travels as a separate multipart part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AccountForm {
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,

    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Field cannot be longer than 120 characters.")
    )]
    pub email: String,
}

impl AccountForm {
    pub fn trimmed(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

/// New or edited post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters long."))]
    pub title: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub content: String,
}

impl PostForm {
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self
    }
}

/// HTML checkboxes send a value only when ticked.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(
        value.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("y" | "yes" | "on" | "true" | "1")
    ))
}

/// `?page=` query for paginated views.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u64,
}

fn first_page() -> u64 {
    1
}

/// `?next=` query carried through the login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// A user's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub image_file: String,
}

/// Author attribution on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
    pub image_file: String,
}

/// A post with its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: AuthorResponse,
}

/// One page of a listing plus navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
    pub prev_num: Option<u64>,
    pub next_num: Option<u64>,
    /// Page numbers for links; `null` marks a gap.
    pub iter_pages: Vec<Option<u64>>,
}
