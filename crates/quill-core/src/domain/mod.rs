//! Domain entities - the core business objects.

mod page;
mod post;
mod user;

pub use page::{Page, PageRequest};
pub use post::{Post, PostWithAuthor};
pub use user::{Author, DEFAULT_IMAGE_FILE, User};
