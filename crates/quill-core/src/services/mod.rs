//! Application services - the account, session and post rules, expressed
//! against the ports so any transport can drive them.

mod accounts;
mod posts;
mod session;

pub use accounts::{AccountService, AvatarUpload, NewAccount, ProfileUpdate};
pub use posts::{AuthorFeed, PostDraft, PostService};
pub use session::SessionManager;
