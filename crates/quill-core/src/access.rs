//! Authorization rules shared by every transport.

use crate::domain::{Post, User};
use crate::error::DomainError;

/// Only the author may change or remove a post.
pub fn ensure_author(post: &Post, actor: &User) -> Result<(), DomainError> {
    if post.is_authored_by(actor.id) {
        Ok(())
    } else {
        tracing::warn!(post_id = %post.id, actor_id = %actor.id, "Ownership check failed");
        Err(DomainError::Forbidden)
    }
}

/// Accept a post-login redirect target only when it is a same-origin
/// relative path.
pub fn safe_redirect_target(next: &str) -> Option<&str> {
    let is_local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control);

    is_local.then_some(next)
}
