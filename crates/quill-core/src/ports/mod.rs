//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod media;
mod repository;

pub use auth::{AuthError, IssuedSession, PasswordService, SessionClaims, SessionTokenService};
pub use media::{AvatarStore, MediaError};
pub use repository::{BaseRepository, PostRepository, UserRepository};
