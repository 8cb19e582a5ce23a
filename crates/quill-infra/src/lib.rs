//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory repositories only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - Argon2 password hashing + JWT session tokens
//! - `media` - Avatar thumbnailing and local file storage

pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "media")]
pub mod media;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository, connect};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtSessionConfig, JwtSessionService};

#[cfg(feature = "media")]
pub use media::{AvatarConfig, LocalAvatarStore};
