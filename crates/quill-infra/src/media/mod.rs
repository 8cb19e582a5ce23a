//! Uploaded media handling.

mod avatar;

pub use avatar::{AvatarConfig, LocalAvatarStore, allowed_extension};
