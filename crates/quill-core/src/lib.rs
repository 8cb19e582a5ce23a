//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! Entities, the ports infrastructure must implement, and the services that
//! carry the account, session and post-ownership rules. No infrastructure
//! dependencies live here.

pub mod access;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldErrors, RepoError};
