//! Credential and session-token implementations.

mod jwt;
mod password;

pub use jwt::{JwtSessionConfig, JwtSessionService};
pub use password::Argon2PasswordService;
