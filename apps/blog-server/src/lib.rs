//! # Quill Blog Server
//!
//! Actix-web application: accounts, cookie sessions and posts.

pub mod config;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
pub mod views;

pub use config::AppConfig;
pub use state::AppState;
