//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use quill_infra::{AvatarConfig, DatabaseConfig, JwtSessionConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on in-memory repositories.
    pub database: Option<DatabaseConfig>,
    pub session: JwtSessionConfig,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    pub cookie_secure: bool,
    pub avatar: AvatarConfig,
    pub posts_per_page: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            session: JwtSessionConfig::default(),
            cookie_secure: false,
            avatar: AvatarConfig::default(),
            posts_per_page: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut db = DatabaseConfig::new(url);
            db.max_connections = parsed("DB_MAX_CONNECTIONS").unwrap_or(db.max_connections);
            db.min_connections = parsed("DB_MIN_CONNECTIONS").unwrap_or(db.min_connections);
            db
        });

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            database,
            session: JwtSessionConfig::from_env(),
            cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.cookie_secure),
            avatar: AvatarConfig::from_env(),
            posts_per_page: parsed("POSTS_PER_PAGE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.posts_per_page),
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
