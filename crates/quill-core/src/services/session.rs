use std::sync::Arc;

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{AuthError, IssuedSession, SessionTokenService, UserRepository};

/// Resolves who is behind a request.
///
/// Sessions are `Anonymous` until [`login`](Self::login) issues a token, and
/// fall back to `Anonymous` when the token is dropped, expires, fails
/// verification or names a deleted user. Store failures are returned.
#[derive(Clone)]
pub struct SessionManager {
    tokens: Arc<dyn SessionTokenService>,
    users: Arc<dyn UserRepository>,
}

impl SessionManager {
    pub fn new(tokens: Arc<dyn SessionTokenService>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    /// Establish a session for `user`. `remember` selects the long lifetime.
    pub fn login(&self, user: &User, remember: bool) -> Result<IssuedSession, DomainError> {
        let session = self.tokens.issue(user.id, remember)?;
        tracing::info!(user_id = %user.id, remember, "Session established");
        Ok(session)
    }

    /// The authenticated user for a presented token, if any.
    pub async fn current_identity(
        &self,
        token: Option<&str>,
    ) -> Result<Option<User>, DomainError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let claims = match self.tokens.validate(token) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => {
                tracing::debug!("Session token expired");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected session token");
                return Ok(None);
            }
        };

        let user = self.users.find_by_id(claims.user_id).await?;
        if user.is_none() {
            tracing::debug!(user_id = %claims.user_id, "Session user no longer exists");
        }
        Ok(user)
    }
}
