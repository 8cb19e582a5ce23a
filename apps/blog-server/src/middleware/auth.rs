//! Session cookie handling and identity extractors.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use chrono::Utc;
use futures::future::LocalBoxFuture;

use quill_core::domain::User;
use quill_core::ports::IssuedSession;

use crate::flash::IncomingFlashes;
use crate::middleware::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Cookie carrying a freshly issued session token. Remembered sessions get a
/// `Max-Age`; others end with the browser session.
pub fn session_cookie(session: &IssuedSession, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();

    if session.remember {
        let remaining = (session.expires_at - Utc::now()).num_seconds().max(0);
        cookie.set_max_age(Duration::seconds(remaining));
    }

    cookie
}

/// Expires the session cookie.
pub fn logout_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();
    cookie.make_removal();
    cookie
}

/// Identity resolved once per request and shared by every extractor.
#[derive(Clone)]
struct ResolvedUser(Option<User>);

/// The user behind the request's session cookie, if any. A failing user
/// store is an error, not an anonymous request.
pub async fn resolve_user(req: &HttpRequest) -> Result<Option<User>, AppError> {
    let cached = req.extensions().get::<ResolvedUser>().cloned();
    if let Some(ResolvedUser(user)) = cached {
        return Ok(user);
    }

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("AppState not found in app data".into()))?;

    let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
    let user = state
        .sessions
        .current_identity(token.as_deref().filter(|t| !t.is_empty()))
        .await?;

    req.extensions_mut().insert(ResolvedUser(user.clone()));
    Ok(user)
}

/// Path and query of the request, used as the post-login target.
fn original_target(req: &HttpRequest) -> String {
    let uri = req.uri();
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Requires a logged-in user. Anonymous requests are redirected to the login
/// page with `next` pointing back here.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match resolve_user(&req).await? {
                Some(user) => Ok(CurrentUser(user)),
                None => Err(AppError::LoginRequired {
                    next: original_target(&req),
                    pending: IncomingFlashes::read(&req).0,
                }),
            }
        })
    }
}

/// Optional identity. Fails only when the user store does.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(MaybeUser(resolve_user(&req).await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn issued(remember: bool) -> IssuedSession {
        IssuedSession {
            token: "tok".into(),
            remember,
            expires_at: Utc::now() + TimeDelta::days(365),
        }
    }

    #[test]
    fn test_plain_session_is_browser_scoped() {
        let cookie = session_cookie(&issued(false), false);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn test_remembered_session_persists() {
        let cookie = session_cookie(&issued(true), true);

        assert_eq!(cookie.secure(), Some(true));
        let max_age = cookie.max_age().unwrap();
        assert!(max_age > Duration::days(364));
    }

    #[test]
    fn test_logout_cookie_expires() {
        let cookie = logout_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
