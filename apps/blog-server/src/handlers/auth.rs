//! Registration, login and logout.

use actix_web::{HttpRequest, HttpResponse, http::StatusCode, web};
use quill_core::{DomainError, FieldErrors};
use quill_core::access::safe_redirect_target;
use quill_core::services::NewAccount;
use quill_shared::FlashMessage;
use quill_shared::dto::{LoginForm, NextQuery, RegistrationForm};
use serde_json::json;

use crate::flash::{self, IncomingFlashes};
use crate::forms;
use crate::middleware::auth::{MaybeUser, logout_cookie, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::ViewContext;

pub const LOGIN_FAILED_MESSAGE: &str = "Login unsuccessful. Please check email and password";

/// GET /register
pub async fn register_form(
    req: HttpRequest,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
) -> HttpResponse {
    if viewer.is_authenticated() {
        return flash::redirect(&req, "/", None);
    }
    ViewContext::new(None, flashes).ok("register", "Register", RegistrationForm::default())
}

/// POST /register
pub async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    if viewer.is_authenticated() {
        return Ok(flash::redirect(&req, "/", None));
    }

    let form = form.into_inner().trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(ViewContext::new(None, flashes).invalid("register", "Register", form, errors));
    }

    let account = NewAccount {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
    };

    match state.accounts.register(account).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "Registration complete");
            Ok(flash::redirect(
                &req,
                "/login",
                Some(FlashMessage::success(
                    "Your account has been created! You are now able to log in",
                )),
            ))
        }
        Err(DomainError::Validation(errors)) => {
            Ok(ViewContext::new(None, flashes).invalid("register", "Register", form, errors))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /login
pub async fn login_form(
    req: HttpRequest,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
    query: web::Query<NextQuery>,
) -> HttpResponse {
    if viewer.is_authenticated() {
        return flash::redirect(&req, "/", None);
    }
    ViewContext::new(None, flashes).ok(
        "login",
        "Login",
        json!({ "form": LoginForm::default(), "next": query.next }),
    )
}

/// POST /login
///
/// On success the session cookie is set and the browser is sent to `next`
/// when it is a local path, otherwise home. Bad credentials re-render the
/// form with 401 without saying which half was wrong.
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    if viewer.is_authenticated() {
        return Ok(flash::redirect(&req, "/", None));
    }

    let NextQuery { next } = query.into_inner();
    let form = form.into_inner().trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(ViewContext::new(None, flashes).invalid(
            "login",
            "Login",
            json!({ "form": form, "next": next }),
            errors,
        ));
    }

    let Some(user) = state
        .accounts
        .authenticate(&form.email, &form.password)
        .await?
    else {
        tracing::info!("Rejected login attempt");
        return Ok(ViewContext::new(None, flashes)
            .flash_now(FlashMessage::danger(LOGIN_FAILED_MESSAGE))
            .render(
                StatusCode::UNAUTHORIZED,
                "login",
                "Login",
                json!({ "form": form, "next": next }),
                FieldErrors::new(),
            ));
    };

    let session = state.sessions.login(&user, form.remember)?;
    let target = next
        .as_deref()
        .and_then(safe_redirect_target)
        .unwrap_or("/");

    let mut res = flash::redirect(&req, target, None);
    res.add_cookie(&session_cookie(&session, state.cookie_secure))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(res)
}

/// GET /logout
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
    viewer: MaybeUser,
) -> AppResult<HttpResponse> {
    if let Some(user) = viewer.user() {
        tracing::info!(user_id = %user.id, "Logged out");
    }

    let mut res = flash::redirect(&req, "/", None);
    res.add_cookie(&logout_cookie(state.cookie_secure))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(res)
}
