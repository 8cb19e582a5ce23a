//! Error handling - RFC 7807 problem documents and the login redirect.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use quill_core::{DomainError, FieldErrors, RepoError};
use quill_shared::{ErrorResponse, FlashMessage};
use std::fmt;

use crate::flash;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// Application-level error type.
///
/// Form validation and bad credentials are normally answered by re-rendering
/// the form; they only reach this type when a handler has no form to show.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Validation(FieldErrors),
    Unauthorized,
    Forbidden,
    /// No session on a page that needs one; `next` is where to come back to.
    /// `pending` holds flashes the request still carried.
    LoginRequired {
        next: String,
        pending: Vec<FlashMessage>,
    },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::LoginRequired { next, .. } => write!(f, "Login required for {}", next),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl AppError {
    /// `/login?next=<target>`.
    fn login_location(next: &str) -> String {
        match serde_urlencoded::to_string([("next", next)]) {
            Ok(query) => format!("/login?{}", query),
            Err(_) => "/login".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::LoginRequired { next, pending } => {
                tracing::debug!(next = %next, "Redirecting anonymous request to login");
                let mut res = HttpResponse::Found();
                res.insert_header((header::LOCATION, Self::login_location(next)));
                let mut queued = pending.clone();
                queued.push(FlashMessage::info(LOGIN_REQUIRED_MESSAGE));
                if let Some(cookie) = flash::flash_cookie(&queued) {
                    res.cookie(cookie);
                }
                return res.finish();
            }
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(errors) => {
                ErrorResponse::new(422, "Validation Failed").with_detail(errors.to_string())
            }
            AppError::Unauthorized => ErrorResponse::new(401, "Unauthorized"),
            AppError::Forbidden => ErrorResponse::forbidden(),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} {} not found", entity_type, key))
            }
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::InvalidCredentials => AppError::Unauthorized,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        DomainError::from(err).into()
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
