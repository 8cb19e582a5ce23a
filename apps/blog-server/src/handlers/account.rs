//! Profile view and update.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use futures::StreamExt;
use quill_core::domain::User;
use quill_core::services::{AvatarUpload, ProfileUpdate};
use quill_core::{DomainError, FieldErrors};
use quill_shared::FlashMessage;
use quill_shared::dto::AccountForm;
use serde_json::json;

use crate::flash::{self, IncomingFlashes};
use crate::forms;
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{ViewContext, user_response};

/// Uploads larger than this are rejected before decoding.
const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Text fields are short; anything longer is not a browser form.
const MAX_TEXT_BYTES: usize = 4 * 1024;

fn account_view(
    ctx: ViewContext<'_>,
    user: &User,
    form: &AccountForm,
    errors: FieldErrors,
) -> HttpResponse {
    let data = json!({
        "form": form,
        "image_file": user.image_file,
        "profile": user_response(user),
    });
    if errors.is_empty() {
        ctx.ok("account", "Account", data)
    } else {
        ctx.invalid("account", "Account", data, errors)
    }
}

/// GET /account
pub async fn account_form(
    CurrentUser(user): CurrentUser,
    flashes: IncomingFlashes,
) -> HttpResponse {
    let form = AccountForm {
        username: user.username.clone(),
        email: user.email.clone(),
    };
    account_view(ViewContext::new(Some(&user), flashes), &user, &form, FieldErrors::new())
}

/// A parsed profile submission.
struct AccountSubmission {
    form: AccountForm,
    picture: Option<AvatarUpload>,
    errors: FieldErrors,
}

/// Read `username`, `email` and the optional `picture` part. Unknown parts
/// are drained and ignored.
async fn read_submission(mut payload: Multipart) -> Result<AccountSubmission, AppError> {
    let mut form = AccountForm::default();
    let mut picture = None;
    let mut errors = FieldErrors::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(e.to_string()))?;

        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };
        let limit = if name == "picture" {
            MAX_PICTURE_BYTES
        } else {
            MAX_TEXT_BYTES
        };

        let mut bytes = Vec::new();
        let mut oversized = false;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                oversized = true;
                continue;
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "username" | "email" if oversized => {
                return Err(AppError::BadRequest(format!("{} is too long", name)));
            }
            "username" => form.username = String::from_utf8_lossy(&bytes).into_owned(),
            "email" => form.email = String::from_utf8_lossy(&bytes).into_owned(),
            "picture" if oversized => {
                errors.add("picture", "File is too large.");
            }
            // No file chosen arrives as an empty part with an empty filename.
            "picture" => match file_name.filter(|f| !f.is_empty()) {
                Some(file_name) if !bytes.is_empty() => {
                    picture = Some(AvatarUpload { file_name, bytes });
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(AccountSubmission {
        form: form.trimmed(),
        picture,
        errors,
    })
}

/// POST /account (multipart)
pub async fn update_account(
    req: HttpRequest,
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: IncomingFlashes,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let AccountSubmission {
        form,
        picture,
        mut errors,
    } = read_submission(payload).await?;

    if let Err(form_errors) = forms::check(&form) {
        for (field, messages) in form_errors.iter() {
            for message in messages {
                errors.add(field, message.clone());
            }
        }
    }
    if !errors.is_empty() {
        return Ok(account_view(ViewContext::new(Some(&user), flashes), &user, &form, errors));
    }

    let update = ProfileUpdate {
        username: form.username.clone(),
        email: form.email.clone(),
        avatar: picture,
    };

    match state.accounts.update_profile(&user, update).await {
        Ok(_) => Ok(flash::redirect(
            &req,
            "/account",
            Some(FlashMessage::success("Your account has been updated!")),
        )),
        Err(DomainError::Validation(errors)) => {
            Ok(account_view(ViewContext::new(Some(&user), flashes), &user, &form, errors))
        }
        Err(e) => Err(e.into()),
    }
}
