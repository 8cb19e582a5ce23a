//! Post pages: create, show, edit and delete.

use actix_web::{HttpRequest, HttpResponse, web};
use quill_core::services::PostDraft;
use quill_shared::FlashMessage;
use quill_shared::dto::PostForm;
use serde_json::json;
use uuid::Uuid;

use crate::flash::{self, IncomingFlashes};
use crate::forms;
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{ViewContext, post_response};

const NEW_POST: &str = "New Post";
const UPDATE_POST: &str = "Update Post";

fn draft(form: &PostForm) -> PostDraft {
    PostDraft {
        title: form.title.clone(),
        content: form.content.clone(),
    }
}

/// GET /post/new
pub async fn new_post_form(
    CurrentUser(user): CurrentUser,
    flashes: IncomingFlashes,
) -> HttpResponse {
    ViewContext::new(Some(&user), flashes).ok(
        "create_post",
        NEW_POST,
        json!({ "form": PostForm::default(), "legend": NEW_POST }),
    )
}

/// POST /post/new
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: IncomingFlashes,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner().trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(ViewContext::new(Some(&user), flashes).invalid(
            "create_post",
            NEW_POST,
            json!({ "form": form, "legend": NEW_POST }),
            errors,
        ));
    }

    state.posts.create_post(&user, draft(&form)).await?;

    Ok(flash::redirect(
        &req,
        "/",
        Some(FlashMessage::success("Your post has been created!")),
    ))
}

/// GET /post/{id}
pub async fn show_post(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let entry = state
        .posts
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))?;

    let is_author = viewer.user().is_some_and(|u| entry.post.is_authored_by(u.id));
    let title = entry.post.title.clone();

    Ok(ViewContext::new(viewer.user(), flashes).ok(
        "post",
        &title,
        json!({ "post": post_response(entry), "can_edit": is_author }),
    ))
}

/// GET /post/{id}/update
pub async fn edit_post_form(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: IncomingFlashes,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.post_for_edit(&user, path.into_inner()).await?;
    let form = PostForm {
        title: post.title,
        content: post.content,
    };

    Ok(ViewContext::new(Some(&user), flashes).ok(
        "create_post",
        UPDATE_POST,
        json!({ "form": form, "legend": UPDATE_POST, "post_id": post.id }),
    ))
}

/// POST /post/{id}/update
///
/// Ownership is checked before the form, so a non-author learns nothing
/// from validation messages.
pub async fn update_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: IncomingFlashes,
    path: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.post_for_edit(&user, id).await?;

    let form = form.into_inner().trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(ViewContext::new(Some(&user), flashes).invalid(
            "create_post",
            UPDATE_POST,
            json!({ "form": form, "legend": UPDATE_POST, "post_id": id }),
            errors,
        ));
    }

    state.posts.update_post(&user, id, draft(&form)).await?;

    Ok(flash::redirect(
        &req,
        &format!("/post/{}", id),
        Some(FlashMessage::success("Your post has been updated!")),
    ))
}

/// POST /post/{id}/delete
pub async fn delete_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.posts.delete_post(&user, path.into_inner()).await?;

    Ok(flash::redirect(
        &req,
        "/",
        Some(FlashMessage::success("Your post has been deleted!")),
    ))
}
