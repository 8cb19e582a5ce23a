//! Per-author listings.

use actix_web::{HttpResponse, web};
use quill_shared::dto::{AuthorResponse, PageQuery};
use serde_json::json;

use crate::flash::IncomingFlashes;
use crate::middleware::auth::MaybeUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{ViewContext, page_response};

/// GET /user/{username}
pub async fn user_posts(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state
        .posts
        .list_posts_by_author(&path.into_inner(), query.page)
        .await?;

    let title = format!("Posts by {}", feed.author.username);
    let author = AuthorResponse {
        id: feed.author.id,
        username: feed.author.username,
        image_file: feed.author.image_file,
    };

    Ok(ViewContext::new(viewer.user(), flashes).ok(
        "user_posts",
        &title,
        json!({ "author": author, "posts": page_response(feed.posts) }),
    ))
}
