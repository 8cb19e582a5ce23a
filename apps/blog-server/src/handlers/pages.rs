//! Home feed and static pages.

use actix_web::{HttpResponse, web};
use quill_shared::dto::PageQuery;
use serde_json::json;

use crate::flash::IncomingFlashes;
use crate::middleware::auth::MaybeUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{ViewContext, page_response};

/// GET / and /home
pub async fn home(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    flashes: IncomingFlashes,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.posts.list_posts(query.page).await?;

    Ok(ViewContext::new(viewer.user(), flashes).ok(
        "home",
        "Home",
        json!({ "posts": page_response(page) }),
    ))
}

/// GET /about
pub async fn about(viewer: MaybeUser, flashes: IncomingFlashes) -> HttpResponse {
    ViewContext::new(viewer.user(), flashes).ok("about", "About", json!({}))
}
