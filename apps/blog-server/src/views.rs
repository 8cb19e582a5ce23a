//! View rendering.
//!
//! Pages are answered with a [`ViewResponse`] JSON document: the view name,
//! its data, the current user, pending flashes and inline form errors. A
//! template layer can render the same document into HTML.

use actix_web::{HttpResponse, http::StatusCode};
use quill_core::FieldErrors;
use quill_core::domain::{Page, PostWithAuthor, User};
use quill_shared::dto::{AuthorResponse, PageResponse, PostResponse, UserResponse};
use quill_shared::{FlashMessage, ViewResponse};
use serde::Serialize;

use crate::flash::{self, IncomingFlashes};

/// Everything a view needs besides its own data.
pub struct ViewContext<'a> {
    pub user: Option<&'a User>,
    pub flashes: IncomingFlashes,
}

impl<'a> ViewContext<'a> {
    pub fn new(user: Option<&'a User>, flashes: IncomingFlashes) -> Self {
        Self { user, flashes }
    }

    /// Show `message` on this page without a redirect.
    pub fn flash_now(mut self, message: FlashMessage) -> Self {
        self.flashes.0.push(message);
        self
    }

    pub fn ok<T: Serialize>(self, view: &str, title: &str, data: T) -> HttpResponse {
        self.render(StatusCode::OK, view, title, data, FieldErrors::new())
    }

    /// Re-render a rejected form.
    pub fn invalid<T: Serialize>(
        self,
        view: &str,
        title: &str,
        data: T,
        errors: FieldErrors,
    ) -> HttpResponse {
        self.render(StatusCode::UNPROCESSABLE_ENTITY, view, title, data, errors)
    }

    /// Build the view document and drain the flash cookie.
    pub fn render<T: Serialize>(
        self,
        status: StatusCode,
        view: &str,
        title: &str,
        data: T,
        errors: FieldErrors,
    ) -> HttpResponse {
        let had_cookie_flashes = !self.flashes.is_empty();

        let body = ViewResponse::new(view, data)
            .with_title(title)
            .with_current_user(self.user.map(user_response))
            .with_flashes(self.flashes.0)
            .with_errors(errors.into_inner());

        let mut res = HttpResponse::build(status);
        if had_cookie_flashes {
            res.cookie(flash::clear_cookie());
        }
        res.json(body)
    }
}

pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        image_file: user.image_file.clone(),
    }
}

pub fn post_response(entry: PostWithAuthor) -> PostResponse {
    let PostWithAuthor { post, author } = entry;
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        created_at: post.created_at,
        updated_at: post.updated_at,
        author: AuthorResponse {
            id: author.id,
            username: author.username,
            image_file: author.image_file,
        },
    }
}

pub fn page_response(page: Page<PostWithAuthor>) -> PageResponse<PostResponse> {
    let pages = page.pages();
    let prev_num = page.prev_num();
    let next_num = page.next_num();
    let iter_pages = page.iter_pages();
    let page = page.map(post_response);

    PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        pages,
        prev_num,
        next_num,
        iter_pages,
    }
}
