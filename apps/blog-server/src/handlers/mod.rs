//! HTTP handlers and route configuration.

mod account;
mod auth;
mod pages;
mod posts;
mod users;

use actix_web::web;

/// URL-encoded form bodies up to this size are accepted. Post content is the
/// only long field.
pub const MAX_FORM_BYTES: usize = 1024 * 1024;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(MAX_FORM_BYTES))
        .route("/", web::get().to(pages::home))
        .route("/home", web::get().to(pages::home))
        .route("/about", web::get().to(pages::about))
        // Accounts
        .service(
            web::resource("/register")
                .route(web::get().to(auth::register_form))
                .route(web::post().to(auth::register)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .route("/logout", web::get().to(auth::logout))
        .service(
            web::resource("/account")
                .route(web::get().to(account::account_form))
                .route(web::post().to(account::update_account)),
        )
        // Posts
        .service(
            web::resource("/post/new")
                .route(web::get().to(posts::new_post_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/post/{id}", web::get().to(posts::show_post))
        .service(
            web::resource("/post/{id}/update")
                .route(web::get().to(posts::edit_post_form))
                .route(web::post().to(posts::update_post)),
        )
        .route("/post/{id}/delete", web::post().to(posts::delete_post))
        .route("/user/{username}", web::get().to(users::user_posts));
}
