//! One-shot flash messages carried between a redirect and the next page.
//!
//! Pending messages ride in the `flash` cookie as hex-encoded JSON. Redirects
//! append to whatever is still pending; rendering a view drains them.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header};
use quill_shared::FlashMessage;
use std::convert::Infallible;
use std::future::{Ready, ready};

pub const FLASH_COOKIE: &str = "flash";

fn encode(messages: &[FlashMessage]) -> Option<String> {
    match serde_json::to_vec(messages) {
        Ok(json) => Some(hex::encode(json)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode flash messages");
            None
        }
    }
}

fn decode(value: &str) -> Vec<FlashMessage> {
    hex::decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| {
            tracing::debug!("Discarding unreadable flash cookie");
            Vec::new()
        })
}

/// Cookie holding `messages`, or `None` if they cannot be encoded.
pub fn flash_cookie(messages: &[FlashMessage]) -> Option<Cookie<'static>> {
    let value = encode(messages)?;
    Some(
        Cookie::build(FLASH_COOKIE, value)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish(),
    )
}

/// Expires the flash cookie.
pub fn clear_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Messages queued by earlier responses.
#[derive(Debug, Default)]
pub struct IncomingFlashes(pub Vec<FlashMessage>);

impl IncomingFlashes {
    pub fn read(req: &HttpRequest) -> Self {
        Self(
            req.cookie(FLASH_COOKIE)
                .map(|c| decode(c.value()))
                .unwrap_or_default(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromRequest for IncomingFlashes {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(IncomingFlashes::read(req)))
    }
}

/// `302 Found` to `location`, queueing `message` behind anything still pending.
pub fn redirect(req: &HttpRequest, location: &str, message: Option<FlashMessage>) -> HttpResponse {
    let mut res = HttpResponse::Found();
    res.insert_header((header::LOCATION, location));

    if let Some(message) = message {
        let mut pending = IncomingFlashes::read(req).0;
        pending.push(message);
        if let Some(cookie) = flash_cookie(&pending) {
            res.cookie(cookie);
        }
    }

    res.finish()
}
