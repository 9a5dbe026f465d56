//! Route handlers. Each turns a request into a [`Reply`](crate::response::Reply)
//! or a [`ServiceError`](portico_core::ServiceError); the router owns CORS and
//! error rendering.

pub mod auth;
pub mod chat;
pub mod feature_request;
pub mod search;

use lambda_http::http::header::COOKIE;
use lambda_http::{Body, Request};
use portico_core::CookieJar;

/// Request body as text. Empty and non-UTF-8 bodies count as absent.
pub(crate) fn body_text(request: &Request) -> Option<&str> {
    match request.body() {
        Body::Empty => None,
        Body::Text(text) => Some(text.as_str()),
        Body::Binary(bytes) => std::str::from_utf8(bytes).ok(),
    }
}

pub(crate) fn cookie_jar(request: &Request) -> CookieJar {
    CookieJar::parse(
        request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok()),
    )
}
