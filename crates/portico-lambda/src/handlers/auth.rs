use lambda_http::http::StatusCode;
use lambda_http::Request;
use portico_core::{Credential, ServiceError};
use serde_json::json;

use super::{body_text, cookie_jar};
use crate::response::Reply;
use crate::state::AppState;

/// `POST /auth`: verify credentials and set the three signed cookies.
pub async fn issue(state: &AppState, request: &Request) -> Result<Reply, ServiceError> {
    let credential = Credential::from_body(body_text(request))?;
    let issued = state.gate().issue(&credential).await?;

    let domain = state.config().gate.cookie_domain.as_deref();
    Ok(Reply::ok(json!({
        "message": "Authentication successful",
        "expireTime": issued.expire_time,
    }))
    .with_set_cookies(issued.cookies.set_cookie_headers(domain)))
}

/// `GET /auth/check`: 200 while the policy cookie is unexpired, 401 otherwise.
pub fn check(state: &AppState, request: &Request) -> Reply {
    if state.gate().check(&cookie_jar(request)) {
        Reply::ok(json!({ "authenticated": true }))
    } else {
        Reply::json(StatusCode::UNAUTHORIZED, json!({ "authenticated": false }))
    }
}
