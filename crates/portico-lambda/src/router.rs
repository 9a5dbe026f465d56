//! `(method, path)` dispatch.

use std::sync::Arc;

use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Error, Request, RequestExt, Response};
use portico_core::ServiceError;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::handlers;
use crate::redact::loggable_headers;
use crate::response::{Access, Cors, Reply};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Auth,
    AuthCheck,
    Chat,
    Search,
    FeatureRequest,
}

impl Route {
    /// Matches a path, ignoring one trailing `/`.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        match path {
            "/auth" => Some(Self::Auth),
            "/auth/check" => Some(Self::AuthCheck),
            "/chat" => Some(Self::Chat),
            "/search" => Some(Self::Search),
            "/feature-request" => Some(Self::FeatureRequest),
            _ => None,
        }
    }

    pub fn method(self) -> Method {
        match self {
            Self::AuthCheck => Method::GET,
            _ => Method::POST,
        }
    }

    pub fn allow_methods(self) -> &'static str {
        match self {
            Self::AuthCheck => "GET, OPTIONS",
            _ => "POST, OPTIONS",
        }
    }

    pub fn access(self) -> Access {
        match self {
            Self::Chat | Self::Search => Access::Open,
            Self::Auth | Self::AuthCheck | Self::FeatureRequest => Access::Credentialed,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::AuthCheck => "auth_check",
            Self::Chat => "chat",
            Self::Search => "search",
            Self::FeatureRequest => "feature_request",
        }
    }
}

/// Path as the client sent it. API Gateway requests carry the stage
/// (`/prod/auth`) in the URI; the raw path does not.
fn route_path(request: &Request) -> &str {
    match request.raw_http_path() {
        "" => request.uri().path(),
        raw => raw,
    }
}

/// Entry point for every invocation.
pub async fn handle_request(state: Arc<AppState>, request: Request) -> Result<Response<Body>, Error> {
    let request_id = request
        .lambda_context_ref()
        .map(|ctx| ctx.request_id.clone())
        .filter(|id| !id.is_empty());

    let method = request.method().clone();
    let path = route_path(&request).to_string();

    debug!(
        %method,
        %path,
        headers = ?loggable_headers(request.headers()),
        "incoming request"
    );

    let Some(route) = Route::from_path(&path) else {
        info!(%method, %path, status = 404, "no route");
        return Reply::error(StatusCode::NOT_FOUND, "Not found")
            .into_response(&Cors::fallback())
            .map_err(Error::from);
    };

    let cors = Cors::for_route(
        route.access(),
        route.allow_methods(),
        state.config().cors_allowed_origin.as_deref(),
    );

    let reply = if method == Method::OPTIONS {
        Reply::preflight()
    } else if method != route.method() {
        Reply::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        let result = match route {
            Route::Auth => handlers::auth::issue(&state, &request).await,
            Route::AuthCheck => Ok(handlers::auth::check(&state, &request)),
            Route::Chat => handlers::chat::respond(&state, &request, request_id.as_deref()).await,
            Route::Search => handlers::search::answer(&state, &request).await,
            Route::FeatureRequest => handlers::feature_request::submit(&state, &request).await,
        };
        result.unwrap_or_else(|e| error_reply(route, &e, request_id.as_deref()))
    };

    info!(
        route = route.name(),
        %method,
        status = reply.status.as_u16(),
        request_id = request_id.as_deref().unwrap_or("-"),
        "request handled"
    );

    reply.into_response(&cors).map_err(Error::from)
}

/// Client errors echo their message; everything else is logged and hidden.
fn error_reply(route: Route, err: &ServiceError, request_id: Option<&str>) -> Reply {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if err.is_client_error() {
        warn!(route = route.name(), status = status.as_u16(), error = %err, "request rejected");
        return Reply::error(status, err.public_message());
    }

    error!(
        route = route.name(),
        error = %err,
        request_id = request_id.unwrap_or("-"),
        "request failed"
    );
    let mut body = json!({ "error": err.public_message() });
    if let Some(id) = request_id {
        body["requestId"] = json!(id);
    }
    Reply::json(status, body)
}
