//! JSON responses and CORS headers.

use lambda_http::http::header::{CONTENT_TYPE, SET_COOKIE};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde_json::{json, Value};

/// Who may call a route from a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any origin, no credentials.
    Open,
    /// The configured origin, with `Access-Control-Allow-Credentials: true`.
    Credentialed,
}

/// CORS headers for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cors {
    pub allow_origin: String,
    pub allow_methods: &'static str,
    pub allow_credentials: bool,
}

impl Cors {
    /// A credentialed route without a configured origin falls back to `*`
    /// and drops the credentials header, since browsers reject that pair.
    pub fn for_route(access: Access, allow_methods: &'static str, origin: Option<&str>) -> Self {
        match (access, origin) {
            (Access::Credentialed, Some(origin)) => Self {
                allow_origin: origin.to_string(),
                allow_methods,
                allow_credentials: true,
            },
            _ => Self {
                allow_origin: "*".to_string(),
                allow_methods,
                allow_credentials: false,
            },
        }
    }

    /// Headers used when no route matched.
    pub fn fallback() -> Self {
        Self::for_route(Access::Open, "GET, POST, OPTIONS", None)
    }
}

/// What a handler produces before CORS and serialization are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub set_cookies: Vec<String>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            set_cookies: Vec::new(),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// `{"error": message}`.
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    /// Preflight answer: 200 with an empty body.
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
            set_cookies: Vec::new(),
        }
    }

    pub fn with_set_cookies(mut self, cookies: Vec<String>) -> Self {
        self.set_cookies = cookies;
        self
    }

    pub fn into_response(self, cors: &Cors) -> Result<Response<Body>, lambda_http::http::Error> {
        let mut builder = Response::builder()
            .status(self.status)
            .header(CONTENT_TYPE, "application/json")
            .header("Access-Control-Allow-Origin", cors.allow_origin.as_str())
            .header("Access-Control-Allow-Methods", cors.allow_methods)
            .header("Access-Control-Allow-Headers", "Content-Type");
        if cors.allow_credentials {
            builder = builder.header("Access-Control-Allow-Credentials", "true");
        }
        for cookie in &self.set_cookies {
            builder = builder.header(SET_COOKIE, cookie.as_str());
        }

        let body = match self.body {
            Some(value) => Body::Text(value.to_string()),
            None => Body::Empty,
        };
        builder.body(body)
    }
}
