//! HTTP surface of the portico API, served from a single Lambda function.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/auth` | [`handlers::auth::issue`] |
//! | GET | `/auth/check` | [`handlers::auth::check`] |
//! | POST | `/chat` | [`handlers::chat::respond`] |
//! | POST | `/search` | [`handlers::search::answer`] |
//! | POST | `/feature-request` | [`handlers::feature_request::submit`] |
//!
//! `OPTIONS` on any of these answers the CORS preflight.

pub mod handlers;
pub mod redact;
pub mod response;
pub mod router;
pub mod state;
pub mod telemetry;

pub use router::{handle_request, Route};
pub use state::AppState;
