use lambda_http::Request;
use portico_core::{parse_conversation, ServiceError};
use serde_json::json;

use super::body_text;
use crate::response::Reply;
use crate::state::AppState;

/// `POST /search`: answer, searching the web at most once.
pub async fn answer(state: &AppState, request: &Request) -> Result<Reply, ServiceError> {
    let messages = parse_conversation(body_text(request))?;
    let response = state.orchestrator().await?.answer(messages).await?;
    Ok(Reply::ok(json!({ "response": response })))
}
