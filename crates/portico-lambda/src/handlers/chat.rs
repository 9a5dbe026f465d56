use lambda_http::Request;
use portico_core::{parse_conversation, ChatService, ServiceError};
use serde_json::json;

use super::body_text;
use crate::response::Reply;
use crate::state::AppState;

/// `POST /chat`: one completion, no tools.
pub async fn respond(
    state: &AppState,
    request: &Request,
    request_id: Option<&str>,
) -> Result<Reply, ServiceError> {
    let messages = parse_conversation(body_text(request))?;
    let service = ChatService::new(state.model().await?);
    let response = service.respond(messages, request_id).await?;
    Ok(Reply::ok(json!({ "response": response })))
}
