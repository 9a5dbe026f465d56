use lambda_http::http::StatusCode;
use lambda_http::Request;
use portico_core::ServiceError;

use super::body_text;
use crate::response::Reply;
use crate::state::AppState;

/// `POST /feature-request`: store the request, answer 201 with the record.
pub async fn submit(state: &AppState, request: &Request) -> Result<Reply, ServiceError> {
    let body = body_text(request);
    let record = state.feature_requests()?.submit(body).await?;
    let value = serde_json::to_value(&record)
        .map_err(|e| ServiceError::dependency("table", e.to_string()))?;
    Ok(Reply::json(StatusCode::CREATED, value))
}
