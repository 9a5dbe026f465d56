//! Plain chat completion without tools.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest, Role};

pub const MAX_TOKENS: u32 = 1000;
pub const TEMPERATURE: f32 = 0.7;

pub struct ChatService {
    model: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("model", &self.model.model_name())
            .finish()
    }
}

impl ChatService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// One completion over the whole conversation. Logs the latest user turn.
    pub async fn respond(
        &self,
        messages: Vec<ChatMessage>,
        request_id: Option<&str>,
    ) -> Result<String, ServiceError> {
        if messages.is_empty() {
            return Err(ServiceError::validation("Invalid messages format"));
        }

        if let Some(question) = latest_user_message(&messages) {
            info!(
                event = "chat.question",
                content = question,
                timestamp = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                request_id = request_id.unwrap_or("-"),
                "user question"
            );
        }

        let request = CompletionRequest::new(messages)
            .with_max_tokens(MAX_TOKENS)
            .with_temperature(TEMPERATURE);

        let reply = self.model.complete(request).await.map_err(|e| {
            warn!(event = "chat.model_failed", error = %e);
            e.into_service_error("model")
        })?;

        reply
            .content
            .ok_or_else(|| ServiceError::dependency("model", "reply has no content"))
    }
}

fn latest_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .and_then(|m| m.content.as_deref())
}
