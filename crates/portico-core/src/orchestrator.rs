//! Search-augmented answering.
//!
//! The model sees the conversation plus one declared tool, `search_google`.
//! If it calls the tool, a single search is run and its results are handed
//! back for a second, tool-free completion. There is never more than one
//! search per request.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest, ToolCall, ToolChoice, ToolDefinition};
use crate::search::WebSearch;

pub const SEARCH_TOOL: &str = "search_google";

/// Declaration of the search tool offered to the model.
pub fn search_tool() -> ToolDefinition {
    ToolDefinition::function(
        SEARCH_TOOL,
        "Search Google for current information",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        }),
    )
}

#[derive(Deserialize)]
struct SearchArguments {
    query: String,
}

pub struct SearchOrchestrator {
    model: Arc<dyn ChatModel>,
    search: Arc<dyn WebSearch>,
    tool_choice: ToolChoice,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("model", &self.model.model_name())
            .field("tool_choice", &self.tool_choice)
            .finish_non_exhaustive()
    }
}

impl SearchOrchestrator {
    pub fn new(model: Arc<dyn ChatModel>, search: Arc<dyn WebSearch>) -> Self {
        Self {
            model,
            search,
            tool_choice: ToolChoice::Auto,
        }
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    /// Answers the conversation, searching at most once.
    pub async fn answer(&self, messages: Vec<ChatMessage>) -> Result<String, ServiceError> {
        if messages.is_empty() {
            return Err(ServiceError::validation("Invalid messages format"));
        }

        let first = self
            .model
            .complete(
                CompletionRequest::new(messages.clone())
                    .with_tools(vec![search_tool()], self.tool_choice),
            )
            .await
            .map_err(|e| {
                warn!(event = "search.model_failed", phase = "decide", error = %e);
                e.into_service_error("model")
            })?;

        let Some(call) = first
            .tool_calls()
            .iter()
            .find(|c| c.function.name == SEARCH_TOOL)
            .cloned()
        else {
            if !first.tool_calls().is_empty() {
                warn!(event = "search.unknown_tool", "model called an undeclared tool, ignoring");
            }
            info!(event = "search.direct_answer", "model answered without searching");
            return reply_text(&first);
        };

        let args: SearchArguments = serde_json::from_str(&call.function.arguments).map_err(|e| {
            ServiceError::dependency("model", format!("unparseable search_google arguments: {e}"))
        })?;

        info!(event = "search.query", query = %args.query, "running web search");
        let results = self.search.search(&args.query).await.map_err(|e| {
            warn!(event = "search.provider_failed", error = %e);
            e.into_service_error("search")
        })?;
        info!(event = "search.results", count = results.len());

        let payload = serde_json::to_string(&results)
            .map_err(|e| ServiceError::dependency("search", e.to_string()))?;

        let mut followup = messages;
        followup.push(single_call(first, &call));
        followup.push(ChatMessage::tool_result(&call, payload));

        let second = self
            .model
            .complete(CompletionRequest::new(followup))
            .await
            .map_err(|e| {
                warn!(event = "search.model_failed", phase = "answer", error = %e);
                e.into_service_error("model")
            })?;

        reply_text(&second)
    }
}

/// The assistant turn trimmed to the one tool call that gets a result.
fn single_call(mut reply: ChatMessage, call: &ToolCall) -> ChatMessage {
    reply.tool_calls = Some(vec![call.clone()]);
    reply
}

fn reply_text(reply: &ChatMessage) -> Result<String, ServiceError> {
    reply
        .content
        .clone()
        .ok_or_else(|| ServiceError::dependency("model", "reply has no content"))
}
