use std::sync::Arc;

use anyhow::Context;
use lambda_http::{run, service_fn};
use portico_core::AppConfig;
use portico_lambda::{handle_request, telemetry, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = AppConfig::from_env();
    for key in config.missing() {
        warn!(variable = key, "environment variable not set; routes that need it will fail");
    }

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let state = Arc::new(AppState::from_sdk_config(&sdk_config, config));
    info!(
        model = %state.config().openai.model,
        tool_choice = ?state.config().search.tool_choice,
        "portico starting"
    );

    run(service_fn(move |request| {
        let state = state.clone();
        async move { handle_request(state, request).await }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
    .context("lambda runtime exited")
}
