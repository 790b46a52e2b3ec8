//! HTTP surface: webhook intake, manual content triggers and a liveness probe.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use dispatch::UpdateDispatcher;
use herald_core::Update;
use tracing::{error, info, warn};

use crate::content::{ContentJob, ContentService};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: UpdateDispatcher,
    pub content: Arc<ContentService>,
    pub report_chat_id: i64,
}

pub fn build_router(state: AppState, webhook_path: &str) -> Router {
    let mut router = Router::new()
        .route("/", get(health))
        .route(webhook_path, post(webhook));

    for job in ContentJob::ALL {
        let paths = std::iter::once(job.trigger_path()).chain(job.trigger_aliases().iter().copied());
        for path in paths {
            router = router.route(
                path,
                get(move |State(state): State<AppState>| trigger(state, job)),
            );
        }
    }
    router.with_state(state)
}

async fn health() -> &'static str {
    "Bot is running"
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

/// Acknowledges every JSON delivery with 200 once it is queued; processing runs detached.
async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_json(&headers) {
        warn!("Webhook request without JSON content type rejected");
        return StatusCode::FORBIDDEN.into_response();
    }

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            let update_id = update.update_id;
            let outcome = state.dispatcher.accept(update).await;
            info!(update_id = ?update_id, outcome = ?outcome, "step: webhook update accepted");
        }
        Err(e) => warn!(error = %e, bytes = body.len(), "Malformed webhook payload ignored"),
    }
    (StatusCode::OK, "ok").into_response()
}

async fn trigger(state: AppState, job: ContentJob) -> Response {
    info!(job = %job, chat_id = state.report_chat_id, "Manual trigger");
    match state.content.run(job, state.report_chat_id).await {
        Ok(()) => (StatusCode::OK, format!("{} sent", job)).into_response(),
        Err(e) => {
            error!(job = %job, error = %e, "Manual trigger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}
