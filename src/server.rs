//! HTTP trigger for the poll scheduler.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::pipeline::scheduler::{PollScheduler, StartOutcome};

/// Shared state for trigger routes.
#[derive(Clone)]
pub struct TriggerState {
    pub scheduler: Arc<PollScheduler>,
}

/// GET /
///
/// Starts the scheduler and answers before any provider call is made.
async fn start_task(State(state): State<TriggerState>) -> impl IntoResponse {
    match state.scheduler.start() {
        StartOutcome::Started { .. } => "Task started!",
        StartOutcome::AlreadyRunning => "Task already running!",
    }
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Build the trigger routes.
pub fn trigger_routes(state: TriggerState) -> Router {
    Router::new()
        .route("/", get(start_task))
        .route("/health", get(health))
        .with_state(state)
}
