//! Route table for the webhook service.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::web::handlers::{health, list_events, receive_webhook, AppState};
use crate::web::response::handle_panic;

/// Build the application router.
///
/// Panics raised while handling a request become a generic 500. Request
/// bodies are not size-limited.
pub fn create_router(state: AppState) -> Router {
    with_layers(routes()).with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(receive_webhook))
        .route("/events", get(list_events))
}

fn with_layers(router: Router<AppState>) -> Router<AppState> {
    router
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
