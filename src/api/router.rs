use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_borrowing, delete_borrowing, delete_borrowing_without_id,
    get_borrowing_by_id, list_borrowings, return_borrowing, update_borrowing,
    update_borrowing_without_id,
};

/// Creates the API router with all borrowing endpoints
///
/// - GET /borrowings - List borrowings (optional `status` filter)
/// - POST /borrowings - Create a borrowing
/// - POST /borrowings/return - Return a borrowing (id in body)
/// - GET /borrowings/:id - Get a borrowing
/// - PUT /borrowings/:id - Update allowed fields
/// - DELETE /borrowings/:id - Delete a borrowing
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route(
            "/borrowings",
            get(list_borrowings)
                .post(create_borrowing)
                .put(update_borrowing_without_id)
                .delete(delete_borrowing_without_id),
        )
        .route("/borrowings/return", post(return_borrowing))
        .route(
            "/borrowings/:id",
            get(get_borrowing_by_id)
                .put(update_borrowing)
                .delete(delete_borrowing),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
