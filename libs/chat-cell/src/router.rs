use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, ChatState};

pub fn chat_routes(state: Arc<ChatState>) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .route("/send", post(handlers::send_message))
        .route("/stats", get(handlers::stats))
        .with_state(state)
}
