use std::sync::Arc;

use axum::{routing::get, Router};

use chat_cell::handlers::ChatState;
use chat_cell::router::chat_routes;
use directory_cell::router::directory_routes;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>, chat_state: Arc<ChatState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Citas Bot API is running!" }))
        .nest("/whatsapp", chat_routes(chat_state))
        .nest("/api", directory_routes(config))
}
