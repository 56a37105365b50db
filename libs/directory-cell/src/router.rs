use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn directory_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/appointments", get(handlers::list_appointments))
        .route(
            "/appointments/{appointment_id}/cancel",
            put(handlers::cancel_appointment),
        )
        .route("/doctors", get(handlers::list_doctors))
        .route("/availability", get(handlers::availability_for_date))
        .with_state(state)
}
