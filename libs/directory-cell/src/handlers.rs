use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::AppError;

use crate::services::{AvailabilityService, SupabaseAppointmentStore};
use crate::services::store::AppointmentStore;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let store = SupabaseAppointmentStore::new(&config);

    let appointments = store
        .list_appointments()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let store = SupabaseAppointmentStore::new(&config);

    let appointment = store
        .cancel_appointment(appointment_id)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let store = SupabaseAppointmentStore::new(&config);

    let doctors = store
        .active_doctors()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn availability_for_date(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let store: Arc<dyn AppointmentStore> = Arc::new(SupabaseAppointmentStore::new(&config));
    let service = AvailabilityService::new(store);

    let slots = service
        .available_slots(query.date)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "date": query.date,
        "slots": slots
    })))
}
