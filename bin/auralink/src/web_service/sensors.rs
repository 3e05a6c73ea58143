use axum::extract::{Path, State};
use axum::Json;
use log::debug;
use transport::SensorReading;

use crate::web_service::{AppState, ServiceError};
use crate::Error;

pub async fn all_latest(State(state): State<AppState>) -> Json<Vec<SensorReading>> {
    Json(state.storage.all_latest().await)
}

pub async fn latest(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<SensorReading>, ServiceError> {
    debug!("latest for {device_id}");

    match state.storage.latest(&device_id).await {
        Some(reading) => Ok(Json(reading)),
        None => Err(Error::UnknownDevice(device_id).into()),
    }
}

pub async fn history(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Json<Vec<SensorReading>> {
    Json(state.storage.history(&device_id).await)
}
