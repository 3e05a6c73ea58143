use axum::extract::{Path, State};
use axum::Json;
use transport::SensorReading;

use crate::quote::Quote;
use crate::web_service::{AppState, ServiceError};
use crate::Error;

/// Quote for a reading supplied by the caller. Nothing is stored or published.
pub async fn generate(
    State(state): State<AppState>,
    Json(reading): Json<SensorReading>,
) -> Json<Quote> {
    Json(state.quotes.generate(&reading).await)
}

pub async fn generate_for_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Quote>, ServiceError> {
    let quote = state
        .quotes
        .quote_for_device(&device_id, &state.storage, state.publisher.as_ref())
        .await
        .ok_or_else(|| Error::UnknownDevice(device_id.clone()))?;

    Ok(Json(quote))
}
