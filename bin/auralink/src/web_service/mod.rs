mod alerts;
mod emails;
mod quotes;
mod sensors;

use std::sync::Arc;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::error;

use crate::alert::SensorAlerts;
use crate::publisher::Publisher;
use crate::quote::QuoteService;
use crate::storage::Storage;
use crate::triage::Triage;
use crate::Error;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub alerts: Arc<SensorAlerts>,
    pub quotes: Arc<QuoteService>,
    pub triage: Arc<Triage>,
    pub publisher: Arc<dyn Publisher>,
}

pub struct ServiceError(Error, uuid::Uuid);

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response<Body> {
        match self.0 {
            Error::UnknownDevice(id) => {
                (StatusCode::NOT_FOUND, format!("unknown device {id}")).into_response()
            }
            err => {
                error!("ServiceError[{}]: {}", self.1, err);

                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}

impl From<Error> for ServiceError {
    fn from(value: Error) -> Self {
        ServiceError(value, uuid::Uuid::new_v4())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        ServiceError(Error::Json(value), uuid::Uuid::new_v4())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sensors", get(sensors::all_latest))
        .route("/api/sensors/{device_id}", get(sensors::latest))
        .route("/api/sensors/{device_id}/history", get(sensors::history))
        .route("/api/quotes/generate", post(quotes::generate))
        .route("/api/quotes/generate/{device_id}", post(quotes::generate_for_device))
        .route("/api/alerts/{device_id}", post(alerts::send_custom))
        .route("/api/emails/triage", post(emails::triage))
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state() -> (AppState, Arc<crate::publisher::tests::RecordingPublisher>) {
    let (state, _, publisher) = test_fixture();
    (state, publisher)
}

#[cfg(test)]
pub(crate) fn test_state_with_mailer() -> (AppState, Arc<crate::alert::tests::RecordingMailer>) {
    let (state, mailer, _) = test_fixture();
    (state, mailer)
}

#[cfg(test)]
fn test_fixture() -> (
    AppState,
    Arc<crate::alert::tests::RecordingMailer>,
    Arc<crate::publisher::tests::RecordingPublisher>,
) {
    let mailer = Arc::new(crate::alert::tests::RecordingMailer::default());
    let publisher = Arc::new(crate::publisher::tests::RecordingPublisher::default());

    let state = AppState {
        storage: Arc::new(Storage::new()),
        alerts: Arc::new(SensorAlerts::new(
            mailer.clone(),
            "ops@example.com".to_string(),
        )),
        quotes: Arc::new(QuoteService::new(None, true)),
        triage: Arc::new(Triage::new(None, true)),
        publisher: publisher.clone(),
    };

    (state, mailer, publisher)
}
