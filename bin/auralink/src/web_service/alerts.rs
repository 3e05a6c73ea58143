use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::web_service::{AppState, ServiceError};
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct CustomAlertRequest {
    pub title: String,
    pub recipient: Option<String>,
}

/// Mails the device's latest reading under a caller-chosen title.
pub async fn send_custom(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<CustomAlertRequest>,
) -> Result<StatusCode, ServiceError> {
    let reading = state
        .storage
        .latest(&device_id)
        .await
        .ok_or_else(|| Error::UnknownDevice(device_id.clone()))?;

    let recipient = request
        .recipient
        .as_deref()
        .unwrap_or(state.alerts.recipient());

    state
        .alerts
        .send_custom(recipient, &request.title, &reading)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::response::IntoResponse;
    use transport::SensorReading;

    use crate::web_service::{test_state, test_state_with_mailer};

    fn request(recipient: Option<&str>) -> Json<CustomAlertRequest> {
        Json(CustomAlertRequest {
            title: "Check the greenhouse".to_string(),
            recipient: recipient.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let (state, _) = test_state();

        let response = send_custom(State(state), Path("dev-1".to_string()), request(None))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_custom() {
        let (state, mailer) = test_state_with_mailer();
        state
            .storage
            .upsert(SensorReading {
                device_id: "dev-1".to_string(),
                temperature: 27.5,
                is_light: true,
                ..Default::default()
            })
            .await;

        let status = send_custom(
            State(state.clone()),
            Path("dev-1".to_string()),
            request(None),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        send_custom(
            State(state.clone()),
            Path("dev-1".to_string()),
            request(Some("garden@example.com")),
        )
        .await
        .ok()
        .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "ops@example.com");
        assert_eq!(sent[0].1, "Check the greenhouse");
        assert!(sent[0].2.contains("Temperature: 27.50°C"));
        assert!(sent[0].2.contains("Light: ON"));
        assert_eq!(sent[1].0, "garden@example.com");
    }
}
