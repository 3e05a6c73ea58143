use axum::extract::State;
use axum::Json;
use chrono::Utc;
use log::error;
use serde::Deserialize;
use transport::email::EmailNotification;

use crate::triage::{Priority, Triaged};
use crate::web_service::{AppState, ServiceError};

#[derive(Debug, Deserialize)]
pub struct TriageRequest {
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Summarizes and ranks an incoming email, then notifies the display.
pub async fn triage(
    State(state): State<AppState>,
    Json(request): Json<TriageRequest>,
) -> Result<Json<Triaged>, ServiceError> {
    let triaged = state.triage.process(&request.subject, &request.body).await;
    let timestamp = Utc::now().timestamp_millis();

    let mut notifications = vec![EmailNotification::NewEmails {
        count: 1,
        summary: triaged.summary.clone(),
        timestamp,
    }];

    if triaged.priority == Priority::High {
        notifications.push(EmailNotification::PriorityEmails {
            count: 1,
            summary: triaged.summary.clone(),
            timestamp,
        });
    }

    for notification in notifications {
        let topic = notification.topic();
        let payload = serde_json::to_value(&notification)?;

        if let Err(err) = state.publisher.publish(topic, payload).await {
            error!("unable to publish email notification to {topic}: {err}");
        }
    }

    Ok(Json(triaged))
}

#[cfg(test)]
mod tests {
    use super::*;

    use transport::Topic;

    use crate::web_service::test_state;

    #[tokio::test]
    async fn test_triage_priority_email() {
        let (state, publisher) = test_state();

        let request = TriageRequest {
            subject: "URGENT: greenhouse heater failure".to_string(),
            body: "<p>The heater in greenhouse 2 stopped working overnight.</p>".to_string(),
        };

        let Json(triaged) = triage(State(state), Json(request)).await.ok().unwrap();
        assert_eq!(triaged.priority, Priority::High);
        assert!(triaged.summary.chars().count() <= 80);

        let published = publisher.published.lock().unwrap();
        let topics: Vec<_> = published.iter().map(|(topic, _)| *topic).collect();
        assert_eq!(topics, vec![Topic::EmailNotifications, Topic::EmailPriority]);
        assert_eq!(published[0].1["type"], "new_emails");
        assert_eq!(published[1].1["type"], "priority_emails");
        assert_eq!(published[1].1["summary"], triaged.summary.as_str());
    }

    #[tokio::test]
    async fn test_triage_regular_email() {
        let (state, publisher) = test_state();

        let request = TriageRequest {
            subject: "Lunch".to_string(),
            body: String::new(),
        };

        let Json(triaged) = triage(State(state), Json(request)).await.ok().unwrap();
        assert_eq!(triaged.priority, Priority::Medium);
        assert_eq!(triaged.summary, "Subject: Lunch");

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, Topic::EmailNotifications);
    }
}
