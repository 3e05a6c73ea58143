use serde::{Deserialize, Serialize};

use crate::Topic;

/// Notifications consumed by the desk display when mail arrives.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmailNotification {
    NewEmails {
        count: usize,
        summary: String,
        timestamp: i64,
    },
    PriorityEmails {
        count: usize,
        summary: String,
        timestamp: i64,
    },
}

impl EmailNotification {
    pub const fn topic(&self) -> Topic {
        match self {
            EmailNotification::NewEmails { .. } => Topic::EmailNotifications,
            EmailNotification::PriorityEmails { .. } => Topic::EmailPriority,
        }
    }
}
