use serde::{Deserialize, Serialize};

use crate::Topic;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    pub device_id: String,
    pub quote: String,
    pub context: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl QuotePayload {
    pub const fn topic(&self) -> Topic {
        Topic::Quotes
    }
}
