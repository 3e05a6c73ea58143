use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, trace};
use transport::{SensorReading, Topic};

use crate::broadcast::{Broadcast, BroadcastSink};
use crate::storage::Storage;
use crate::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Telemetry,
    Status,
    Ignore,
}

impl Route {
    pub fn from_topic(topic: &str) -> Route {
        match Topic::from_str(topic) {
            Ok(Topic::Sensors) => Route::Telemetry,
            Ok(Topic::Status) => Route::Status,
            Ok(Topic::Quotes | Topic::EmailNotifications | Topic::EmailPriority) | Err(_) => {
                Route::Ignore
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Stored(SensorReading),
    Forwarded,
    Ignored,
    Dropped,
}

/// Turns broker deliveries into store updates and broadcasts.
pub struct Ingestor {
    storage: Arc<Storage>,
    sink: Arc<dyn BroadcastSink>,
}

impl Ingestor {
    pub fn new(storage: Arc<Storage>, sink: Arc<dyn BroadcastSink>) -> Self {
        Self { storage, sink }
    }

    /// Never fails: bad deliveries are logged and dropped.
    pub async fn on_message(&self, topic: &str, payload: &[u8]) -> Outcome {
        match Route::from_topic(topic) {
            Route::Telemetry => match parse_reading(payload) {
                Ok(reading) => {
                    let reading = reading.stamped(Utc::now());

                    self.storage.upsert(reading.clone()).await;
                    self.sink.publish(Broadcast::Sensors(reading.clone()));

                    info!("stored reading from {}", reading.device_id);

                    Outcome::Stored(reading)
                }
                Err(err) => {
                    error!("dropping message from {topic}: {err}");
                    debug!("{}", String::from_utf8_lossy(payload));

                    Outcome::Dropped
                }
            },
            Route::Status => {
                debug!("status: {}", String::from_utf8_lossy(payload));

                self.sink.publish(Broadcast::Status(payload.to_vec()));

                Outcome::Forwarded
            }
            Route::Ignore => {
                trace!("ignoring message from {topic}");
                Outcome::Ignored
            }
        }
    }
}

pub fn parse_reading(payload: &[u8]) -> Result<SensorReading> {
    serde_json::from_slice(payload).map_err(Error::MalformedPayload)
}
