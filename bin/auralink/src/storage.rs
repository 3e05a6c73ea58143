use std::collections::{HashMap, VecDeque};

use log::debug;
use tokio::sync::RwLock;
use transport::SensorReading;

pub const MAX_HISTORY: usize = 100;

/// Latest reading and bounded newest-first history per device.
///
/// Both halves of a device entry live behind the same lock, so readers never
/// see a `latest` that the history does not reflect yet.
#[derive(Default)]
pub struct Storage {
    devices: RwLock<HashMap<String, Device>>,
}

#[derive(Debug)]
struct Device {
    latest: SensorReading,
    history: VecDeque<SensorReading>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins: the device-reported `timestamp` is not compared.
    pub async fn upsert(&self, reading: SensorReading) {
        let mut devices = self.devices.write().await;

        match devices.get_mut(&reading.device_id) {
            Some(device) => {
                device.history.push_front(reading.clone());
                device.history.truncate(MAX_HISTORY);
                device.latest = reading;
            }
            None => {
                debug!("new device {}", reading.device_id);

                let mut history = VecDeque::with_capacity(MAX_HISTORY);
                history.push_front(reading.clone());

                devices.insert(
                    reading.device_id.clone(),
                    Device {
                        latest: reading,
                        history,
                    },
                );
            }
        }
    }

    pub async fn latest(&self, device_id: &str) -> Option<SensorReading> {
        let devices = self.devices.read().await;
        devices.get(device_id).map(|device| device.latest.clone())
    }

    pub async fn all_latest(&self) -> Vec<SensorReading> {
        let devices = self.devices.read().await;
        devices
            .values()
            .map(|device| device.latest.clone())
            .collect()
    }

    /// Newest first. Unknown devices have an empty history.
    pub async fn history(&self, device_id: &str) -> Vec<SensorReading> {
        let devices = self.devices.read().await;

        if let Some(device) = devices.get(device_id) {
            device.history.iter().cloned().collect()
        } else {
            vec![]
        }
    }

    /// `latest` and history read under one guard.
    #[cfg(test)]
    async fn snapshot(&self, device_id: &str) -> Option<(SensorReading, Vec<SensorReading>)> {
        let devices = self.devices.read().await;

        devices.get(device_id).map(|device| {
            (
                device.latest.clone(),
                device.history.iter().cloned().collect(),
            )
        })
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }
}
