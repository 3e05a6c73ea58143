use async_trait::async_trait;
use paho_mqtt::AsyncClient;
use serde_json::Value;
use transport::Topic;

use crate::Result;

/// Outbound side of the broker connection.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: Topic, payload: Value) -> Result<()>;
}

#[async_trait]
impl Publisher for AsyncClient {
    async fn publish(&self, topic: Topic, payload: Value) -> Result<()> {
        transport::publish_json(self, topic, &payload).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<(Topic, Value)>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, topic: Topic, payload: Value) -> Result<()> {
            self.published.lock().unwrap().push((topic, payload));
            Ok(())
        }
    }
}
