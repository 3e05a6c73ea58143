pub mod email;
pub mod quote;

mod error;
pub use error::Error;

mod sensor_reading;
pub use sensor_reading::SensorReading;

mod topic;
pub use topic::Topic;

use std::time::Duration;

use log::debug;
use paho_mqtt::{self as mqtt, AsyncClient, MessageBuilder, SslOptions, QOS_1};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub async fn connect_mqtt(
    address: String,
    credentials: Option<Credentials>,
    client_id: &str,
) -> Result<AsyncClient> {
    let use_ssl = address.starts_with("ssl://") || address.starts_with("mqtts://");

    let create_opts = mqtt::CreateOptionsBuilder::new_v3()
        .server_uri(address)
        .client_id(client_id)
        .finalize();

    let client = AsyncClient::new(create_opts)?;

    let mut conn_opts = mqtt::ConnectOptionsBuilder::new_v3();
    conn_opts
        .keep_alive_interval(Duration::from_secs(30))
        .clean_session(true);

    if use_ssl {
        conn_opts.ssl_options(SslOptions::new());
    }

    if let Some(credentials) = credentials {
        conn_opts
            .user_name(credentials.username)
            .password(credentials.password);
    }

    client.connect(conn_opts.finalize()).await?;

    Ok(client)
}

pub async fn publish_json<T: Serialize>(
    client: &AsyncClient,
    topic: Topic,
    value: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(value)?;

    debug!("publish to {topic}: {} bytes", payload.len());

    let message = MessageBuilder::new()
        .topic(topic.as_str())
        .payload(payload)
        .qos(QOS_1)
        .finalize();

    client.publish(message).await?;

    Ok(())
}
