use std::str::FromStr;
use std::time::Duration;

use log::debug;
use transport::Credentials;

use crate::{Error, Result};

const DEFAULT_MQTT_ADDRESS: &str = "tcp://broker.hivemq.com:1883";
const DEFAULT_CLIENT_ID: &str = "auralink-backend-client";
const DEFAULT_RECIPIENT: &str = "admin@example.com";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mqtt_address: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: String,
    pub http_port: u16,
    pub quote_interval: Duration,
    pub quote_generation_enabled: bool,
    pub ai_enabled: bool,
    pub alert_recipient: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("loaded {}", path.display());
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let quote_interval_secs: u64 = parse(&lookup, "QUOTE_INTERVAL_SECS", 600)?;

        Ok(Self {
            mqtt_address: lookup("MQTT_ADDRESS").unwrap_or(DEFAULT_MQTT_ADDRESS.to_string()),
            mqtt_username: lookup("MQTT_USER"),
            mqtt_password: lookup("MQTT_PASS"),
            mqtt_client_id: lookup("MQTT_CLIENT_ID").unwrap_or(DEFAULT_CLIENT_ID.to_string()),
            http_port: parse(&lookup, "HTTP_PORT", 8080)?,
            quote_interval: Duration::from_secs(quote_interval_secs.max(1)),
            quote_generation_enabled: parse(&lookup, "QUOTE_GENERATION_ENABLED", true)?,
            ai_enabled: parse(&lookup, "AI_ENABLED", true)?,
            alert_recipient: lookup("ALERT_RECIPIENT").unwrap_or(DEFAULT_RECIPIENT.to_string()),
        })
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.mqtt_username, &self.mqtt_password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

fn parse<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid value {value:?} for {key}"))),
        None => Ok(default),
    }
}
