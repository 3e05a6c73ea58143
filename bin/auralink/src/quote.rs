use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rand::seq::SliceRandom;
use serde::Serialize;
use transport::quote::QuotePayload;
use transport::SensorReading;

use crate::publisher::Publisher;
use crate::storage::Storage;
use crate::Result;

pub const MAX_QUOTE_LEN: usize = 60;

const THEMES: [&str; 10] = [
    "motivational and uplifting",
    "mindfulness and wellness",
    "productivity and focus",
    "nature and harmony",
    "energy and vitality",
    "peace and tranquility",
    "inspiration and courage",
    "health and balance",
    "joy and positivity",
    "wisdom and insight",
];

const GENERAL_QUOTES: [&str; 8] = [
    "Every moment matters!",
    "You're doing great!",
    "Stay positive always!",
    "Believe in yourself!",
    "Today is your day!",
    "Make it happen!",
    "Dream big, achieve bigger!",
    "Success starts now!",
];

/// Text generation backend, e.g. a hosted chat completion model.
#[async_trait]
pub trait QuoteGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub text: String,
    pub context: String,
    pub device_id: String,
    pub generated_at: DateTime<Utc>,
    pub sensor_data: SensorReading,
}

impl Quote {
    pub fn payload(&self) -> QuotePayload {
        QuotePayload {
            device_id: self.device_id.clone(),
            quote: self.text.clone(),
            context: self.context.clone(),
            timestamp: self.generated_at.timestamp_millis(),
        }
    }
}

pub struct QuoteService {
    generator: Option<Arc<dyn QuoteGenerator>>,
    enabled: bool,
}

impl QuoteService {
    pub fn new(generator: Option<Arc<dyn QuoteGenerator>>, enabled: bool) -> Self {
        Self { generator, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn generate(&self, reading: &SensorReading) -> Quote {
        let text = match (&self.generator, self.enabled) {
            (Some(generator), true) => {
                let theme = THEMES.choose(&mut rand::thread_rng()).unwrap_or(&THEMES[0]);

                match generator.generate(&build_prompt(reading, theme)).await {
                    Ok(text) => {
                        let text = sanitize(&text);
                        info!("generated quote: {text}");
                        text
                    }
                    Err(err) => {
                        error!("unable to generate quote: {err}");
                        fallback_quote(reading)
                    }
                }
            }
            (_, false) => {
                warn!("quote generation is disabled");
                fallback_quote(reading)
            }
            (None, true) => fallback_quote(reading),
        };

        Quote {
            text,
            context: context(reading),
            device_id: reading.device_id.clone(),
            generated_at: Utc::now(),
            sensor_data: reading.clone(),
        }
    }

    /// Generates and publishes a quote for the device's latest reading.
    pub async fn quote_for_device(
        &self,
        device_id: &str,
        storage: &Storage,
        publisher: &dyn Publisher,
    ) -> Option<Quote> {
        let Some(reading) = storage.latest(device_id).await else {
            warn!("no sensor data found for device {device_id}");
            return None;
        };

        let quote = self.generate(&reading).await;
        publish(&quote, publisher).await;

        Some(quote)
    }

    /// One scheduled pass over every known device. Returns how many quotes
    /// were published.
    pub async fn round(&self, storage: &Storage, publisher: &dyn Publisher) -> usize {
        if !self.enabled {
            return 0;
        }

        let readings = storage.all_latest().await;
        if readings.is_empty() {
            warn!("no sensor data available for quote generation");
            return 0;
        }

        let mut published = 0;

        for reading in readings.iter() {
            let quote = self.generate(reading).await;
            if publish(&quote, publisher).await {
                published += 1;
            }
        }

        info!("completed quote generation for {} devices", readings.len());

        published
    }
}

async fn publish(quote: &Quote, publisher: &dyn Publisher) -> bool {
    let payload = quote.payload();
    let topic = payload.topic();

    let value = match serde_json::to_value(&payload) {
        Ok(value) => value,
        Err(err) => {
            error!("unable to serialize quote: {err}");
            return false;
        }
    };

    match publisher.publish(topic, value).await {
        Ok(()) => {
            info!("sent quote to {topic}: {}", quote.text);
            true
        }
        Err(err) => {
            error!("unable to publish quote for {}: {err}", quote.device_id);
            false
        }
    }
}

pub fn build_prompt(reading: &SensorReading, theme: &str) -> String {
    let mut prompt = format!(
        "Generate a unique, {theme} quote (max {MAX_QUOTE_LEN} characters) based on these conditions:\n\n"
    );

    let temperature = if reading.temperature > 30.0 {
        "high"
    } else if reading.temperature < 18.0 {
        "low"
    } else {
        "comfortable"
    };
    let _ = writeln!(
        prompt,
        "- Temperature is {temperature} ({:.1}°C)",
        reading.temperature
    );

    let humidity = if reading.humidity > 70.0 {
        "high"
    } else if reading.humidity < 30.0 {
        "low"
    } else {
        "optimal"
    };
    let _ = writeln!(prompt, "- Humidity is {humidity} ({:.1}%)", reading.humidity);

    let _ = writeln!(prompt, "- Air quality: {}", reading.air_quality_status);

    let co2 = if reading.co2 > 1000 { "high" } else { "good" };
    let _ = writeln!(prompt, "- CO2 levels are {co2} ({} ppm)", reading.co2);

    if reading.motion_detected {
        prompt.push_str("- Motion detected - someone is active\n");
    }

    if reading.is_light {
        prompt.push_str("- Bright environment\n");
    } else {
        prompt.push_str("- Low light environment\n");
    }

    let _ = write!(
        prompt,
        "\nMake it creative and different each time. Under {MAX_QUOTE_LEN} characters."
    );

    prompt
}

pub fn sanitize(text: &str) -> String {
    let text: String = text.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();

    if text.chars().count() > MAX_QUOTE_LEN {
        let mut truncated: String = text.chars().take(MAX_QUOTE_LEN - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        text
    }
}

pub fn context(reading: &SensorReading) -> String {
    format!(
        "Temp: {:.1}°C, Humidity: {:.1}%, Air: {}, CO2: {} ppm",
        reading.temperature, reading.humidity, reading.air_quality_status, reading.co2
    )
}

/// Canned quotes matching the first condition that applies, plus the
/// general ones.
pub fn fallback_candidates(reading: &SensorReading) -> Vec<&'static str> {
    let status = reading.air_quality_status.as_str();

    let mut candidates = if status == "Excellent" || status == "Good" {
        vec![
            "Breathe deep, live well!",
            "Pure air, pure thoughts!",
            "Fresh air fuels success!",
            "Clean air, clear mind!",
            "Inhale peace, exhale stress!",
        ]
    } else if status == "Poor" || status == "Hazardous" {
        vec![
            "Fresh air, fresh start!",
            "Seek fresh air soon!",
            "Better air brings better days!",
            "Air quality matters!",
        ]
    } else if reading.temperature > 30.0 {
        vec![
            "Stay cool, stay hydrated!",
            "Beat the heat, stay strong!",
            "Cool thoughts in warm times!",
            "Warmth outside, calm inside!",
        ]
    } else if reading.temperature < 18.0 {
        vec![
            "Warmth brings comfort!",
            "Cozy moments ahead!",
            "Bundle up, stay positive!",
            "Cool air, warm heart!",
        ]
    } else if reading.humidity > 70.0 {
        vec!["Balance brings peace!", "Flow with nature!", "Adapt and thrive!"]
    } else if reading.motion_detected {
        vec![
            "Keep moving forward!",
            "Action creates results!",
            "Movement is life!",
            "Stay active, stay alive!",
        ]
    } else {
        vec![]
    };

    candidates.extend(GENERAL_QUOTES);
    candidates
}

fn fallback_quote(reading: &SensorReading) -> String {
    let candidates = fallback_candidates(reading);

    candidates
        .choose(&mut rand::thread_rng())
        .unwrap_or(&GENERAL_QUOTES[0])
        .to_string()
}
