use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};
use transport::SensorReading;

use crate::storage::Storage;
use crate::Result;

pub const HIGH_TEMPERATURE: f64 = 35.0;
pub const LOW_TEMPERATURE: f64 = 10.0;
pub const HIGH_HUMIDITY: f64 = 80.0;
pub const HIGH_CO2: i32 = 1000;

/// Outgoing mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_text(&self, to: &str, subject: &str, body: &str) -> Result<()>;
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// Writes alerts to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_text(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        warn!("[{to}] {subject}\n{body}");
        Ok(())
    }

    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        info!("[{to}] {subject} ({} bytes of html)", html.len());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub subject: &'static str,
    pub body: String,
}

pub struct SensorAlerts {
    mailer: Arc<dyn Mailer>,
    recipient: String,
    triggered: AtomicUsize,
}

impl SensorAlerts {
    pub fn new(mailer: Arc<dyn Mailer>, recipient: String) -> Self {
        Self {
            mailer,
            recipient,
            triggered: AtomicUsize::new(0),
        }
    }

    /// Sends every alert the reading trips and returns how many went out.
    pub async fn process(&self, reading: &SensorReading) -> usize {
        if reading.motion_detected {
            info!("motion detected from device {}", reading.device_id);
        }

        let mut sent = 0;

        for alert in check(reading) {
            match self
                .mailer
                .send_text(&self.recipient, alert.subject, &alert.body)
                .await
            {
                Ok(()) => {
                    warn!("{} sent for {}", alert.subject, reading.device_id);
                    sent += 1;
                }
                Err(err) => error!("unable to send {}: {err}", alert.subject),
            }
        }

        self.triggered.fetch_add(sent, Ordering::Relaxed);

        sent
    }

    /// Where threshold alerts and the daily summary go.
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub async fn send_custom(&self, to: &str, title: &str, reading: &SensorReading) -> Result<()> {
        self.mailer
            .send_text(to, title, &custom_alert_body(reading))
            .await?;

        info!("custom alert sent: {title}");

        Ok(())
    }

    pub async fn send_daily_summary(&self, storage: &Storage) -> Result<()> {
        let triggered = self.triggered.swap(0, Ordering::Relaxed);
        let summary = DailySummary::collect(storage, triggered).await;

        self.mailer
            .send_html(
                &self.recipient,
                "AuraLink Daily Sensor Summary Report",
                &summary.to_html(),
            )
            .await?;

        info!("daily summary report sent to {}", self.recipient);

        Ok(())
    }

    pub fn triggered(&self) -> usize {
        self.triggered.load(Ordering::Relaxed)
    }
}

pub fn check(reading: &SensorReading) -> Vec<Alert> {
    let mut alerts = vec![];
    let time = received_at(reading);

    if reading.temperature > HIGH_TEMPERATURE {
        alerts.push(Alert {
            subject: "High Temperature Alert",
            body: format!(
                "High temperature detected:\nTemperature: {:.2}°C\nDevice ID: {}\nTime: {}\nThreshold: {:.2}°C",
                reading.temperature, reading.device_id, time, HIGH_TEMPERATURE
            ),
        });
    } else if reading.temperature < LOW_TEMPERATURE {
        alerts.push(Alert {
            subject: "Low Temperature Alert",
            body: format!(
                "Low temperature detected:\nTemperature: {:.2}°C\nDevice ID: {}\nTime: {}\nThreshold: {:.2}°C",
                reading.temperature, reading.device_id, time, LOW_TEMPERATURE
            ),
        });
    }

    if reading.humidity > HIGH_HUMIDITY {
        alerts.push(Alert {
            subject: "High Humidity Alert",
            body: format!(
                "High humidity detected:\nHumidity: {:.2}%\nDevice ID: {}\nTime: {}\nThreshold: {:.2}%",
                reading.humidity, reading.device_id, time, HIGH_HUMIDITY
            ),
        });
    }

    if reading.has_poor_air() {
        alerts.push(Alert {
            subject: "Air Quality Alert",
            body: format!(
                "Poor air quality detected:\nStatus: {}\nCO2: {} ppm\nCO: {} ppm\nNH3: {} ppm\nCH4: {} ppm\nDevice ID: {}\nTime: {}",
                reading.air_quality_status,
                reading.co2,
                reading.co,
                reading.nh3,
                reading.ch4,
                reading.device_id,
                time
            ),
        });
    }

    if reading.co2 > HIGH_CO2 {
        alerts.push(Alert {
            subject: "High CO2 Alert",
            body: format!(
                "High CO2 levels detected:\nCO2: {} ppm\nDevice ID: {}\nTime: {}\nThreshold: {} ppm",
                reading.co2, reading.device_id, time, HIGH_CO2
            ),
        });
    }

    alerts
}

pub fn custom_alert_body(reading: &SensorReading) -> String {
    format!(
        "Sensor Alert Details:\n\nTemperature: {:.2}°C\nHumidity: {:.2}%\nAir Quality: {}\nCO2: {} ppm\nCO: {} ppm\nMotion: {}\nLight: {}\nDevice ID: {}\nTimestamp: {}",
        reading.temperature,
        reading.humidity,
        reading.air_quality_status,
        reading.co2,
        reading.co,
        if reading.motion_detected { "Detected" } else { "Not Detected" },
        if reading.is_light { "ON" } else { "OFF" },
        reading.device_id,
        received_at(reading)
    )
}

fn received_at(reading: &SensorReading) -> String {
    match reading.received_at {
        Some(at) => at.to_rfc3339(),
        None => "unknown".to_string(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DailySummary {
    pub total_readings: usize,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub alerts_triggered: usize,
}

impl DailySummary {
    pub async fn collect(storage: &Storage, alerts_triggered: usize) -> Self {
        let mut readings = vec![];

        for latest in storage.all_latest().await {
            readings.extend(storage.history(&latest.device_id).await);
        }

        Self::from_readings(&readings, alerts_triggered)
    }

    pub fn from_readings(readings: &[SensorReading], alerts_triggered: usize) -> Self {
        let total_readings = readings.len();

        let (avg_temperature, avg_humidity) = if total_readings == 0 {
            (0.0, 0.0)
        } else {
            let count = total_readings as f64;
            let temperature: f64 = readings.iter().map(|r| r.temperature).sum();
            let humidity: f64 = readings.iter().map(|r| r.humidity).sum();
            (temperature / count, humidity / count)
        };

        Self {
            total_readings,
            avg_temperature,
            avg_humidity,
            alerts_triggered,
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #2196F3; color: white; padding: 20px; text-align: center; }}
        .metric {{ padding: 15px; margin: 10px 0; background-color: white; border-left: 4px solid #2196F3; }}
        .metric-value {{ font-size: 28px; font-weight: bold; color: #2196F3; }}
        .footer {{ margin-top: 20px; text-align: center; font-size: 12px; color: #888; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header"><h1>AuraLink Daily Summary</h1><p>Sensor Data Report</p></div>
        <div class="metric">Total Readings<div class="metric-value">{}</div></div>
        <div class="metric">Average Temperature<div class="metric-value">{:.2}°C</div></div>
        <div class="metric">Average Humidity<div class="metric-value">{:.2}%</div></div>
        <div class="metric">Alerts Triggered<div class="metric-value">{}</div></div>
        <div class="footer"><p>Generated at: {}</p></div>
    </div>
</body>
</html>
"#,
            self.total_readings,
            self.avg_temperature,
            self.avg_humidity,
            self.alerts_triggered,
            Utc::now().to_rfc3339()
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Mutex;

    use crate::Error;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String, String)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_text(&self, to: &str, subject: &str, body: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Collaborator("smtp down".to_string()));
            }

            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }

        async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<()> {
            self.send_text(to, subject, html).await
        }
    }

    fn comfortable() -> SensorReading {
        SensorReading {
            device_id: "dev-1".to_string(),
            temperature: 22.0,
            humidity: 45.0,
            co2: 450,
            air_quality_status: "Good".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_alerts_for_comfortable_reading() {
        assert!(check(&comfortable()).is_empty());
    }

    #[test]
    fn test_thresholds() {
        let reading = SensorReading {
            temperature: 35.5,
            humidity: 81.0,
            co2: 1200,
            air_quality_status: "poor".to_string(),
            ..comfortable()
        };

        let subjects: Vec<_> = check(&reading).iter().map(|a| a.subject).collect();
        assert_eq!(
            subjects,
            vec![
                "High Temperature Alert",
                "High Humidity Alert",
                "Air Quality Alert",
                "High CO2 Alert"
            ]
        );

        let cold = SensorReading {
            temperature: 9.5,
            ..comfortable()
        };
        let alerts = check(&cold);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].subject, "Low Temperature Alert");
        assert!(alerts[0].body.contains("Temperature: 9.50°C"));
        assert!(alerts[0].body.contains("Threshold: 10.00°C"));

        let at_limits = SensorReading {
            temperature: 35.0,
            humidity: 80.0,
            co2: 1000,
            ..comfortable()
        };
        assert!(check(&at_limits).is_empty());
    }

    #[tokio::test]
    async fn test_process_sends_mail() {
        let mailer = Arc::new(RecordingMailer::default());
        let alerts = SensorAlerts::new(mailer.clone(), "ops@example.com".to_string());

        let reading = SensorReading {
            co2: 1500,
            motion_detected: true,
            ..comfortable()
        };

        assert_eq!(alerts.process(&reading).await, 1);
        assert_eq!(alerts.triggered(), 1);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ops@example.com");
        assert_eq!(sent[0].1, "High CO2 Alert");
        assert!(sent[0].2.contains("CO2: 1500 ppm"));
    }

    #[tokio::test]
    async fn test_mail_failure_is_not_counted() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let alerts = SensorAlerts::new(mailer, "ops@example.com".to_string());

        let reading = SensorReading {
            temperature: 40.0,
            ..comfortable()
        };

        assert_eq!(alerts.process(&reading).await, 0);
        assert_eq!(alerts.triggered(), 0);
    }

    #[test]
    fn test_custom_alert_body() {
        let reading = SensorReading {
            motion_detected: true,
            ..comfortable()
        };
        let body = custom_alert_body(&reading);

        assert!(body.contains("Temperature: 22.00°C"));
        assert!(body.contains("Motion: Detected"));
        assert!(body.contains("Light: OFF"));
        assert!(body.contains("Timestamp: unknown"));
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let storage = Storage::new();
        storage.upsert(comfortable()).await;
        storage
            .upsert(SensorReading {
                temperature: 24.0,
                humidity: 55.0,
                ..comfortable()
            })
            .await;
        storage
            .upsert(SensorReading {
                device_id: "dev-2".to_string(),
                temperature: 20.0,
                humidity: 35.0,
                ..comfortable()
            })
            .await;

        let summary = DailySummary::collect(&storage, 2).await;
        assert_eq!(summary.total_readings, 3);
        assert_eq!(summary.avg_temperature, 22.0);
        assert_eq!(summary.avg_humidity, 45.0);
        assert_eq!(summary.alerts_triggered, 2);

        let html = summary.to_html();
        assert!(html.contains("<div class=\"metric-value\">3</div>"));
        assert!(html.contains("22.00°C"));

        assert_eq!(
            DailySummary::from_readings(&[], 0),
            DailySummary {
                total_readings: 0,
                avg_temperature: 0.0,
                avg_humidity: 0.0,
                alerts_triggered: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_send_daily_summary_resets_counter() {
        let mailer = Arc::new(RecordingMailer::default());
        let alerts = SensorAlerts::new(mailer.clone(), "ops@example.com".to_string());
        let storage = Storage::new();

        alerts
            .process(&SensorReading {
                temperature: 50.0,
                ..comfortable()
            })
            .await;
        assert_eq!(alerts.triggered(), 1);

        alerts.send_daily_summary(&storage).await.unwrap();
        assert_eq!(alerts.triggered(), 0);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.last().unwrap().1, "AuraLink Daily Sensor Summary Report");
    }
}
