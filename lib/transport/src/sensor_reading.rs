use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// One telemetry sample as published by a device on [`crate::Topic::Sensors`].
///
/// Everything except `deviceId` is optional on the wire: a missing or `null`
/// field falls back to zero, `false` or an empty string, and integer fields
/// take floats truncated toward zero. `receivedAt` is never taken from the
/// payload, it is assigned by the server on ingestion.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    #[serde(deserialize_with = "non_empty")]
    pub device_id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub temperature: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub humidity: f64,

    #[serde(default, deserialize_with = "integer")]
    pub air_quality_raw: i32,
    #[serde(default, deserialize_with = "integer")]
    pub co2: i32,
    #[serde(default, deserialize_with = "integer")]
    pub nh3: i32,
    #[serde(default, deserialize_with = "integer")]
    pub ch4: i32,
    #[serde(default, deserialize_with = "integer")]
    pub co: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub air_quality_status: String,

    #[serde(default, deserialize_with = "nullable")]
    pub is_light: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub motion_detected: bool,

    /// Device clock, untrusted.
    #[serde(default, deserialize_with = "integer")]
    pub timestamp: i64,

    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

impl SensorReading {
    pub fn stamped(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    pub fn has_poor_air(&self) -> bool {
        self.air_quality_status.eq_ignore_ascii_case("poor")
            || self.air_quality_status.eq_ignore_ascii_case("hazardous")
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;

    if value.is_empty() {
        Err(de::Error::invalid_value(
            de::Unexpected::Str(&value),
            &"non-empty device id",
        ))
    } else {
        Ok(value)
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Integer(i64),
    Float(f64),
}

fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    let value = match Option::<Number>::deserialize(deserializer)? {
        None => return Ok(T::default()),
        Some(Number::Integer(value)) => value,
        Some(Number::Float(value)) if value.is_finite() => value.trunc() as i64,
        Some(Number::Float(value)) => {
            return Err(de::Error::invalid_value(
                de::Unexpected::Float(value),
                &"a finite number",
            ))
        }
    };

    T::try_from(value).map_err(|_| {
        de::Error::invalid_value(de::Unexpected::Signed(value), &"an integer in range")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_deserialization() {
        let json = json!({
            "deviceId": "esp32-livingroom",
            "temperature": 23.5,
            "humidity": 41.2,
            "airQualityRaw": 312,
            "co2": 640,
            "nh3": 3,
            "ch4": 1,
            "co": 2,
            "airQualityStatus": "Good",
            "isLight": true,
            "motionDetected": false,
            "timestamp": 1718000000
        });

        let reading: SensorReading = serde_json::from_value(json).unwrap();

        assert_eq!(reading.device_id, "esp32-livingroom");
        assert_eq!(reading.temperature, 23.5);
        assert_eq!(reading.humidity, 41.2);
        assert_eq!(reading.air_quality_raw, 312);
        assert_eq!(reading.co2, 640);
        assert_eq!(reading.air_quality_status, "Good");
        assert!(reading.is_light);
        assert!(!reading.motion_detected);
        assert_eq!(reading.timestamp, 1718000000);
        assert_eq!(reading.received_at, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let json = json!({ "deviceId": "dev-1", "firmware": "1.2.0" });
        let reading: SensorReading = serde_json::from_value(json).unwrap();

        assert_eq!(
            reading,
            SensorReading {
                device_id: "dev-1".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_received_at_is_not_read_from_payload() {
        let json = json!({ "deviceId": "dev-1", "receivedAt": "2020-01-01T00:00:00Z" });
        let reading: SensorReading = serde_json::from_value(json).unwrap();

        assert_eq!(reading.received_at, None);
    }

    #[test]
    fn test_missing_or_empty_device_id() {
        let missing = serde_json::from_value::<SensorReading>(json!({ "temperature": 20.0 }));
        assert!(missing.is_err());

        let empty = serde_json::from_value::<SensorReading>(json!({ "deviceId": "" }));
        assert!(empty.is_err());

        let wrong_type = serde_json::from_value::<SensorReading>(json!({ "deviceId": 42 }));
        assert!(wrong_type.is_err());

        let null = serde_json::from_value::<SensorReading>(json!({ "deviceId": null }));
        assert!(null.is_err());
    }

    #[test]
    fn test_null_fields_default() {
        let json = json!({
            "deviceId": "dev-1",
            "temperature": null,
            "humidity": null,
            "co2": null,
            "airQualityStatus": null,
            "isLight": null,
            "timestamp": null
        });
        let reading: SensorReading = serde_json::from_value(json).unwrap();

        assert_eq!(
            reading,
            SensorReading {
                device_id: "dev-1".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_float_integers_are_truncated() {
        let json = json!({
            "deviceId": "dev-3",
            "co2": 412.0,
            "airQualityRaw": 300.9,
            "co": -1.5,
            "timestamp": 1718000000.0
        });
        let reading: SensorReading = serde_json::from_value(json).unwrap();

        assert_eq!(reading.co2, 412);
        assert_eq!(reading.air_quality_raw, 300);
        assert_eq!(reading.co, -1);
        assert_eq!(reading.timestamp, 1718000000);
    }

    #[test]
    fn test_out_of_range_integer() {
        let overflow = json!({ "deviceId": "dev-1", "co2": 3_000_000_000i64 });
        assert!(serde_json::from_value::<SensorReading>(overflow).is_err());

        let text = json!({ "deviceId": "dev-1", "co2": "412" });
        assert!(serde_json::from_value::<SensorReading>(text).is_err());
    }

    #[test]
    fn test_serialization() {
        let received_at = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let reading = SensorReading {
            device_id: "dev-1".to_string(),
            temperature: 21.0,
            is_light: true,
            timestamp: 3,
            ..Default::default()
        }
        .stamped(received_at);

        let value = serde_json::to_value(&reading).unwrap();

        assert_eq!(value["deviceId"], "dev-1");
        assert_eq!(value["temperature"], 21.0);
        assert_eq!(value["isLight"], true);
        assert_eq!(value["motionDetected"], false);
        assert_eq!(value["timestamp"], 3);
        assert_eq!(value["receivedAt"], "2024-06-10T12:00:00Z");
    }

    #[test]
    fn test_poor_air() {
        let mut reading = SensorReading {
            device_id: "dev-1".to_string(),
            air_quality_status: "HAZARDOUS".to_string(),
            ..Default::default()
        };
        assert!(reading.has_poor_air());

        reading.air_quality_status = "Good".to_string();
        assert!(!reading.has_poor_air());
    }
}
