use chrono::{DateTime, Local};
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::error::BridgeError;

/// Wire format published by the sensor device.
///
/// Keys follow the firmware naming. Every field is optional and `null`
/// is treated as absent.
#[derive(Debug, Default, Deserialize)]
struct SensorPayload {
    #[serde(default)]
    asap: Option<f64>,
    #[serde(default)]
    cahaya: Option<f64>,
    #[serde(default)]
    suhu: Option<f64>,
}

/// One normalized telemetry sample, stamped on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub timestamp: DateTime<Local>,
    pub smoke: Option<f64>,
    pub light: Option<f64>,
    pub temperature: Option<f64>,
}

impl SensorReading {
    pub fn new(smoke: Option<f64>, light: Option<f64>, temperature: Option<f64>) -> Self {
        SensorReading {
            timestamp: Local::now(),
            smoke,
            light,
            temperature,
        }
    }

    /// Decodes a raw bus payload.
    ///
    /// Fails when the payload is not a JSON object or when one of the known
    /// keys carries a non-numeric value. Unknown keys are ignored.
    pub fn from_payload(payload: &[u8]) -> Result<Self, BridgeError> {
        let value: Value = serde_json::from_slice(payload)?;
        if !value.is_object() {
            return Err(serde_json::Error::custom("expected a JSON object").into());
        }
        let decoded: SensorPayload = serde_json::from_value(value)?;
        Ok(SensorReading::new(decoded.asap, decoded.cahaya, decoded.suhu))
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - asap: {}, cahaya: {}, suhu: {}",
            self.timestamp.format("%H:%M:%S"),
            display_value(self.smoke),
            display_value(self.light),
            display_value(self.temperature)
        )
    }
}

/// Renders an optional metric, `-` when no value is present.
pub fn display_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
