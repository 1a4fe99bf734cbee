//! # Bridge Configuration
//!
//! Broker address, topics and dashboard settings, stored as TOML in
//! `<config dir>/sensor-bridge/config.toml`. The `SENSOR_BRIDGE_CONFIG`
//! environment variable points at a different file.
//!
//! A missing file is created with defaults on first start. Keys missing from
//! an existing file fall back to their defaults, so older files keep working.

use rumqttc::MqttOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::BridgeError;

const CONFIG_DIR: &str = "sensor-bridge";
const CONFIG_FILE: &str = "config.toml";
pub const CONFIG_ENV: &str = "SENSOR_BRIDGE_CONFIG";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Client IDs are derived as `<prefix>-sub-<pid>` and `<prefix>-pub-<pid>`
    pub client_id_prefix: String,
    pub keep_alive_secs: u64,
    /// Pause between polls after a transport error
    pub reconnect_delay_ms: u64,
    /// Request buffer of each rumqttc client
    pub channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            host: "broker.hivemq.com".to_string(),
            port: 1883,
            client_id_prefix: "sensor-bridge".to_string(),
            keep_alive_secs: 60,
            reconnect_delay_ms: 1000,
            channel_capacity: 10,
        }
    }
}

impl BrokerConfig {
    pub fn client_id(&self, role: &str) -> String {
        format!("{}-{}-{}", self.client_id_prefix, role, std::process::id())
    }

    pub fn mqtt_options(&self, role: &str) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id(role), self.host.clone(), self.port);
        options
            .set_keep_alive(Duration::from_secs(self.keep_alive_secs))
            .set_clean_session(true);
        options
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TopicConfig {
    /// Telemetry published by the device
    pub sensor: String,
    /// Commands sent to the device
    pub control: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        TopicConfig {
            sensor: "alat/data/complete".to_string(),
            control: "iot/sic/output".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub refresh_ms: u64,
    /// Rows rendered in the history table, newest last
    pub history_rows: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            refresh_ms: 500,
            history_rows: 200,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub ui: UiConfig,
}

impl BridgeConfig {
    /// Path from `SENSOR_BRIDGE_CONFIG`, or the per-user config directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: BridgeConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), BridgeError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Loads `path`, writing the defaults there first if it does not exist.
    pub async fn load_or_create(path: &Path) -> Result<Self, BridgeError> {
        if !tokio::fs::try_exists(path).await? {
            info!("Creating default configuration at {}", path.display());
            let config = BridgeConfig::default();
            config.save(path).await?;
            return Ok(config);
        }
        Self::load(path).await
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.broker.host.trim().is_empty() {
            return Err(BridgeError::Config("broker host is empty".to_string()));
        }
        if self.broker.port == 0 {
            return Err(BridgeError::Config("broker port must not be 0".to_string()));
        }
        if self.broker.channel_capacity == 0 {
            return Err(BridgeError::Config(
                "channel capacity must not be 0".to_string(),
            ));
        }
        if self.topics.sensor.trim().is_empty() || self.topics.control.trim().is_empty() {
            return Err(BridgeError::Config("topics must not be empty".to_string()));
        }
        if !rumqttc::valid_filter(&self.topics.sensor) {
            return Err(BridgeError::Config(format!(
                "sensor topic {:?} is not a valid subscription filter",
                self.topics.sensor
            )));
        }
        if !rumqttc::valid_topic(&self.topics.control) {
            return Err(BridgeError::Config(format!(
                "control topic {:?} must not contain wildcards",
                self.topics.control
            )));
        }
        if self.ui.refresh_ms == 0 {
            return Err(BridgeError::Config(
                "refresh interval must not be 0".to_string(),
            ));
        }
        Ok(())
    }
}
