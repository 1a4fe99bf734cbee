//! Error definitions for the sensor bridge

use thiserror::Error;

/// Errors raised by the bridge core.
///
/// None of these are fatal to the process. Callers log them and carry on
/// with "no new data" or "command not delivered".
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid or inconsistent configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system access while loading or writing the configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::config::BridgeConfig`]
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("Failed to write configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Inbound payload or outbound command could not be (de)serialized
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// The MQTT client refused the publish request
    #[error("Publish error: {0}")]
    Publish(#[from] rumqttc::ClientError),

    /// The other end of the hand-off queue is gone
    #[error("Queue closed")]
    QueueClosed,
}
