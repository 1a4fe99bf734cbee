//! # MQTT Integration Module
//!
//! Both broker connections of the bridge live here:
//!
//! ```text
//! mqtt/
//! ├── subscriber.rs  - inbound telemetry: event loop, payload decoding, enqueue
//! ├── publisher.rs   - outbound commands: Command, CommandSink, CommandPublisher
//! └── status.rs      - connection state reported to the dashboard
//! ```
//!
//! ## Connections
//!
//! The subscriber and the publisher each own a separate rumqttc client with
//! their own client ID. The subscriber is started once by
//! [`crate::bridge::SensorBridge::start`] and polls until the process exits.
//! The publisher connects on its first command.
//!
//! All traffic uses QoS 0. Reconnection is left to rumqttc, which reconnects
//! on the next poll after a transport error.

pub mod publisher;
pub mod status;
pub mod subscriber;
