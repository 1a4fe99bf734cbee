//! # Sensor Data Model
//!
//! Typed telemetry as it flows through the bridge:
//!
//! ```text
//! sensor/
//! ├── reading.rs  - SensorReading and payload decoding
//! └── state.rs    - SensorState (latest values + history per metric)
//! ```
//!
//! A [`SensorReading`] is produced once per valid inbound message and never
//! changes afterwards. [`SensorState`] is owned by the state reducer and is
//! only mutated by folding readings in the order they were dequeued.

pub mod reading;
pub mod state;

pub use reading::SensorReading;
pub use state::{MetricSeries, SensorState};
