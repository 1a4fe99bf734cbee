//! # Sensor Bridge
//!
//! Explicitly constructed owner of everything the dashboard talks to:
//!
//! ```text
//! Broker ──► SubscriberWorker ──► queue ──► StateReducer ──► SensorState
//!                (tokio task)                  (UI thread)
//! UI ──► CommandPublisher ──► Broker
//! ```
//!
//! The queue is the only data path between the subscriber task and the UI
//! thread. The subscriber is spawned once by [`SensorBridge::start`] and runs
//! until the bridge is shut down or dropped. One bridge serves one dashboard;
//! sharing a bridge between several viewers is not supported.

pub mod queue;
pub mod reducer;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::mqtt::publisher::{Command, CommandPublisher};
use crate::mqtt::status::{status_channel, BridgeStatus};
use crate::mqtt::subscriber::SubscriberWorker;
use crate::sensor::{SensorReading, SensorState};

use self::queue::{message_queue, QueueProducer};
use self::reducer::StateReducer;

pub struct SensorBridge {
    config: BridgeConfig,
    runtime: Handle,
    producer: QueueProducer<SensorReading>,
    reducer: StateReducer,
    publisher: CommandPublisher,
    status_tx: Option<watch::Sender<BridgeStatus>>,
    status_rx: watch::Receiver<BridgeStatus>,
    subscriber: Option<JoinHandle<()>>,
}

impl SensorBridge {
    /// Builds a bridge that talks to the broker from `config`.
    ///
    /// Nothing connects until [`SensorBridge::start`] or the first command.
    pub fn new(config: BridgeConfig, runtime: Handle) -> Self {
        let publisher =
            CommandPublisher::mqtt(&config.broker, config.topics.control.clone(), runtime.clone());
        Self::with_publisher(config, runtime, publisher)
    }

    pub fn with_publisher(
        config: BridgeConfig,
        runtime: Handle,
        publisher: CommandPublisher,
    ) -> Self {
        let (producer, consumer) = message_queue();
        let (status_tx, status_rx) = status_channel();
        SensorBridge {
            config,
            runtime,
            producer,
            reducer: StateReducer::new(consumer),
            publisher,
            status_tx: Some(status_tx),
            status_rx,
            subscriber: None,
        }
    }

    /// Spawns the subscriber worker.
    ///
    /// Returns `true` when the worker was started by this call and `false`
    /// when it was already running; repeated calls have no effect.
    pub fn start(&mut self) -> bool {
        if self.subscriber.is_some() {
            return false;
        }
        let Some(status_tx) = self.status_tx.take() else {
            return false;
        };
        let worker = SubscriberWorker::new(
            self.config.broker.clone(),
            self.config.topics.sensor.clone(),
            self.producer.clone(),
            status_tx,
        );
        self.subscriber = Some(self.runtime.spawn(worker.run()));
        info!("Subscriber worker started");
        true
    }

    pub fn is_running(&self) -> bool {
        self.subscriber
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Folds everything queued since the last call. See [`StateReducer::reduce`].
    pub fn refresh(&mut self) -> usize {
        self.reducer.reduce()
    }

    pub fn state(&self) -> &SensorState {
        self.reducer.state()
    }

    pub fn status(&self) -> BridgeStatus {
        self.status_rx.borrow().clone()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Dispatches `command`; `Ok` does not mean the device received it.
    pub fn send_command(&self, command: Command) -> Result<(), BridgeError> {
        self.publisher.send(command)
    }

    pub fn set_buzzer(&self, on: bool) -> Result<(), BridgeError> {
        self.send_command(Command::buzzer(on))
    }

    /// Stops the subscriber worker. Only meant for process shutdown.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.subscriber.take() {
            warn!("Stopping subscriber worker");
            handle.abort();
        }
    }
}

impl Drop for SensorBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::mqtt::publisher::CommandSink;
    use crate::mqtt::subscriber::handle_payload;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl CommandSink for RecordingSink {
        fn publish(&self, _topic: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
            self.sent.lock().unwrap().push(payload);
            Ok(())
        }
    }

    fn offline_config() -> BridgeConfig {
        BridgeConfig {
            broker: BrokerConfig {
                host: "127.0.0.1".to_string(),
                port: 1,
                reconnect_delay_ms: 50,
                ..BrokerConfig::default()
            },
            ..BridgeConfig::default()
        }
    }

    fn test_bridge(sink: RecordingSink) -> SensorBridge {
        let config = offline_config();
        let publisher = CommandPublisher::new(config.topics.control.clone(), Box::new(sink));
        SensorBridge::with_publisher(config, Handle::current(), publisher)
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let mut bridge = test_bridge(RecordingSink::default());
        assert!(!bridge.is_running());

        assert!(bridge.start());
        assert!(!bridge.start());
        assert!(bridge.is_running());

        bridge.shutdown();
        assert!(!bridge.is_running());
    }

    #[tokio::test]
    async fn refresh_folds_readings_from_the_worker_path() {
        let mut bridge = test_bridge(RecordingSink::default());
        let status_tx = bridge.status_tx.take().unwrap();
        for payload in [
            &br#"{"asap":10,"cahaya":5,"suhu":21.0}"#[..],
            &b"garbage"[..],
            &br#"{"cahaya":7}"#[..],
            &br#"{"suhu":22.5}"#[..],
        ] {
            handle_payload(payload, &bridge.producer, &status_tx);
        }

        assert_eq!(bridge.refresh(), 3);
        assert_eq!(bridge.refresh(), 0);

        let state = bridge.state();
        assert_eq!(state.smoke().history(), &[Some(10.0), None, None]);
        assert_eq!(state.latest_temperature(), Some(22.5));

        let status = bridge.status();
        assert_eq!(status.messages_received, 3);
        assert_eq!(status.messages_rejected, 1);
    }

    #[tokio::test]
    async fn buzzer_commands_reach_the_sink() {
        let sink = RecordingSink::default();
        let bridge = test_bridge(sink.clone());

        bridge.set_buzzer(true).unwrap();
        bridge.set_buzzer(false).unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![br#"{"buzzer": 1}"#.to_vec(), br#"{"buzzer": 0}"#.to_vec()]
        );
    }
}
