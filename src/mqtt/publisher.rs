use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use serde::Serialize;
use std::io;
use std::sync::OnceLock;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::config::BrokerConfig;
use crate::error::BridgeError;

/// Control message for the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub buzzer_on: bool,
}

#[derive(Serialize)]
struct ControlPayload {
    buzzer: u8,
}

impl Command {
    pub fn buzzer(on: bool) -> Self {
        Command { buzzer_on: on }
    }

    /// Wire form: `{"buzzer": 1}` or `{"buzzer": 0}`, byte for byte what the
    /// device firmware expects.
    pub fn to_payload(&self) -> Result<Vec<u8>, BridgeError> {
        let payload = ControlPayload {
            buzzer: u8::from(self.buzzer_on),
        };
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
        payload.serialize(&mut ser)?;
        Ok(out)
    }
}

/// Compact JSON with a single space after each `:`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Something that can put a payload on a topic without waiting for the broker.
pub trait CommandSink: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError>;
}

/// Outbound MQTT connection, created on the first publish and reused after.
///
/// The client's event loop runs on its own task on `runtime`, so a publish
/// only queues the request.
pub struct MqttSink {
    options: MqttOptions,
    capacity: usize,
    reconnect_delay: std::time::Duration,
    runtime: Handle,
    client: OnceLock<AsyncClient>,
}

impl MqttSink {
    pub fn new(broker: &BrokerConfig, runtime: Handle) -> Self {
        MqttSink {
            options: broker.mqtt_options("pub"),
            capacity: broker.channel_capacity,
            reconnect_delay: broker.reconnect_delay(),
            runtime,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> &AsyncClient {
        self.client.get_or_init(|| {
            let (host, port) = self.options.broker_address();
            info!("Opening command connection to {}:{}", host, port);
            let (client, eventloop) = AsyncClient::new(self.options.clone(), self.capacity);
            self.runtime
                .spawn(drive_outbound(eventloop, self.reconnect_delay));
            client
        })
    }
}

async fn drive_outbound(mut eventloop: EventLoop, reconnect_delay: std::time::Duration) {
    loop {
        match eventloop.poll().await {
            Ok(event) => debug!("Command connection event: {:?}", event),
            Err(e) => {
                warn!("Command connection error: {}", e);
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

impl CommandSink for MqttSink {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
        self.client()
            .try_publish(topic, QoS::AtMostOnce, false, payload)?;
        Ok(())
    }
}

/// Sends one-shot control messages to the device.
///
/// `Ok` from [`CommandPublisher::send`] means the command was dispatched,
/// never that the device received it.
pub struct CommandPublisher {
    topic: String,
    sink: Box<dyn CommandSink>,
}

impl CommandPublisher {
    pub fn new(topic: String, sink: Box<dyn CommandSink>) -> Self {
        CommandPublisher { topic, sink }
    }

    pub fn mqtt(broker: &BrokerConfig, topic: String, runtime: Handle) -> Self {
        Self::new(topic, Box::new(MqttSink::new(broker, runtime)))
    }

    pub fn send(&self, command: Command) -> Result<(), BridgeError> {
        let result = command
            .to_payload()
            .and_then(|payload| self.sink.publish(&self.topic, payload));
        match &result {
            Ok(()) => info!("Dispatched {:?} to {}", command, self.topic),
            Err(e) => error!("Failed to dispatch {:?} to {}: {}", command, self.topic, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    }

    impl CommandSink for RecordingSink {
        fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
            self.sent.lock().unwrap().push((topic.to_string(), payload));
            Ok(())
        }
    }

    struct FailingSink;

    impl CommandSink for FailingSink {
        fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
            let (client, eventloop) =
                AsyncClient::new(MqttOptions::new("failing-sink", "127.0.0.1", 1), 1);
            drop(eventloop);
            client.try_publish(topic, QoS::AtMostOnce, false, payload)?;
            Ok(())
        }
    }

    #[test]
    fn buzzer_payloads_are_exact() {
        assert_eq!(Command::buzzer(true).to_payload().unwrap(), br#"{"buzzer": 1}"#);
        assert_eq!(Command::buzzer(false).to_payload().unwrap(), br#"{"buzzer": 0}"#);
    }

    #[test]
    fn send_publishes_on_control_topic() {
        let sink = RecordingSink::default();
        let publisher = CommandPublisher::new("iot/sic/output".to_string(), Box::new(sink.clone()));

        publisher.send(Command::buzzer(true)).unwrap();
        publisher.send(Command::buzzer(false)).unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![
                ("iot/sic/output".to_string(), br#"{"buzzer": 1}"#.to_vec()),
                ("iot/sic/output".to_string(), br#"{"buzzer": 0}"#.to_vec()),
            ]
        );
    }

    #[test]
    fn sink_failure_is_returned_not_raised() {
        let publisher = CommandPublisher::new("iot/sic/output".to_string(), Box::new(FailingSink));
        assert!(matches!(
            publisher.send(Command::buzzer(true)),
            Err(BridgeError::Publish(rumqttc::ClientError::TryRequest(_)))
        ));
    }

    #[tokio::test]
    async fn mqtt_sink_connects_lazily_and_reuses_client() {
        let broker = BrokerConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..BrokerConfig::default()
        };
        let sink = MqttSink::new(&broker, Handle::current());
        assert!(sink.client.get().is_none());

        sink.publish("iot/sic/output", br#"{"buzzer": 1}"#.to_vec())
            .unwrap();
        assert!(sink.client.get().is_some());

        sink.publish("iot/sic/output", br#"{"buzzer": 0}"#.to_vec())
            .unwrap();
    }
}
