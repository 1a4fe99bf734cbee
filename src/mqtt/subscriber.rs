use chrono::Local;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::status::{BridgeStatus, ConnectionState};
use crate::bridge::queue::QueueProducer;
use crate::config::BrokerConfig;
use crate::sensor::SensorReading;

/// Owns the inbound broker connection for the lifetime of the process.
pub struct SubscriberWorker {
    client: AsyncClient,
    eventloop: EventLoop,
    broker: BrokerConfig,
    topic: String,
    producer: QueueProducer<SensorReading>,
    status: watch::Sender<BridgeStatus>,
}

impl SubscriberWorker {
    pub fn new(
        broker: BrokerConfig,
        topic: String,
        producer: QueueProducer<SensorReading>,
        status: watch::Sender<BridgeStatus>,
    ) -> Self {
        let (client, eventloop) =
            AsyncClient::new(broker.mqtt_options("sub"), broker.channel_capacity);
        SubscriberWorker {
            client,
            eventloop,
            broker,
            topic,
            producer,
            status,
        }
    }

    /// Polls the event loop until the task is aborted.
    ///
    /// rumqttc reconnects on the next poll after a transport error, so the
    /// loop only waits a fixed delay before polling again. The subscription is
    /// renewed on every ConnAck because sessions are clean.
    pub async fn run(mut self) {
        info!(
            "Connecting to {}:{} for topic {}",
            self.broker.host, self.broker.port, self.topic
        );
        self.status
            .send_modify(|s| s.connection_state = ConnectionState::Connecting);

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to broker, subscribing to {}", self.topic);
                    self.status
                        .send_modify(|s| s.connection_state = ConnectionState::Connected);
                    if let Err(e) = self.client.try_subscribe(&self.topic, QoS::AtMostOnce) {
                        error!("Failed to subscribe to {}: {}", self.topic, e);
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if accepts_topic(&self.topic, &publish.topic) {
                        handle_payload(&publish.payload, &self.producer, &self.status);
                    } else {
                        debug!("Ignoring message on unexpected topic {}", publish.topic);
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    debug!("Subscription to {} acknowledged", self.topic);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Connection error: {}", e);
                    self.status
                        .send_modify(|s| s.connection_state = ConnectionState::Reconnecting);
                    tokio::time::sleep(self.broker.reconnect_delay()).await;
                }
            }
        }
    }
}

/// Whether a publish on `topic` belongs to the subscription `filter`.
///
/// The filter may carry `+` and `#` wildcards, so a plain string comparison
/// would drop every message delivered under a wildcard subscription.
pub fn accepts_topic(filter: &str, topic: &str) -> bool {
    rumqttc::matches(topic, filter)
}

/// Decodes one inbound payload and hands the reading to the queue.
///
/// Malformed payloads are logged and dropped; they never reach the queue and
/// never affect the connection.
pub fn handle_payload(
    payload: &[u8],
    producer: &QueueProducer<SensorReading>,
    status: &watch::Sender<BridgeStatus>,
) {
    match SensorReading::from_payload(payload) {
        Ok(reading) => {
            debug!("Received {}", reading);
            if let Err(e) = producer.enqueue(reading) {
                warn!("Dropping reading: {}", e);
                return;
            }
            status.send_modify(|s| {
                s.messages_received += 1;
                s.last_activity = Some(Local::now());
            });
        }
        Err(e) => {
            warn!(
                "Invalid sensor payload ({}): {}",
                e,
                String::from_utf8_lossy(payload)
            );
            status.send_modify(|s| {
                s.messages_rejected += 1;
                s.last_activity = Some(Local::now());
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::queue::message_queue;
    use crate::mqtt::status::status_channel;

    #[test]
    fn exact_topic_is_accepted() {
        assert!(accepts_topic("alat/data/complete", "alat/data/complete"));
        assert!(!accepts_topic("alat/data/complete", "alat/data/partial"));
    }

    #[test]
    fn wildcard_subscription_accepts_device_topic() {
        assert!(accepts_topic("alat/#", "alat/data/complete"));
        assert!(accepts_topic("alat/+/complete", "alat/data/complete"));
        assert!(!accepts_topic("alat/+/complete", "iot/sic/output"));
    }

    #[test]
    fn valid_payload_is_enqueued() {
        let (tx, mut rx) = message_queue();
        let (status_tx, status_rx) = status_channel();

        handle_payload(br#"{"asap":1,"cahaya":2,"suhu":3.5}"#, &tx, &status_tx);

        let readings = rx.try_dequeue_all();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].temperature, Some(3.5));
        let status = status_rx.borrow();
        assert_eq!(status.messages_received, 1);
        assert_eq!(status.messages_rejected, 0);
        assert!(status.last_activity.is_some());
    }

    #[test]
    fn malformed_payload_produces_no_reading() {
        let (tx, mut rx) = message_queue();
        let (status_tx, status_rx) = status_channel();

        handle_payload(b"{asap: 1", &tx, &status_tx);
        handle_payload(b"", &tx, &status_tx);

        assert!(rx.try_dequeue_all().is_empty());
        let status = status_rx.borrow();
        assert_eq!(status.messages_received, 0);
        assert_eq!(status.messages_rejected, 2);
    }

    #[test]
    fn malformed_payload_leaves_state_untouched() {
        use crate::bridge::reducer::StateReducer;

        let (tx, rx) = message_queue();
        let (status_tx, _status_rx) = status_channel();
        let mut reducer = StateReducer::new(rx);

        handle_payload(br#"{"asap":10,"cahaya":5,"suhu":21.0}"#, &tx, &status_tx);
        reducer.reduce();
        let before = reducer.state().clone();

        handle_payload(b"\xde\xad\xbe\xef", &tx, &status_tx);
        handle_payload(br#"{"suhu":"warm"}"#, &tx, &status_tx);
        assert_eq!(reducer.reduce(), 0);
        assert_eq!(reducer.state(), &before);
    }

    #[test]
    fn closed_queue_does_not_count_reading() {
        let (tx, rx) = message_queue();
        let (status_tx, status_rx) = status_channel();
        drop(rx);

        handle_payload(br#"{"asap":1}"#, &tx, &status_tx);

        assert_eq!(status_rx.borrow().messages_received, 0);
    }
}
