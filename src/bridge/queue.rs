//! Hand-off queue between the subscriber task and the UI thread
//!
//! Thin wrapper over [`tokio::sync::mpsc::unbounded_channel`]. The producer
//! side never blocks and the consumer side only ever polls, so neither the
//! async worker nor the synchronous render loop has to take a lock.
//!
//! The queue has no capacity bound. A producer that outpaces the consumer
//! grows memory without limit.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

use crate::error::BridgeError;

/// Creates a connected producer/consumer pair.
pub fn message_queue<T>() -> (QueueProducer<T>, QueueConsumer<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueProducer { tx }, QueueConsumer { rx })
}

#[derive(Debug)]
pub struct QueueProducer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for QueueProducer<T> {
    fn clone(&self) -> Self {
        QueueProducer {
            tx: self.tx.clone(),
        }
    }
}

impl<T> QueueProducer<T> {
    /// Appends `item` without blocking.
    ///
    /// Fails only when the consumer has been dropped; the item is discarded.
    pub fn enqueue(&self, item: T) -> Result<(), BridgeError> {
        self.tx.send(item).map_err(|_| {
            debug!("Consumer dropped, discarding queued item");
            BridgeError::QueueClosed
        })
    }
}

#[derive(Debug)]
pub struct QueueConsumer<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> QueueConsumer<T> {
    /// Takes every item currently available, oldest first.
    ///
    /// Returns an empty vector instead of waiting when nothing is queued.
    pub fn try_dequeue_all(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(item) => items.push(item),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn dequeue_on_empty_queue_returns_nothing() {
        let (_tx, mut rx) = message_queue::<u32>();
        assert!(rx.try_dequeue_all().is_empty());
    }

    #[test]
    fn dequeue_preserves_fifo_order_and_empties_queue() {
        let (tx, mut rx) = message_queue();
        for i in 0..5 {
            tx.enqueue(i).unwrap();
        }
        assert_eq!(rx.try_dequeue_all(), vec![0, 1, 2, 3, 4]);
        assert!(rx.try_dequeue_all().is_empty());
    }

    #[test]
    fn enqueue_after_consumer_drop_reports_closed() {
        let (tx, rx) = message_queue();
        drop(rx);
        assert!(matches!(tx.enqueue(1), Err(BridgeError::QueueClosed)));
    }

    #[test]
    fn items_remain_available_after_producer_drop() {
        let (tx, mut rx) = message_queue();
        tx.enqueue("a").unwrap();
        tx.enqueue("b").unwrap();
        drop(tx);
        assert_eq!(rx.try_dequeue_all(), vec!["a", "b"]);
    }

    #[test]
    fn concurrent_producer_loses_nothing() {
        const COUNT: usize = 10_000;
        let (tx, mut rx) = message_queue();

        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                tx.enqueue(i).unwrap();
            }
        });

        let mut received = Vec::with_capacity(COUNT);
        while !producer.is_finished() {
            received.extend(rx.try_dequeue_all());
        }
        producer.join().unwrap();
        received.extend(rx.try_dequeue_all());

        assert_eq!(received, (0..COUNT).collect::<Vec<_>>());
        assert!(rx.try_dequeue_all().is_empty());
    }
}
