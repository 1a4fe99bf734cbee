use tracing::debug;

use super::queue::QueueConsumer;
use crate::sensor::{SensorReading, SensorState};

/// Folds queued readings into [`SensorState`].
///
/// Owns the consumer end of the hand-off queue and the state itself, so the
/// state can only change through [`StateReducer::reduce`].
#[derive(Debug)]
pub struct StateReducer {
    consumer: QueueConsumer<SensorReading>,
    state: SensorState,
}

impl StateReducer {
    pub fn new(consumer: QueueConsumer<SensorReading>) -> Self {
        StateReducer {
            consumer,
            state: SensorState::new(),
        }
    }

    /// Drains the queue and folds every reading in arrival order.
    ///
    /// Returns the number of readings folded. Never waits on an empty queue.
    pub fn reduce(&mut self) -> usize {
        let readings = self.consumer.try_dequeue_all();
        for reading in &readings {
            self.state.fold(reading);
        }
        if !readings.is_empty() {
            debug!(
                "Folded {} reading(s), history length {}",
                readings.len(),
                self.state.len()
            );
        }
        readings.len()
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }
}
