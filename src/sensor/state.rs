use chrono::{DateTime, Local};

use super::reading::SensorReading;

/// Latest value and full history of a single metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    latest: Option<f64>,
    last_known: Option<f64>,
    history: Vec<Option<f64>>,
}

impl MetricSeries {
    /// Most recent value supplied for this metric, `None` if the last
    /// reading did not carry it or nothing arrived yet.
    pub fn latest(&self) -> Option<f64> {
        self.latest
    }

    /// Most recent value that was actually present, skipping absent samples.
    pub fn last_known(&self) -> Option<f64> {
        self.last_known
    }

    pub fn history(&self) -> &[Option<f64>] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Points for plotting, indexed by arrival position. Absent samples are skipped.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.history
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| [i as f64, v]))
            .collect()
    }

    fn push(&mut self, value: Option<f64>) {
        self.latest = value;
        if value.is_some() {
            self.last_known = value;
        }
        self.history.push(value);
    }
}

/// Accumulated telemetry, owned by the state reducer.
///
/// All series grow together: after every [`SensorState::fold`] the three
/// histories and the timestamp column have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorState {
    smoke: MetricSeries,
    light: MetricSeries,
    temperature: MetricSeries,
    timestamps: Vec<DateTime<Local>>,
}

impl SensorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one reading into the state.
    ///
    /// An absent field still overwrites the latest value and appends an
    /// absent marker to its history.
    pub fn fold(&mut self, reading: &SensorReading) {
        self.smoke.push(reading.smoke);
        self.light.push(reading.light);
        self.temperature.push(reading.temperature);
        self.timestamps.push(reading.timestamp);
    }

    pub fn smoke(&self) -> &MetricSeries {
        &self.smoke
    }

    pub fn light(&self) -> &MetricSeries {
        &self.light
    }

    pub fn temperature(&self) -> &MetricSeries {
        &self.temperature
    }

    pub fn latest_smoke(&self) -> Option<f64> {
        self.smoke.latest()
    }

    pub fn latest_light(&self) -> Option<f64> {
        self.light.latest()
    }

    pub fn latest_temperature(&self) -> Option<f64> {
        self.temperature.latest()
    }

    pub fn timestamps(&self) -> &[DateTime<Local>] {
        &self.timestamps
    }

    /// Number of readings folded so far.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Row `index` of the history table: `(time, smoke, light, temperature)`.
    pub fn row(
        &self,
        index: usize,
    ) -> Option<(DateTime<Local>, Option<f64>, Option<f64>, Option<f64>)> {
        Some((
            *self.timestamps.get(index)?,
            *self.smoke.history.get(index)?,
            *self.light.history.get(index)?,
            *self.temperature.history.get(index)?,
        ))
    }
}
