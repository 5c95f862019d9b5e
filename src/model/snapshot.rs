//! Observer seam: an optional per-tick sink for simulation state.

use crate::tasks::locomotion::Observation;

/// Receives one snapshot per sampled tick. Implementations must be cheap or
/// buffer internally; the driver calls synchronously and never skips a
/// listener error because there is none to return.
pub trait SnapshotListener {
    fn on_snapshot(&mut self, time: f64, observation: &Observation);
}

/// Sink used when no consumer is interested.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl SnapshotListener for NoopListener {
    fn on_snapshot(&mut self, _time: f64, _observation: &Observation) {}
}

/// Buffers every snapshot it sees; handy for tests and offline export.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    pub snapshots: Vec<(f64, Observation)>,
}

impl SnapshotListener for RecordingListener {
    fn on_snapshot(&mut self, time: f64, observation: &Observation) {
        self.snapshots.push((time, observation.clone()));
    }
}
