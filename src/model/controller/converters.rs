//! Analog/spike adapters for the spiking controller.
//!
//! One sub-step at a time: the encoder turns a bounded analog value into a
//! spike/no-spike event, the decoder folds spike events back into an analog
//! value by windowed rate. Out-of-range inputs are clamped and logged, never
//! fatal, because physics feedback can transiently overshoot nominal ranges.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Analog input domain accepted by the encoder.
pub const VALUE_RANGE: (f64, f64) = (-1.0, 1.0);

/// Spike frequency range the analog domain maps onto, in Hz.
pub const FREQUENCY_RANGE: (f64, f64) = (0.0, 100.0);

/// Rate-coding encoder with short-term memory of the residual encoding
/// error ("uniform with memory"): the fractional spike count that cannot be
/// emitted this sub-step is carried to the next, so the long-run spike rate
/// converges to the requested frequency exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueToSpikeConverter {
    residual: f64,
}

impl ValueToSpikeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes one sub-step of duration `dt` seconds.
    pub fn encode(&mut self, value: f64, dt: f64) -> bool {
        let (lo, hi) = VALUE_RANGE;
        let clamped = value.clamp(lo, hi);
        if clamped != value {
            tracing::debug!(value, "analog value outside [{lo}, {hi}], clamping");
        }
        let norm = (clamped - lo) / (hi - lo);
        let frequency = FREQUENCY_RANGE.0 + norm * (FREQUENCY_RANGE.1 - FREQUENCY_RANGE.0);
        self.residual += frequency * dt;
        if self.residual >= 1.0 {
            self.residual -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.residual = 0.0;
    }
}

/// Windowed moving-average decoder: keeps the last `window` sub-step spike
/// events and reports the observed rate rescaled back into the analog
/// domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeToValueConverter {
    window: usize,
    #[serde(skip)]
    history: VecDeque<bool>,
}

impl SpikeToValueConverter {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            history: VecDeque::new(),
        }
    }

    /// Records one sub-step and returns the current decoded value.
    pub fn decode(&mut self, spike: bool, dt: f64) -> f64 {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(spike);
        let spikes = self.history.iter().filter(|&&s| s).count() as f64;
        let rate = spikes / (self.history.len() as f64 * dt);
        let norm = ((rate - FREQUENCY_RANGE.0) / (FREQUENCY_RANGE.1 - FREQUENCY_RANGE.0))
            .clamp(0.0, 1.0);
        let (lo, hi) = VALUE_RANGE;
        lo + norm * (hi - lo)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
