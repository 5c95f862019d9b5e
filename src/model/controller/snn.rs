use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::controller::converters::{SpikeToValueConverter, ValueToSpikeConverter};
use crate::model::controller::{check_len, Parametrized};
use crate::model::errors::{ControlError, Result};

/// Input current magnitude accepted by a neuron in one sub-step.
const CURRENT_RANGE: (f64, f64) = (-10.0, 10.0);

/// Neuron model chosen for a whole network at construction time.
///
/// Model constants are fixed; they are neuron-local state, never part of the
/// trained parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum NeuronModel {
    /// Leaky integrate-and-fire, optionally with homeostatic threshold
    /// adaptation (the threshold offset rises on each spike and decays back).
    LeakyIntegrateAndFire { homeostatic: bool },
    /// Two-variable adaptive model (regular-spiking constants).
    Izhikevich,
}

/// One spiking unit: membrane state evolved sub-step by sub-step; spike
/// events are instantaneous threshold crossings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpikingNeuron {
    Lif {
        potential: f64,
        threshold_offset: f64,
        homeostatic: bool,
    },
    Izhikevich {
        v: f64,
        u: f64,
    },
}

impl SpikingNeuron {
    const LIF_THRESHOLD: f64 = 1.0;
    const LIF_REST: f64 = 0.0;
    const LIF_TAU: f64 = 0.05;
    const LIF_THETA_STEP: f64 = 0.2;
    const LIF_THETA_TAU: f64 = 0.5;

    const IZH_A: f64 = 0.02;
    const IZH_B: f64 = 0.2;
    const IZH_C: f64 = -65.0;
    const IZH_D: f64 = 8.0;
    const IZH_PEAK: f64 = 30.0;
    const IZH_CURRENT_GAIN: f64 = 15.0;

    fn new(model: NeuronModel) -> Self {
        match model {
            NeuronModel::LeakyIntegrateAndFire { homeostatic } => SpikingNeuron::Lif {
                potential: Self::LIF_REST,
                threshold_offset: 0.0,
                homeostatic,
            },
            NeuronModel::Izhikevich => SpikingNeuron::Izhikevich {
                v: Self::IZH_C,
                u: Self::IZH_B * Self::IZH_C,
            },
        }
    }

    /// Integrates one sub-step of `dt` seconds; returns true on spike.
    fn step(&mut self, input_current: f64, dt: f64) -> bool {
        let current = input_current.clamp(CURRENT_RANGE.0, CURRENT_RANGE.1);
        if current != input_current {
            tracing::debug!(input_current, "synaptic current out of range, clamping");
        }
        match self {
            SpikingNeuron::Lif {
                potential,
                threshold_offset,
                homeostatic,
            } => {
                *potential = *potential * (-dt / Self::LIF_TAU).exp() + current;
                let fired = *potential >= Self::LIF_THRESHOLD + *threshold_offset;
                if fired {
                    *potential = Self::LIF_REST;
                    if *homeostatic {
                        *threshold_offset += Self::LIF_THETA_STEP;
                    }
                }
                if *homeostatic {
                    *threshold_offset *= (-dt / Self::LIF_THETA_TAU).exp();
                }
                fired
            }
            SpikingNeuron::Izhikevich { v, u } => {
                // Izhikevich's equations are stated in millisecond time.
                let dt_ms = dt * 1000.0;
                let i = current * Self::IZH_CURRENT_GAIN;
                *v += dt_ms * (0.04 * *v * *v + 5.0 * *v + 140.0 - *u + i);
                *u += dt_ms * (Self::IZH_A * (Self::IZH_B * *v - *u));
                if *v >= Self::IZH_PEAK {
                    *v = Self::IZH_C;
                    *u += Self::IZH_D;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn reset(&mut self) {
        match self {
            SpikingNeuron::Lif {
                potential,
                threshold_offset,
                ..
            } => {
                *potential = Self::LIF_REST;
                *threshold_offset = 0.0;
            }
            SpikingNeuron::Izhikevich { v, u } => {
                *v = Self::IZH_C;
                *u = Self::IZH_B * Self::IZH_C;
            }
        }
    }
}

/// Layered spiking network bracketed by analog/spike converters.
///
/// Per control tick, `substeps` simulation sub-steps run: every analog input
/// is rate-coded into a spike train by its own encoder, spikes propagate
/// through the layers, and the last layer's trains are decoded back to
/// analog outputs. Only the inter-neuron weights are trainable; flat layout
/// is layer by layer, presynaptic-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikingNetwork {
    input_dim: usize,
    layer_sizes: Vec<usize>,
    weights: Vec<Vec<f64>>,
    neurons: Vec<Vec<SpikingNeuron>>,
    encoders: Vec<ValueToSpikeConverter>,
    decoders: Vec<SpikeToValueConverter>,
    substeps: usize,
    substep_dt: f64,
}

impl SpikingNetwork {
    /// Zero-weight network. `layer_sizes` lists every spiking layer; the
    /// last one is the output layer, decoded over `decode_window` sub-steps.
    pub fn new(
        input_dim: usize,
        layer_sizes: Vec<usize>,
        model: NeuronModel,
        substeps: usize,
        substep_dt: f64,
        decode_window: usize,
    ) -> Result<Self> {
        if input_dim == 0 || layer_sizes.is_empty() || layer_sizes.iter().any(|&n| n == 0) {
            return Err(ControlError::InvalidArchitecture(
                "spiking network needs inputs and non-empty layers".to_string(),
            ));
        }
        if substeps == 0 || substep_dt <= 0.0 {
            return Err(ControlError::InvalidArchitecture(format!(
                "invalid sub-stepping: {substeps} steps of {substep_dt}s"
            )));
        }
        let mut weights = Vec::with_capacity(layer_sizes.len());
        let mut neurons = Vec::with_capacity(layer_sizes.len());
        let mut prev = input_dim;
        for &n in &layer_sizes {
            weights.push(vec![0.0; prev * n]);
            neurons.push((0..n).map(|_| SpikingNeuron::new(model)).collect());
            prev = n;
        }
        let output_dim = *layer_sizes.last().unwrap_or(&0);
        Ok(Self {
            input_dim,
            layer_sizes,
            weights,
            neurons,
            encoders: (0..input_dim).map(|_| ValueToSpikeConverter::new()).collect(),
            decoders: (0..output_dim)
                .map(|_| SpikeToValueConverter::new(decode_window))
                .collect(),
            substeps,
            substep_dt,
        })
    }

    pub fn new_random(
        input_dim: usize,
        layer_sizes: Vec<usize>,
        model: NeuronModel,
        substeps: usize,
        substep_dt: f64,
        decode_window: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let mut net = Self::new(
            input_dim,
            layer_sizes,
            model,
            substeps,
            substep_dt,
            decode_window,
        )?;
        let params: Vec<f64> = (0..net.param_count())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        net.set_params(&params)?;
        Ok(net)
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        *self.layer_sizes.last().unwrap_or(&0)
    }

    pub fn apply(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        check_len("input vector", self.input_dim, inputs.len())?;
        let mut outputs = vec![0.0; self.output_dim()];
        for _ in 0..self.substeps {
            let mut spikes: Vec<f64> = inputs
                .iter()
                .zip(self.encoders.iter_mut())
                .map(|(&v, enc)| {
                    if enc.encode(v, self.substep_dt) {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();
            for (layer, layer_weights) in self.neurons.iter_mut().zip(self.weights.iter()) {
                let dest = layer.len();
                let mut next = vec![0.0; dest];
                for (j, (neuron, out)) in layer.iter_mut().zip(next.iter_mut()).enumerate() {
                    let mut current = 0.0;
                    for (i, &s) in spikes.iter().enumerate() {
                        current += layer_weights[i * dest + j] * s;
                    }
                    if neuron.step(current, self.substep_dt) {
                        *out = 1.0;
                    }
                }
                spikes = next;
            }
            for (j, dec) in self.decoders.iter_mut().enumerate() {
                outputs[j] = dec.decode(spikes[j] > 0.5, self.substep_dt);
            }
        }
        Ok(outputs)
    }

    pub fn reset(&mut self) {
        for layer in &mut self.neurons {
            for n in layer {
                n.reset();
            }
        }
        for enc in &mut self.encoders {
            enc.reset();
        }
        for dec in &mut self.decoders {
            dec.reset();
        }
    }
}

impl Parametrized for SpikingNetwork {
    fn params(&self) -> Vec<f64> {
        self.weights.iter().flatten().copied().collect()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        check_len("parameter vector", self.param_count(), params.len())?;
        let mut offset = 0;
        for layer in &mut self.weights {
            let len = layer.len();
            layer.copy_from_slice(&params[offset..offset + len]);
            offset += len;
        }
        Ok(())
    }

    fn param_count(&self) -> usize {
        self.weights.iter().map(Vec::len).sum()
    }
}
