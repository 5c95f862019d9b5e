use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::activation::ActivationFunction;
use crate::model::controller::{check_len, Parametrized};
use crate::model::errors::{ControlError, Result};

/// Leak constant blending each recurrent neuron's new activation with its
/// previous one; implements the short-term memory trace.
const LEAK: f64 = 0.01;

/// Single-hidden-layer recurrent network.
///
/// The recurrent layer is fully laterally connected except for self-loops:
/// a recurrent neuron has no weight onto itself, so the lateral block holds
/// `r * (r - 1)` trainable entries. Flat parameter layout is input weights
/// (`input * r`, presynaptic-major), then lateral weights row-major with the
/// diagonal skipped, then output weights (`r * output`).
///
/// Each `apply` reads the lateral contributions from the *previous* tick's
/// recurrent activations, then updates them with an exponential moving
/// average: `v' = (1 - LEAK) * act(synaptic) + LEAK * v`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrentNetwork {
    input_neurons: usize,
    recurrent_neurons: usize,
    output_neurons: usize,
    activation: ActivationFunction,
    /// `input_weights[k * r + i]`: input neuron `k` -> recurrent neuron `i`.
    input_weights: Vec<f64>,
    /// Full `r x r` block; the diagonal stays zero and is never trained.
    recurrent_weights: Vec<f64>,
    /// `output_weights[i * o + j]`: recurrent neuron `i` -> output neuron `j`.
    output_weights: Vec<f64>,
    input_values: Vec<f64>,
    recurrent_values: Vec<f64>,
    output_values: Vec<f64>,
}

impl RecurrentNetwork {
    pub fn new(
        input_neurons: usize,
        recurrent_neurons: usize,
        output_neurons: usize,
        activation: ActivationFunction,
    ) -> Result<Self> {
        if input_neurons == 0 || recurrent_neurons == 0 || output_neurons == 0 {
            return Err(ControlError::InvalidArchitecture(
                "neuron counts must be positive".to_string(),
            ));
        }
        let mut net = Self {
            input_neurons,
            recurrent_neurons,
            output_neurons,
            activation,
            input_weights: vec![0.0; input_neurons * recurrent_neurons],
            recurrent_weights: vec![0.0; recurrent_neurons * recurrent_neurons],
            output_weights: vec![0.0; recurrent_neurons * output_neurons],
            input_values: Vec::new(),
            recurrent_values: Vec::new(),
            output_values: Vec::new(),
        };
        net.reset();
        Ok(net)
    }

    pub fn new_random(
        input_neurons: usize,
        recurrent_neurons: usize,
        output_neurons: usize,
        activation: ActivationFunction,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let mut net = Self::new(input_neurons, recurrent_neurons, output_neurons, activation)?;
        let params: Vec<f64> = (0..net.param_count())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        net.set_params(&params)?;
        Ok(net)
    }

    /// Trainable weight count for a given topology.
    pub fn count_weights(
        input_neurons: usize,
        recurrent_neurons: usize,
        output_neurons: usize,
    ) -> usize {
        input_neurons * recurrent_neurons
            + recurrent_neurons * (recurrent_neurons - 1)
            + recurrent_neurons * output_neurons
    }

    pub fn input_dim(&self) -> usize {
        self.input_neurons
    }

    pub fn output_dim(&self) -> usize {
        self.output_neurons
    }

    /// Current recurrent activations, exposed for state snapshots.
    pub fn recurrent_values(&self) -> &[f64] {
        &self.recurrent_values
    }

    pub fn apply(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        check_len("input vector", self.input_neurons, inputs.len())?;
        let r = self.recurrent_neurons;
        for (i, &x) in inputs.iter().enumerate() {
            self.input_values[i] = self.activation.apply(x);
        }
        let mut synaptic = vec![0.0; r];
        for (i, s) in synaptic.iter_mut().enumerate() {
            for (k, &v) in self.input_values.iter().enumerate() {
                *s += self.input_weights[k * r + i] * v;
            }
            for (j, &v) in self.recurrent_values.iter().enumerate() {
                if j == i {
                    continue;
                }
                *s += self.recurrent_weights[j * r + i] * v;
            }
        }
        for (i, &s) in synaptic.iter().enumerate() {
            self.recurrent_values[i] =
                (1.0 - LEAK) * self.activation.apply(s) + LEAK * self.recurrent_values[i];
        }
        let mut outputs = vec![0.0; self.output_neurons];
        for (i, &v) in self.recurrent_values.iter().enumerate() {
            for (j, out) in outputs.iter_mut().enumerate() {
                *out += self.output_weights[i * self.output_neurons + j] * v;
            }
        }
        for (j, out) in outputs.iter_mut().enumerate() {
            *out = self.activation.apply(*out);
            self.output_values[j] = *out;
        }
        Ok(outputs)
    }

    pub fn reset(&mut self) {
        self.input_values = vec![0.0; self.input_neurons];
        self.recurrent_values = vec![0.0; self.recurrent_neurons];
        self.output_values = vec![0.0; self.output_neurons];
    }
}

impl Parametrized for RecurrentNetwork {
    fn params(&self) -> Vec<f64> {
        let r = self.recurrent_neurons;
        let mut flat = Vec::with_capacity(self.param_count());
        flat.extend_from_slice(&self.input_weights);
        for i in 0..r {
            for j in 0..r {
                if i == j {
                    continue;
                }
                flat.push(self.recurrent_weights[i * r + j]);
            }
        }
        flat.extend_from_slice(&self.output_weights);
        flat
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        check_len("parameter vector", self.param_count(), params.len())?;
        let r = self.recurrent_neurons;
        let input_len = self.input_weights.len();
        self.input_weights.copy_from_slice(&params[..input_len]);
        let mut idx = input_len;
        for i in 0..r {
            for j in 0..r {
                if i == j {
                    continue;
                }
                self.recurrent_weights[i * r + j] = params[idx];
                idx += 1;
            }
        }
        self.output_weights.copy_from_slice(&params[idx..]);
        Ok(())
    }

    fn param_count(&self) -> usize {
        Self::count_weights(
            self.input_neurons,
            self.recurrent_neurons,
            self.output_neurons,
        )
    }
}
