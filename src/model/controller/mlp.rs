use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::activation::ActivationFunction;
use crate::model::controller::{check_len, Parametrized};
use crate::model::errors::{ControlError, Result};

/// Feed-forward multi-layer perceptron.
///
/// `neurons` lists the neuron count of every layer, input and output
/// included, so `[4, 6, 2]` is a 4-input, one-hidden-layer, 2-output net.
/// Weights for layer transition `l` are stored flat, presynaptic-major:
/// `weights[l][i * neurons[l + 1] + j]` connects neuron `i` of layer `l` to
/// neuron `j` of layer `l + 1`. Flat parameter layout is layer by layer,
/// weights then biases.
///
/// Stateless across ticks; `reset` has nothing to clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiLayerPerceptron {
    neurons: Vec<usize>,
    activation: ActivationFunction,
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
}

impl MultiLayerPerceptron {
    /// Zero-weight network with the given layer sizes.
    pub fn new(neurons: Vec<usize>, activation: ActivationFunction) -> Result<Self> {
        if neurons.len() < 2 {
            return Err(ControlError::InvalidArchitecture(format!(
                "at least input and output layers required, got {} layer(s)",
                neurons.len()
            )));
        }
        if neurons.iter().any(|&n| n == 0) {
            return Err(ControlError::InvalidArchitecture(
                "layer sizes must be positive".to_string(),
            ));
        }
        let weights = neurons
            .windows(2)
            .map(|w| vec![0.0; w[0] * w[1]])
            .collect();
        let biases = neurons[1..].iter().map(|&n| vec![0.0; n]).collect();
        Ok(Self {
            neurons,
            activation,
            weights,
            biases,
        })
    }

    /// Network with weights and biases drawn uniformly from `[-1, 1]`.
    pub fn new_random(
        neurons: Vec<usize>,
        activation: ActivationFunction,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let mut net = Self::new(neurons, activation)?;
        let params: Vec<f64> = (0..net.param_count())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        net.set_params(&params)?;
        Ok(net)
    }

    pub fn input_dim(&self) -> usize {
        self.neurons[0]
    }

    pub fn output_dim(&self) -> usize {
        *self.neurons.last().unwrap_or(&0)
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn apply(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        check_len("input vector", self.input_dim(), inputs.len())?;
        let mut values = inputs.to_vec();
        for l in 0..self.weights.len() {
            let dest = self.neurons[l + 1];
            let mut next = vec![0.0; dest];
            for (j, out) in next.iter_mut().enumerate() {
                let mut sum = self.biases[l][j];
                for (i, &v) in values.iter().enumerate() {
                    sum += v * self.weights[l][i * dest + j];
                }
                *out = self.activation.apply(sum);
            }
            values = next;
        }
        Ok(values)
    }
}

impl Parametrized for MultiLayerPerceptron {
    fn params(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.param_count());
        for l in 0..self.weights.len() {
            flat.extend_from_slice(&self.weights[l]);
            flat.extend_from_slice(&self.biases[l]);
        }
        flat
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        check_len("parameter vector", self.param_count(), params.len())?;
        let mut offset = 0;
        for l in 0..self.weights.len() {
            let w = self.weights[l].len();
            self.weights[l].copy_from_slice(&params[offset..offset + w]);
            offset += w;
            let b = self.biases[l].len();
            self.biases[l].copy_from_slice(&params[offset..offset + b]);
            offset += b;
        }
        Ok(())
    }

    fn param_count(&self) -> usize {
        self.neurons
            .windows(2)
            .map(|w| w[0] * w[1] + w[1])
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_mlp_rejects_degenerate_layers() {
        assert!(MultiLayerPerceptron::new(vec![3], ActivationFunction::Tanh).is_err());
        assert!(MultiLayerPerceptron::new(vec![3, 0, 2], ActivationFunction::Tanh).is_err());
    }

    #[test]
    fn test_mlp_param_count() {
        let net = MultiLayerPerceptron::new(vec![4, 6, 2], ActivationFunction::Tanh).unwrap();
        // 4*6 + 6 + 6*2 + 2
        assert_eq!(net.param_count(), 44);
    }

    #[test]
    fn test_mlp_zero_weights_give_activation_of_zero() {
        let mut net = MultiLayerPerceptron::new(vec![3, 3], ActivationFunction::Tanh).unwrap();
        let out = net.apply(&[0.7, -0.2, 1.0]).unwrap();
        assert_eq!(out, vec![0.0; 3], "All-zero affine maps should output tanh(0)");
    }

    #[test]
    fn test_mlp_input_length_checked() {
        let mut net = MultiLayerPerceptron::new(vec![4, 2], ActivationFunction::Tanh).unwrap();
        let err = net.apply(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ControlError::shape("input vector", 4, 2),
            "Short inputs must fail, not be padded"
        );
    }

    #[test]
    fn test_mlp_params_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut net =
            MultiLayerPerceptron::new_random(vec![5, 8, 3], ActivationFunction::Tanh, &mut rng)
                .unwrap();
        let before = net.params();
        net.set_params(&before).unwrap();
        assert_eq!(net.params(), before, "Flatten/unflatten must be bit-exact");
    }

    #[test]
    fn test_mlp_set_params_wrong_length_fails() {
        let mut net = MultiLayerPerceptron::new(vec![2, 2], ActivationFunction::Tanh).unwrap();
        let err = net.set_params(&[0.0; 3]).unwrap_err();
        assert!(matches!(err, ControlError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_mlp_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut net =
            MultiLayerPerceptron::new_random(vec![3, 5, 2], ActivationFunction::Tanh, &mut rng)
                .unwrap();
        let a = net.apply(&[0.1, 0.2, 0.3]).unwrap();
        let b = net.apply(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(a, b, "Stateless net must repeat outputs exactly");
    }

    #[test]
    fn test_mlp_no_hidden_layer() {
        let mut net = MultiLayerPerceptron::new(vec![2, 2], ActivationFunction::Tanh).unwrap();
        let mut params = vec![0.0; net.param_count()];
        params[0] = 1.0; // input 0 -> output 0
        net.set_params(&params).unwrap();
        let out = net.apply(&[0.5, 0.0]).unwrap();
        assert!((out[0] - 0.5f64.tanh()).abs() < 1e-12);
        assert_eq!(out[1], 0.0);
    }
}
