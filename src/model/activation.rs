use serde::{Deserialize, Serialize};

/// Elementwise activation applied after each affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[default]
    Tanh,
    Sigmoid,
    Relu,
    Sin,
}

impl ActivationFunction {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Relu => x.max(0.0),
            ActivationFunction::Sin => x.sin(),
        }
    }

    /// Output range, used by consumers that need to rescale activations.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            ActivationFunction::Tanh => (-1.0, 1.0),
            ActivationFunction::Sigmoid => (0.0, 1.0),
            ActivationFunction::Relu => (0.0, f64::INFINITY),
            ActivationFunction::Sin => (-1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tanh_is_bounded() {
        let act = ActivationFunction::Tanh;
        for &x in &[-100.0, -1.0, 0.0, 1.0, 100.0] {
            let y = act.apply(x);
            assert!((-1.0..=1.0).contains(&y), "tanh({x}) out of range: {y}");
        }
    }

    #[test]
    fn test_sigmoid_midpoint() {
        let y = ActivationFunction::Sigmoid.apply(0.0);
        assert!((y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_relu_clips_negative() {
        assert_eq!(ActivationFunction::Relu.apply(-3.0), 0.0);
        assert_eq!(ActivationFunction::Relu.apply(2.5), 2.5);
    }
}
