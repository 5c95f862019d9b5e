//! Neural controllers: vector-to-vector functions with a flat parameter
//! contract.
//!
//! Every controller is a pure function of (inputs, internal state, parameters).
//! External optimizers only ever see `params()` / `set_params()`; the flat
//! layout per variant is fixed and documented on each type.

pub mod converters;
pub mod mlp;
pub mod rnn;
pub mod snn;

use serde::{Deserialize, Serialize};

use crate::model::errors::{ControlError, Result};
pub use mlp::MultiLayerPerceptron;
pub use rnn::RecurrentNetwork;
pub use snn::{NeuronModel, SpikingNetwork};

/// Flat parameter vector get/set, the sole contract an optimizer needs.
pub trait Parametrized {
    fn params(&self) -> Vec<f64>;
    fn set_params(&mut self, params: &[f64]) -> Result<()>;
    fn param_count(&self) -> usize;
}

/// Closed set of controller variants, selected at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Controller {
    Mlp(MultiLayerPerceptron),
    Rnn(RecurrentNetwork),
    Spiking(SpikingNetwork),
}

impl Controller {
    /// Maps an input vector to an output vector, advancing internal state.
    pub fn apply(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        match self {
            Controller::Mlp(net) => net.apply(inputs),
            Controller::Rnn(net) => net.apply(inputs),
            Controller::Spiking(net) => net.apply(inputs),
        }
    }

    pub fn input_dim(&self) -> usize {
        match self {
            Controller::Mlp(net) => net.input_dim(),
            Controller::Rnn(net) => net.input_dim(),
            Controller::Spiking(net) => net.input_dim(),
        }
    }

    pub fn output_dim(&self) -> usize {
        match self {
            Controller::Mlp(net) => net.output_dim(),
            Controller::Rnn(net) => net.output_dim(),
            Controller::Spiking(net) => net.output_dim(),
        }
    }

    /// Clears internal state (recurrent activations, membrane potentials,
    /// converter histories). A no-op for the stateless perceptron.
    pub fn reset(&mut self) {
        match self {
            Controller::Mlp(_) => {}
            Controller::Rnn(net) => net.reset(),
            Controller::Spiking(net) => net.reset(),
        }
    }
}

impl Parametrized for Controller {
    fn params(&self) -> Vec<f64> {
        match self {
            Controller::Mlp(net) => net.params(),
            Controller::Rnn(net) => net.params(),
            Controller::Spiking(net) => net.params(),
        }
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        match self {
            Controller::Mlp(net) => net.set_params(params),
            Controller::Rnn(net) => net.set_params(params),
            Controller::Spiking(net) => net.set_params(params),
        }
    }

    fn param_count(&self) -> usize {
        match self {
            Controller::Mlp(net) => net.param_count(),
            Controller::Rnn(net) => net.param_count(),
            Controller::Spiking(net) => net.param_count(),
        }
    }
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ControlError::shape(what, expected, actual));
    }
    Ok(())
}
