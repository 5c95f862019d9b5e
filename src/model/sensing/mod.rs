//! Sensing topologies: how a body grid's sensors feed controllers and how
//! controller outputs drive actuators.

pub mod centralized;
pub mod distributed;

use serde::{Deserialize, Serialize};

use crate::model::body::{BodyUnit, UnitState};
use crate::model::controller::Parametrized;
use crate::model::errors::Result;
use crate::model::grid::Grid;
pub use centralized::CentralizedSensing;
pub use distributed::DistributedSensing;

/// Closed set of sensing schemes, fixed once bound to a body grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "topology", rename_all = "snake_case")]
pub enum Sensing {
    Centralized(CentralizedSensing),
    Distributed(DistributedSensing),
}

impl Sensing {
    /// One control tick: gather sensor readings, run the controller(s),
    /// scatter actuation commands back onto the body grid.
    ///
    /// Returns the per-unit actuation in `[-1, 1]` for every occupied cell.
    pub fn control_step(
        &mut self,
        body: &mut Grid<BodyUnit>,
        states: &Grid<UnitState>,
    ) -> Result<Grid<f64>> {
        match self {
            Sensing::Centralized(s) => s.control_step(body, states),
            Sensing::Distributed(s) => s.control_step(body, states),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Sensing::Centralized(s) => s.reset(),
            Sensing::Distributed(s) => s.reset(),
        }
    }
}

impl Parametrized for Sensing {
    fn params(&self) -> Vec<f64> {
        match self {
            Sensing::Centralized(s) => s.controller().params(),
            Sensing::Distributed(s) => s.params(),
        }
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        match self {
            Sensing::Centralized(s) => s.controller_mut().set_params(params),
            Sensing::Distributed(s) => s.set_params(params),
        }
    }

    fn param_count(&self) -> usize {
        match self {
            Sensing::Centralized(s) => s.controller().param_count(),
            Sensing::Distributed(s) => s.param_count(),
        }
    }
}
