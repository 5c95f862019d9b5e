use serde::{Deserialize, Serialize};

use crate::model::body::{BodyUnit, UnitState};
use crate::model::controller::Parametrized;
use crate::model::errors::Result;
use crate::model::grid::Grid;
use crate::model::sensing::Sensing;

/// A sensorized body grid wired to its controllers — the unit of simulation.
///
/// `Clone` produces a fully independent robot: its own body grid, controller
/// state and signal buffers, so cloned robots can be evaluated in parallel
/// without sharing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    body: Grid<BodyUnit>,
    sensing: Sensing,
}

impl Robot {
    pub fn new(body: Grid<BodyUnit>, sensing: Sensing) -> Self {
        Self { body, sensing }
    }

    /// Rectangular all-standard-sensor body, the built-in demo shape.
    pub fn rectangle_body(width: usize, height: usize) -> Grid<BodyUnit> {
        let mut body = Grid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                body.set(x, y, Some(BodyUnit::standard()));
            }
        }
        body
    }

    pub fn body(&self) -> &Grid<BodyUnit> {
        &self.body
    }

    pub fn sensing(&self) -> &Sensing {
        &self.sensing
    }

    /// One control tick: per-unit physical state in, per-unit actuation out.
    pub fn control_step(&mut self, states: &Grid<UnitState>) -> Result<Grid<f64>> {
        self.sensing.control_step(&mut self.body, states)
    }

    /// Clears controller state and actuation history for a fresh run.
    pub fn reset(&mut self) {
        self.sensing.reset();
        for (_, _, unit) in self.body.iter_mut() {
            unit.last_actuation = 0.0;
        }
    }
}

impl Parametrized for Robot {
    fn params(&self) -> Vec<f64> {
        self.sensing.params()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        self.sensing.set_params(params)
    }

    fn param_count(&self) -> usize {
        self.sensing.param_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::activation::ActivationFunction;
    use crate::model::controller::{Controller, MultiLayerPerceptron};
    use crate::model::sensing::CentralizedSensing;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn worm() -> Robot {
        let body = Robot::rectangle_body(2, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let net = MultiLayerPerceptron::new_random(
            vec![CentralizedSensing::input_dim_for(&body, false), 2],
            ActivationFunction::Tanh,
            &mut rng,
        )
        .unwrap();
        let sensing =
            Sensing::Centralized(CentralizedSensing::new(Controller::Mlp(net), &body, false).unwrap());
        Robot::new(body, sensing)
    }

    #[test]
    fn test_robot_clone_is_deeply_independent() {
        let mut original = worm();
        let mut copy = original.clone();
        let states = original.body.map(|_, _, _| UnitState::default());
        copy.control_step(&states).unwrap();
        copy.set_params(&vec![0.0; copy.param_count()]).unwrap();
        assert_ne!(
            original.params(),
            copy.params(),
            "Mutating the clone must not touch the original"
        );
        // original still produces its own outputs
        let out = original.control_step(&states).unwrap();
        assert_eq!(out.count(), 2);
    }

    #[test]
    fn test_robot_params_roundtrip() {
        let mut robot = worm();
        let params = robot.params();
        robot.set_params(&params).unwrap();
        assert_eq!(robot.params(), params);
    }
}
