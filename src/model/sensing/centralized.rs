use serde::{Deserialize, Serialize};

use crate::model::body::{BodyUnit, UnitState};
use crate::model::controller::Controller;
use crate::model::errors::{ControlError, Result};
use crate::model::grid::Grid;

/// One controller for the whole body.
///
/// Sensor readings of every occupied cell are flattened in row-major
/// unit-then-channel order into a single input vector; each output slot
/// drives exactly one unit's actuator, in the same order. With
/// `actuation_feedback` each unit's previous actuation is appended as one
/// extra input channel per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralizedSensing {
    controller: Controller,
    actuation_feedback: bool,
}

impl CentralizedSensing {
    /// Binds a controller to a body grid, validating its dimensions.
    pub fn new(
        controller: Controller,
        body: &Grid<BodyUnit>,
        actuation_feedback: bool,
    ) -> Result<Self> {
        let expected_in = Self::input_dim_for(body, actuation_feedback);
        if controller.input_dim() != expected_in {
            return Err(ControlError::shape(
                "controller input",
                expected_in,
                controller.input_dim(),
            ));
        }
        let expected_out = Self::output_dim_for(body);
        if controller.output_dim() != expected_out {
            return Err(ControlError::shape(
                "controller output",
                expected_out,
                controller.output_dim(),
            ));
        }
        Ok(Self {
            controller,
            actuation_feedback,
        })
    }

    /// Input vector length a controller must have for this body.
    pub fn input_dim_for(body: &Grid<BodyUnit>, actuation_feedback: bool) -> usize {
        let channels: usize = body.iter().map(|(_, _, u)| u.channel_count()).sum();
        if actuation_feedback {
            channels + body.count()
        } else {
            channels
        }
    }

    /// One actuation slot per occupied cell.
    pub fn output_dim_for(body: &Grid<BodyUnit>) -> usize {
        body.count()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn control_step(
        &mut self,
        body: &mut Grid<BodyUnit>,
        states: &Grid<UnitState>,
    ) -> Result<Grid<f64>> {
        let mut inputs = Vec::with_capacity(self.controller.input_dim());
        for (x, y, unit) in body.iter() {
            let state = states.get(x, y).copied().unwrap_or_default();
            unit.read(&state, &mut inputs);
            if self.actuation_feedback {
                inputs.push(unit.last_actuation);
            }
        }
        let outputs = self.controller.apply(&inputs)?;
        let mut actuations = Grid::new(body.width(), body.height());
        for (slot, (x, y, unit)) in body.iter_mut().enumerate() {
            let command = outputs[slot].clamp(-1.0, 1.0);
            unit.last_actuation = command;
            actuations.set(x, y, Some(command));
        }
        Ok(actuations)
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::activation::ActivationFunction;
    use crate::model::controller::MultiLayerPerceptron;

    fn two_unit_body() -> Grid<BodyUnit> {
        let mut body = Grid::new(2, 1);
        body.set(0, 0, Some(BodyUnit::standard()));
        body.set(1, 0, Some(BodyUnit::standard()));
        body
    }

    #[test]
    fn test_input_dim_sums_channels() {
        let body = two_unit_body();
        assert_eq!(CentralizedSensing::input_dim_for(&body, false), 8);
        assert_eq!(
            CentralizedSensing::input_dim_for(&body, true),
            10,
            "Feedback adds one channel per unit"
        );
        assert_eq!(CentralizedSensing::output_dim_for(&body), 2);
    }

    #[test]
    fn test_mismatched_controller_rejected_at_construction() {
        let body = two_unit_body();
        let net = MultiLayerPerceptron::new(vec![3, 2], ActivationFunction::Tanh).unwrap();
        let err = CentralizedSensing::new(Controller::Mlp(net), &body, false).unwrap_err();
        assert!(matches!(err, ControlError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_control_step_writes_every_unit() {
        let mut body = two_unit_body();
        let net = MultiLayerPerceptron::new(vec![8, 2], ActivationFunction::Tanh).unwrap();
        let mut sensing = CentralizedSensing::new(Controller::Mlp(net), &body, false).unwrap();
        let states = body.map(|_, _, _| UnitState::default());
        let actuations = sensing.control_step(&mut body, &states).unwrap();
        assert_eq!(actuations.count(), 2);
        for (_, _, unit) in body.iter() {
            assert_eq!(unit.last_actuation, 0.0);
        }
    }
}
