use serde::{Deserialize, Serialize};

use crate::model::body::{BodyUnit, UnitState};
use crate::model::controller::{Controller, Parametrized};
use crate::model::errors::{ControlError, Result};
use crate::model::grid::Grid;

/// Neighbor directions in fixed slot order: north, east, south, west.
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// One controller per body unit with synchronous, one-tick-delayed message
/// passing between four-neighbors.
///
/// Every unit reads its own sensors plus `comm_channels` signals per
/// direction, all taken from the neighbors' outputs of the *previous* tick;
/// it emits its own actuation plus `comm_channels` outgoing signals per
/// direction for the next tick. The delay is structurally enforced by a
/// double-buffered signal grid: the step reads one buffer and writes a fresh
/// one, so intra-tick ordering cannot leak. The spiking variant is the same
/// topology with a `Controller::Spiking` in every cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedSensing {
    controllers: Grid<Controller>,
    comm_channels: usize,
    /// Outgoing signals of the previous tick, `4 * comm_channels` per unit
    /// in direction-major order.
    signals: Grid<Vec<f64>>,
}

impl DistributedSensing {
    /// Builds one controller per occupied cell via `make(input_dim,
    /// output_dim)`, validating each returned controller's dimensions.
    pub fn new(
        body: &Grid<BodyUnit>,
        comm_channels: usize,
        mut make: impl FnMut(usize, usize) -> Result<Controller>,
    ) -> Result<Self> {
        let mut controllers = Grid::new(body.width(), body.height());
        for (x, y, unit) in body.iter() {
            let input_dim = Self::input_dim_for(unit, comm_channels);
            let output_dim = Self::output_dim_for(comm_channels);
            let controller = make(input_dim, output_dim)?;
            if controller.input_dim() != input_dim {
                return Err(ControlError::shape(
                    "unit controller input",
                    input_dim,
                    controller.input_dim(),
                ));
            }
            if controller.output_dim() != output_dim {
                return Err(ControlError::shape(
                    "unit controller output",
                    output_dim,
                    controller.output_dim(),
                ));
            }
            controllers.set(x, y, Some(controller));
        }
        let signals = body.map(|_, _, _| vec![0.0; 4 * comm_channels]);
        Ok(Self {
            controllers,
            comm_channels,
            signals,
        })
    }

    /// Own sensors plus one block of signals per neighbor direction.
    pub fn input_dim_for(unit: &BodyUnit, comm_channels: usize) -> usize {
        unit.channel_count() + 4 * comm_channels
    }

    /// Own actuation plus one block of signals per neighbor direction.
    pub fn output_dim_for(comm_channels: usize) -> usize {
        1 + 4 * comm_channels
    }

    pub fn comm_channels(&self) -> usize {
        self.comm_channels
    }

    pub fn control_step(
        &mut self,
        body: &mut Grid<BodyUnit>,
        states: &Grid<UnitState>,
    ) -> Result<Grid<f64>> {
        let c = self.comm_channels;
        let mut next_signals: Grid<Vec<f64>> = Grid::new(body.width(), body.height());
        let mut actuations = Grid::new(body.width(), body.height());
        for (x, y, unit) in body.iter_mut() {
            let mut inputs = Vec::with_capacity(unit.channel_count() + 4 * c);
            let state = states.get(x, y).copied().unwrap_or_default();
            unit.read(&state, &mut inputs);
            for (dir, (dx, dy)) in DIRECTIONS.iter().enumerate() {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                let neighbor = if nx >= 0 && ny >= 0 {
                    self.signals.get(nx as usize, ny as usize)
                } else {
                    None
                };
                match neighbor {
                    Some(sig) => {
                        // read the neighbor's slots pointing back at us
                        let facing = (dir + 2) % 4;
                        inputs.extend_from_slice(&sig[facing * c..(facing + 1) * c]);
                    }
                    None => inputs.extend(std::iter::repeat(0.0).take(c)),
                }
            }
            let controller = self
                .controllers
                .get_mut(x, y)
                .ok_or_else(|| ControlError::InvalidArchitecture(
                    format!("no controller bound at ({x}, {y})"),
                ))?;
            let outputs = controller.apply(&inputs)?;
            let command = outputs[0].clamp(-1.0, 1.0);
            unit.last_actuation = command;
            actuations.set(x, y, Some(command));
            next_signals.set(x, y, Some(outputs[1..].to_vec()));
        }
        self.signals = next_signals;
        Ok(actuations)
    }

    pub fn reset(&mut self) {
        for (_, _, controller) in self.controllers.iter_mut() {
            controller.reset();
        }
        self.signals = self.signals.map(|_, _, s| vec![0.0; s.len()]);
    }
}

impl Parametrized for DistributedSensing {
    fn params(&self) -> Vec<f64> {
        let mut flat = Vec::new();
        for (_, _, controller) in self.controllers.iter() {
            flat.extend(controller.params());
        }
        flat
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        let expected = self.param_count();
        if params.len() != expected {
            return Err(ControlError::shape("parameter vector", expected, params.len()));
        }
        let mut offset = 0;
        for (_, _, controller) in self.controllers.iter_mut() {
            let n = controller.param_count();
            controller.set_params(&params[offset..offset + n])?;
            offset += n;
        }
        Ok(())
    }

    fn param_count(&self) -> usize {
        self.controllers
            .iter()
            .map(|(_, _, c)| c.param_count())
            .sum()
    }
}
