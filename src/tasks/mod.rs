//! Task drivers: own a physics world, step it, and aggregate Outcomes.

pub mod locomotion;
pub mod periodic;

use serde::{Deserialize, Serialize};

pub use locomotion::{Locomotion, Observation, Outcome, Termination, UnitObservation};
pub use periodic::{PeriodicLocomotion, PeriodicOutcome};

/// Driver lifecycle; `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Idle,
    Running,
    Finished,
}
