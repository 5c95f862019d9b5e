use serde::{Deserialize, Serialize};

use crate::model::config::SimConfig;
use crate::model::robot::Robot;
use crate::model::snapshot::SnapshotListener;
use crate::model::terrain::Terrain;
use crate::tasks::locomotion::{Locomotion, Outcome};

/// Locomotion on a bounded flat terrain of a fixed length, scored by how
/// many times the robot traverses it.
#[derive(Debug, Clone)]
pub struct PeriodicLocomotion {
    length: f64,
    config: SimConfig,
}

impl PeriodicLocomotion {
    pub fn new(length: f64, config: SimConfig) -> Self {
        Self { length, config }
    }

    pub fn run(
        &self,
        robot: &mut Robot,
        listener: &mut dyn SnapshotListener,
    ) -> anyhow::Result<PeriodicOutcome> {
        let terrain = Terrain::periodic(self.length);
        let mut task = Locomotion::new(terrain, self.config.clone());
        let outcome = task.run(robot, listener)?;
        Ok(PeriodicOutcome::new(outcome, self.length))
    }
}

/// An Outcome plus the terrain length it was recorded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicOutcome {
    outcome: Outcome,
    length: f64,
}

impl PeriodicOutcome {
    pub fn new(outcome: Outcome, length: f64) -> Self {
        Self { outcome, length }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Traversal count between the two goal lines plus the clamped
    /// fractional progress of the final partial traversal.
    ///
    /// The left goal is the robot's starting x; the right goal mirrors it at
    /// `length - start`. Each goal crossing while heading toward it counts
    /// one; a trajectory that never reaches either goal scores only its
    /// forward fraction. Pure post-processing over the recorded
    /// center-of-mass series.
    pub fn coverage(&self) -> f64 {
        let positions = self.outcome.center_x_series();
        let Some(&first) = positions.first() else {
            return 0.0;
        };
        let left_goal = first;
        let right_goal = self.length - left_goal;
        let span = right_goal - left_goal;
        if span <= 0.0 {
            return 0.0;
        }
        let mut forward = true;
        let mut coverage = 0.0;
        for &position in &positions {
            if forward && position >= right_goal {
                coverage += 1.0;
                forward = false;
            }
            if !forward && position <= left_goal {
                coverage += 1.0;
                forward = true;
            }
        }
        let last = positions[positions.len() - 1];
        let additional = if forward {
            last - left_goal
        } else {
            right_goal - last
        };
        coverage + (additional / span).max(0.0)
    }
}
