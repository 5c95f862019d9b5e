use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::model::body::UnitState;
use crate::model::config::SimConfig;
use crate::model::grid::Grid;
use crate::model::physics::{PhysicsWorld, SpringMassWorld, UnitPoly};
use crate::model::robot::Robot;
use crate::model::snapshot::SnapshotListener;
use crate::model::terrain::Terrain;
use crate::tasks::TaskState;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Configured time horizon reached.
    Horizon,
    /// No body unit left in a simulable position; the Outcome is truncated
    /// but still valid.
    InvalidState,
}

/// Physical state of one unit at one sampled tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitObservation {
    pub x: usize,
    pub y: usize,
    pub poly: UnitPoly,
    pub velocity: (f64, f64),
    pub area_ratio: f64,
    pub touching: bool,
    pub actuation: f64,
}

/// Snapshot of the whole robot at one sampled tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub time: f64,
    pub units: Vec<UnitObservation>,
    /// Robot center of mass.
    pub center: (f64, f64),
    pub terrain_height: f64,
}

/// Time-indexed record of one run: append-only while running, read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    observations: Vec<Observation>,
    termination: Termination,
}

impl Outcome {
    pub fn new(observations: Vec<Observation>, termination: Termination) -> Self {
        Self {
            observations,
            termination,
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn duration(&self) -> f64 {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    /// Center-of-mass x positions in time order.
    pub fn center_x_series(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.center.0).collect()
    }

    pub fn x_displacement(&self) -> f64 {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => last.center.0 - first.center.0,
            _ => 0.0,
        }
    }

    pub fn average_x_velocity(&self) -> f64 {
        let t = self.duration();
        if t <= 0.0 {
            return 0.0;
        }
        self.x_displacement() / t
    }
}

/// Locomotion task: advance a robot over a terrain until the horizon or an
/// invalid robot state, recording Observations along the way.
#[derive(Debug, Clone)]
pub struct Locomotion {
    terrain: Terrain,
    config: SimConfig,
    state: TaskState,
}

impl Locomotion {
    pub fn new(terrain: Terrain, config: SimConfig) -> Self {
        Self {
            terrain,
            config,
            state: TaskState::Idle,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Runs the task in the built-in spring-mass world.
    pub fn run(
        &mut self,
        robot: &mut Robot,
        listener: &mut dyn SnapshotListener,
    ) -> anyhow::Result<Outcome> {
        let mut world = SpringMassWorld::new(
            robot.body(),
            self.terrain.clone(),
            self.config.task.start_x,
            self.config.physics,
        );
        self.run_with_world(&mut world, robot, listener)
    }

    /// Runs the task against any physics collaborator.
    pub fn run_with_world<P: PhysicsWorld>(
        &mut self,
        world: &mut P,
        robot: &mut Robot,
        listener: &mut dyn SnapshotListener,
    ) -> anyhow::Result<Outcome> {
        if self.state == TaskState::Finished {
            bail!("task already finished; drivers are single-shot");
        }
        self.state = TaskState::Running;
        robot.reset();

        let dt = self.config.task.dt;
        let stride = self.config.task.sampling_stride.max(1);
        let mut observations = Vec::new();
        let mut termination = Termination::Horizon;
        let mut t = 0.0;
        let mut tick: u64 = 0;

        let initial = self.observe(world, robot, t);
        listener.on_snapshot(t, &initial);
        observations.push(initial);

        while t < self.config.task.horizon {
            let states = self.sample_states(world, robot, t);
            let actuations = robot
                .control_step(&states)
                .context("controller failed during run")?;
            for (x, y, &command) in actuations.iter() {
                world.apply_actuation(x, y, command);
            }
            world.advance(dt);
            t += dt;
            tick += 1;

            if tick % stride as u64 == 0 {
                let observation = self.observe(world, robot, t);
                listener.on_snapshot(t, &observation);
                observations.push(observation);
            }

            if !self.robot_above_terrain(world, robot) {
                tracing::warn!(time = t, "robot left simulable space, stopping early");
                termination = Termination::InvalidState;
                break;
            }
        }

        self.state = TaskState::Finished;
        Ok(Outcome::new(observations, termination))
    }

    fn sample_states<P: PhysicsWorld>(&self, world: &P, robot: &Robot, t: f64) -> Grid<UnitState> {
        robot.body().map(|x, y, _| {
            let mut state = world.unit_state(x, y).unwrap_or_default();
            state.time = t;
            state
        })
    }

    fn observe<P: PhysicsWorld>(&self, world: &P, robot: &Robot, t: f64) -> Observation {
        let mut units = Vec::with_capacity(robot.body().count());
        for (x, y, unit) in robot.body().iter() {
            if let (Some(poly), Some(state)) = (world.unit_poly(x, y), world.unit_state(x, y)) {
                units.push(UnitObservation {
                    x,
                    y,
                    poly,
                    velocity: state.velocity,
                    area_ratio: state.area_ratio,
                    touching: state.touching,
                    actuation: unit.last_actuation,
                });
            }
        }
        let center = world.center_of_mass();
        Observation {
            time: t,
            units,
            center,
            terrain_height: self.terrain.height(center.0),
        }
    }

    /// A robot is simulable while at least one unit center sits above the
    /// ground profile.
    fn robot_above_terrain<P: PhysicsWorld>(&self, world: &P, robot: &Robot) -> bool {
        for (x, y, _) in robot.body().iter() {
            if let Some(poly) = world.unit_poly(x, y) {
                let cx = poly.iter().map(|p| p.0).sum::<f64>() / 4.0;
                let cy = poly.iter().map(|p| p.1).sum::<f64>() / 4.0;
                if cy >= self.terrain.height(cx) {
                    return true;
                }
            }
        }
        false
    }
}
