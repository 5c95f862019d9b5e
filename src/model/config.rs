use serde::{Deserialize, Serialize};
use std::fs;

/// Spring-mass integration constants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct PhysicsConfig {
    /// Downward acceleration, m/s^2.
    pub gravity: f64,
    pub node_mass: f64,
    pub spring_stiffness: f64,
    pub spring_damping: f64,
    /// Velocity-proportional ground friction, 1/s.
    pub ground_friction: f64,
    /// Rest-length modulation per unit of actuation command.
    pub actuation_gain: f64,
    /// Integration sub-steps per control timestep.
    pub substeps: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            node_mass: 1.0,
            spring_stiffness: 400.0,
            spring_damping: 8.0,
            ground_friction: 30.0,
            actuation_gain: 0.25,
            substeps: 8,
        }
    }
}

/// Task driver settings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Control timestep, seconds.
    pub dt: f64,
    /// Simulated time horizon, seconds.
    pub horizon: f64,
    /// One Observation every this many control ticks.
    pub sampling_stride: usize,
    /// Robot left edge at placement.
    pub start_x: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            horizon: 20.0,
            sampling_stride: 4,
            start_x: crate::model::terrain::BORDER_WIDTH + 1.0,
        }
    }
}

/// Spiking controller sub-stepping and decoding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SpikingConfig {
    /// Spiking sub-steps per control tick.
    pub substeps: usize,
    /// Duration of one spiking sub-step, seconds.
    pub substep_dt: f64,
    /// Decoder window length, in sub-steps.
    pub decode_window: usize,
}

impl Default for SpikingConfig {
    fn default() -> Self {
        Self {
            substeps: 5,
            substep_dt: 1.0 / 300.0,
            decode_window: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub task: TaskConfig,
    pub spiking: SpikingConfig,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            task: TaskConfig::default(),
            spiking: SpikingConfig::default(),
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Reads `path` if it exists, otherwise writes the defaults there.
    pub fn load(path: &str) -> Self {
        if let Ok(content) = fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("invalid config at {path}: {e}, using defaults"),
            }
        }
        let default = Self::default();
        if let Ok(text) = toml::to_string(&default) {
            let _ = fs::write(path, text);
        }
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_roundtrip() {
        let config = SimConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: SimConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.task.dt, config.task.dt);
        assert_eq!(parsed.physics.substeps, config.physics.substeps);
        assert_eq!(parsed.seed, config.seed);
    }
}
