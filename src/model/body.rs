use serde::{Deserialize, Serialize};

/// One sensor channel group carried by a body unit.
///
/// Readings are normalized into `[-1, 1]` before they reach a controller;
/// whatever produced them (the physics adapter) is responsible for the raw
/// scale, the sensor only declares channel count and normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    /// Unit velocity, two channels (x then y).
    Velocity,
    /// Ratio of current unit area to rest area, one channel.
    AreaRatio,
    /// Ground contact flag, one channel (0 or 1).
    Touch,
    /// Sinusoidal clock, one channel: `sin(2 pi f t)` at the given frequency.
    /// Gives open-loop controllers a phase reference.
    Time { frequency_hz: f64 },
}

impl Sensor {
    pub fn channels(&self) -> usize {
        match self {
            Sensor::Velocity => 2,
            Sensor::AreaRatio => 1,
            Sensor::Touch => 1,
            Sensor::Time { .. } => 1,
        }
    }
}

/// Raw physical state of one unit, sampled from the physics adapter each
/// tick and turned into sensor readings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnitState {
    pub velocity: (f64, f64),
    pub area_ratio: f64,
    pub touching: bool,
    /// Simulated time of the sample, in seconds.
    pub time: f64,
}

/// One sensorized, individually actuated voxel of a robot body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyUnit {
    pub sensors: Vec<Sensor>,
    /// Actuation command applied on the previous tick, in `[-1, 1]`.
    pub last_actuation: f64,
}

impl BodyUnit {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors,
            last_actuation: 0.0,
        }
    }

    /// Default sensor suite used by the built-in demo bodies.
    pub fn standard() -> Self {
        Self::new(vec![Sensor::Velocity, Sensor::AreaRatio, Sensor::Touch])
    }

    pub fn channel_count(&self) -> usize {
        self.sensors.iter().map(Sensor::channels).sum()
    }

    /// Reads every sensor in declaration order into `out`.
    pub fn read(&self, state: &UnitState, out: &mut Vec<f64>) {
        const VELOCITY_CAP: f64 = 5.0;
        for sensor in &self.sensors {
            match sensor {
                Sensor::Velocity => {
                    out.push((state.velocity.0 / VELOCITY_CAP).clamp(-1.0, 1.0));
                    out.push((state.velocity.1 / VELOCITY_CAP).clamp(-1.0, 1.0));
                }
                Sensor::AreaRatio => {
                    // rest ratio 1.0 maps to 0
                    out.push((state.area_ratio - 1.0).clamp(-1.0, 1.0));
                }
                Sensor::Touch => out.push(if state.touching { 1.0 } else { 0.0 }),
                Sensor::Time { frequency_hz } => {
                    out.push((std::f64::consts::TAU * frequency_hz * state.time).sin());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_count_sums_sensors() {
        let unit = BodyUnit::standard();
        assert_eq!(unit.channel_count(), 4);
    }

    #[test]
    fn test_read_order_matches_declaration() {
        let unit = BodyUnit::new(vec![Sensor::Touch, Sensor::AreaRatio]);
        let state = UnitState {
            area_ratio: 1.25,
            touching: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        unit.read(&state, &mut out);
        assert_eq!(out, vec![1.0, 0.25]);
    }

    #[test]
    fn test_read_clamps_extreme_velocity() {
        let unit = BodyUnit::new(vec![Sensor::Velocity]);
        let state = UnitState {
            velocity: (100.0, -100.0),
            area_ratio: 1.0,
            ..Default::default()
        };
        let mut out = Vec::new();
        unit.read(&state, &mut out);
        assert_eq!(out, vec![1.0, -1.0]);
    }
}
