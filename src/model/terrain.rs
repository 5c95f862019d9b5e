use anyhow::ensure;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Wall height at both ends of a bounded terrain.
pub const BORDER_HEIGHT: f64 = 100.0;
/// Horizontal extent of each end wall.
pub const BORDER_WIDTH: f64 = 10.0;
/// Floor height between the walls of a periodic terrain.
pub const FLOOR_HEIGHT: f64 = 5.0;

/// Ground profile: ordered (x, height) breakpoints, linearly interpolated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    breakpoints: Vec<(f64, f64)>,
}

impl Terrain {
    /// Breakpoints must be weakly increasing in x.
    pub fn new(breakpoints: Vec<(f64, f64)>) -> anyhow::Result<Self> {
        ensure!(breakpoints.len() >= 2, "terrain needs at least two breakpoints");
        ensure!(
            breakpoints.windows(2).all(|w| w[0].0 <= w[1].0),
            "terrain breakpoints must be weakly increasing in x"
        );
        Ok(Self { breakpoints })
    }

    /// Flat floor of the given length.
    pub fn flat(length: f64, height: f64) -> Self {
        Self {
            breakpoints: vec![(0.0, height), (length, height)],
        }
    }

    /// Bounded flat terrain with end walls, as used by the periodic
    /// locomotion task.
    pub fn periodic(length: f64) -> Self {
        Self {
            breakpoints: vec![
                (0.0, BORDER_HEIGHT),
                (BORDER_WIDTH, FLOOR_HEIGHT),
                (length - BORDER_WIDTH, FLOOR_HEIGHT),
                (length, BORDER_HEIGHT),
            ],
        }
    }

    /// Random rolling terrain; identical seeds give identical profiles.
    pub fn hilly(length: f64, chunk: f64, max_delta: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut breakpoints = vec![(0.0, BORDER_HEIGHT), (BORDER_WIDTH, FLOOR_HEIGHT)];
        let mut x = BORDER_WIDTH;
        while x < length - BORDER_WIDTH - chunk {
            x += chunk;
            let h = FLOOR_HEIGHT + rng.gen_range(0.0..max_delta);
            breakpoints.push((x, h));
        }
        breakpoints.push((length - BORDER_WIDTH, FLOOR_HEIGHT));
        breakpoints.push((length, BORDER_HEIGHT));
        Self { breakpoints }
    }

    /// Ground height at `x`; clamps beyond the first/last breakpoint.
    pub fn height(&self, x: f64) -> f64 {
        let first = self.breakpoints[0];
        let last = self.breakpoints[self.breakpoints.len() - 1];
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        for w in self.breakpoints.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if x <= x1 {
                if x1 == x0 {
                    return y1;
                }
                let t = (x - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }
        last.1
    }

    pub fn length(&self) -> f64 {
        self.breakpoints[self.breakpoints.len() - 1].0
    }

    /// Highest ground point within `[x0, x1]`, for initial robot placement.
    pub fn max_height_in(&self, x0: f64, x1: f64) -> f64 {
        let mut max = self.height(x0).max(self.height(x1));
        for &(x, h) in &self.breakpoints {
            if x >= x0 && x <= x1 {
                max = max.max(h);
            }
        }
        max
    }
}
