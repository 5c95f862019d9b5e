//! Physics collaborator contract and the built-in spring-mass reference
//! world.
//!
//! The control core only needs the narrow `PhysicsWorld` surface: advance by
//! a fixed timestep, query per-unit state, and accept per-unit actuation
//! commands. `SpringMassWorld` is a deterministic 2D implementation good
//! enough to exercise the full sensing-control-actuation loop; nothing in
//! the task driver depends on its internals.

use serde::{Deserialize, Serialize};

use crate::model::body::{BodyUnit, UnitState};
use crate::model::config::PhysicsConfig;
use crate::model::grid::Grid;
use crate::model::terrain::Terrain;

/// Quad of unit corner positions, counter-clockwise from bottom-left.
pub type UnitPoly = [(f64, f64); 4];

/// The narrow contract the task driver requires from a physics engine.
pub trait PhysicsWorld {
    /// Integrates one control timestep.
    fn advance(&mut self, dt: f64);
    /// Corner polygon of the unit at body-grid cell (x, y), if occupied.
    fn unit_poly(&self, x: usize, y: usize) -> Option<UnitPoly>;
    /// Velocity, area ratio and ground contact of a unit.
    fn unit_state(&self, x: usize, y: usize) -> Option<UnitState>;
    /// Applies one actuation command in `[-1, 1]` (negative contracts).
    fn apply_actuation(&mut self, x: usize, y: usize, command: f64);
    /// Mean position over all body mass points.
    fn center_of_mass(&self) -> (f64, f64);
}

/// Side length of one voxel in world units.
pub const VOXEL_SIZE: f64 = 1.0;
/// Clearance between the lowest node and the ground at placement.
const PLACEMENT_GAP: f64 = 0.1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Node {
    pos: (f64, f64),
    vel: (f64, f64),
    contact: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Spring {
    a: usize,
    b: usize,
    rest: f64,
    /// Index into `voxels`; actuation of that voxel modulates this spring.
    voxel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Voxel {
    nodes: [usize; 4],
    command: f64,
}

/// Deterministic 2D spring-mass world over a voxel body grid.
///
/// Each voxel contributes four corner point masses (shared with neighbors),
/// four edge springs and two diagonal springs. Actuation scales the rest
/// length of a voxel's springs; ground contact is resolved against the
/// terrain profile with velocity-proportional friction. Integration is
/// semi-implicit Euler over fixed sub-steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringMassWorld {
    config: PhysicsConfig,
    terrain: Terrain,
    nodes: Vec<Node>,
    springs: Vec<Spring>,
    voxels: Vec<Voxel>,
    voxel_index: Grid<usize>,
}

impl SpringMassWorld {
    /// Builds the world with the robot's lowest edge resting just above the
    /// terrain, left edge at `start_x`.
    pub fn new(body: &Grid<BodyUnit>, terrain: Terrain, start_x: f64, config: PhysicsConfig) -> Self {
        let w = body.width();
        let h = body.height();
        let base_y =
            terrain.max_height_in(start_x, start_x + w as f64 * VOXEL_SIZE) + PLACEMENT_GAP;

        // lattice point -> node index, for corner sharing between voxels
        let mut lattice = vec![None; (w + 1) * (h + 1)];
        let mut nodes = Vec::new();
        let mut node_at = |i: usize, j: usize, nodes: &mut Vec<Node>| -> usize {
            let slot = j * (w + 1) + i;
            if let Some(idx) = lattice[slot] {
                return idx;
            }
            let idx = nodes.len();
            nodes.push(Node {
                pos: (
                    start_x + i as f64 * VOXEL_SIZE,
                    base_y + j as f64 * VOXEL_SIZE,
                ),
                vel: (0.0, 0.0),
                contact: false,
            });
            lattice[slot] = Some(idx);
            idx
        };

        let mut springs = Vec::new();
        let mut voxels = Vec::new();
        let mut voxel_index = Grid::new(w, h);
        for (x, y, _unit) in body.iter() {
            let bl = node_at(x, y, &mut nodes);
            let br = node_at(x + 1, y, &mut nodes);
            let tr = node_at(x + 1, y + 1, &mut nodes);
            let tl = node_at(x, y + 1, &mut nodes);
            let voxel = voxels.len();
            let diag = VOXEL_SIZE * std::f64::consts::SQRT_2;
            for (a, b, rest) in [
                (bl, br, VOXEL_SIZE),
                (br, tr, VOXEL_SIZE),
                (tr, tl, VOXEL_SIZE),
                (tl, bl, VOXEL_SIZE),
                (bl, tr, diag),
                (br, tl, diag),
            ] {
                springs.push(Spring { a, b, rest, voxel });
            }
            voxels.push(Voxel {
                nodes: [bl, br, tr, tl],
                command: 0.0,
            });
            voxel_index.set(x, y, Some(voxel));
        }

        Self {
            config,
            terrain,
            nodes,
            springs,
            voxels,
            voxel_index,
        }
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    fn poly_of(&self, voxel: &Voxel) -> UnitPoly {
        let [bl, br, tr, tl] = voxel.nodes;
        [
            self.nodes[bl].pos,
            self.nodes[br].pos,
            self.nodes[tr].pos,
            self.nodes[tl].pos,
        ]
    }

    fn area(poly: &UnitPoly) -> f64 {
        let mut sum = 0.0;
        for i in 0..4 {
            let (x0, y0) = poly[i];
            let (x1, y1) = poly[(i + 1) % 4];
            sum += x0 * y1 - x1 * y0;
        }
        sum.abs() / 2.0
    }

    fn substep(&mut self, dt: f64) {
        let cfg = &self.config;
        let mut forces = vec![(0.0, 0.0); self.nodes.len()];

        for f in forces.iter_mut() {
            f.1 -= cfg.gravity * cfg.node_mass;
        }

        for spring in &self.springs {
            let command = self.voxels[spring.voxel].command;
            let rest = spring.rest * (1.0 + cfg.actuation_gain * command);
            let (ax, ay) = self.nodes[spring.a].pos;
            let (bx, by) = self.nodes[spring.b].pos;
            let dx = bx - ax;
            let dy = by - ay;
            let len = (dx * dx + dy * dy).sqrt().max(1e-9);
            let (ux, uy) = (dx / len, dy / len);
            let stretch = len - rest;
            let rel_vel = (self.nodes[spring.b].vel.0 - self.nodes[spring.a].vel.0) * ux
                + (self.nodes[spring.b].vel.1 - self.nodes[spring.a].vel.1) * uy;
            let magnitude = cfg.spring_stiffness * stretch + cfg.spring_damping * rel_vel;
            forces[spring.a].0 += magnitude * ux;
            forces[spring.a].1 += magnitude * uy;
            forces[spring.b].0 -= magnitude * ux;
            forces[spring.b].1 -= magnitude * uy;
        }

        for (node, force) in self.nodes.iter_mut().zip(forces.iter()) {
            node.vel.0 += force.0 / cfg.node_mass * dt;
            node.vel.1 += force.1 / cfg.node_mass * dt;
            node.pos.0 += node.vel.0 * dt;
            node.pos.1 += node.vel.1 * dt;

            let ground = self.terrain.height(node.pos.0);
            if node.pos.1 < ground {
                node.pos.1 = ground;
                if node.vel.1 < 0.0 {
                    node.vel.1 = 0.0;
                }
                node.vel.0 *= (1.0 - cfg.ground_friction * dt).max(0.0);
                node.contact = true;
            }
        }
    }
}

impl PhysicsWorld for SpringMassWorld {
    fn advance(&mut self, dt: f64) {
        for node in &mut self.nodes {
            node.contact = false;
        }
        let n = self.config.substeps.max(1);
        let sub_dt = dt / n as f64;
        for _ in 0..n {
            self.substep(sub_dt);
        }
    }

    fn unit_poly(&self, x: usize, y: usize) -> Option<UnitPoly> {
        let idx = *self.voxel_index.get(x, y)?;
        Some(self.poly_of(&self.voxels[idx]))
    }

    fn unit_state(&self, x: usize, y: usize) -> Option<UnitState> {
        let idx = *self.voxel_index.get(x, y)?;
        let voxel = &self.voxels[idx];
        let mut vel = (0.0, 0.0);
        let mut touching = false;
        for &n in &voxel.nodes {
            vel.0 += self.nodes[n].vel.0 / 4.0;
            vel.1 += self.nodes[n].vel.1 / 4.0;
            touching |= self.nodes[n].contact;
        }
        let poly = self.poly_of(voxel);
        Some(UnitState {
            velocity: vel,
            area_ratio: Self::area(&poly) / (VOXEL_SIZE * VOXEL_SIZE),
            touching,
            time: 0.0,
        })
    }

    fn apply_actuation(&mut self, x: usize, y: usize, command: f64) {
        if let Some(&idx) = self.voxel_index.get(x, y) {
            let clamped = command.clamp(-1.0, 1.0);
            if clamped != command {
                tracing::debug!(command, "actuation command out of range, clamping");
            }
            self.voxels[idx].command = clamped;
        }
    }

    fn center_of_mass(&self) -> (f64, f64) {
        let n = self.nodes.len().max(1) as f64;
        let mut com = (0.0, 0.0);
        for node in &self.nodes {
            com.0 += node.pos.0 / n;
            com.1 += node.pos.1 / n;
        }
        com
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::body::BodyUnit;

    fn single_voxel_world() -> SpringMassWorld {
        let mut body = Grid::new(1, 1);
        body.set(0, 0, Some(BodyUnit::standard()));
        SpringMassWorld::new(&body, Terrain::flat(50.0, 5.0), 10.0, PhysicsConfig::default())
    }

    #[test]
    fn test_world_shares_nodes_between_adjacent_voxels() {
        let mut body = Grid::new(2, 1);
        body.set(0, 0, Some(BodyUnit::standard()));
        body.set(1, 0, Some(BodyUnit::standard()));
        let world =
            SpringMassWorld::new(&body, Terrain::flat(50.0, 5.0), 10.0, PhysicsConfig::default());
        assert_eq!(world.nodes.len(), 6, "Two adjacent voxels share an edge");
        assert_eq!(world.springs.len(), 12);
    }

    #[test]
    fn test_voxel_settles_on_flat_ground() {
        let mut world = single_voxel_world();
        for _ in 0..600 {
            world.advance(1.0 / 60.0);
        }
        let state = world.unit_state(0, 0).unwrap();
        assert!(state.touching, "Voxel should rest on the ground");
        assert!(
            state.velocity.0.abs() < 1e-3 && state.velocity.1.abs() < 1e-3,
            "Settled voxel should be nearly still, got {:?}",
            state.velocity
        );
        let poly = world.unit_poly(0, 0).unwrap();
        assert!(
            poly.iter().all(|&(_, y)| y >= 5.0 - 1e-9),
            "No node may sink below the terrain"
        );
    }

    #[test]
    fn test_area_ratio_responds_to_contraction() {
        let mut world = single_voxel_world();
        // settle first
        for _ in 0..300 {
            world.advance(1.0 / 60.0);
        }
        world.apply_actuation(0, 0, -1.0);
        for _ in 0..120 {
            world.advance(1.0 / 60.0);
        }
        let contracted = world.unit_state(0, 0).unwrap().area_ratio;
        assert!(
            contracted < 0.95,
            "Full contraction should shrink the voxel, ratio {contracted}"
        );
    }

    #[test]
    fn test_actuation_command_is_clamped() {
        let mut world = single_voxel_world();
        world.apply_actuation(0, 0, 7.0);
        assert_eq!(world.voxels[0].command, 1.0);
    }

    #[test]
    fn test_advance_is_deterministic() {
        let mut a = single_voxel_world();
        let mut b = single_voxel_world();
        for _ in 0..200 {
            a.advance(1.0 / 60.0);
            b.advance(1.0 / 60.0);
        }
        assert_eq!(a.center_of_mass(), b.center_of_mass());
    }
}
