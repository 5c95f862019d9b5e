//! 2D voxel-based soft robot simulation with pluggable neural controllers.
//!
//! A robot is a grid of sensorized voxels wired to one or more controllers
//! through a sensing topology; the locomotion task driver steps a physics
//! world, invokes the control loop each tick and aggregates the run into a
//! time-indexed Outcome.

pub mod model;
pub mod tasks;
