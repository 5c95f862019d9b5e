pub mod activation;
pub mod body;
pub mod config;
pub mod controller;
pub mod errors;
pub mod grid;
pub mod physics;
pub mod robot;
pub mod sensing;
pub mod snapshot;
pub mod terrain;
