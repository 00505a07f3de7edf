pub mod astro;
pub mod config;
pub mod error;
pub mod maneuver;
pub mod math;
pub mod model;
pub mod sim;

#[cfg(test)]
pub mod consts;
