//! Classical orbital elements, derived from an instantaneous state.
//!
//! The important items in this module are:
//! - [OrbitalElements], a value type holding the six classical elements plus
//!   the quantities that fall out of them (period, radius, speed, ...)
//! - [keplerian_parameters], the pure function that produces them from a
//!   position and velocity relative to some attracting body.

mod elements;

/// Newton's gravitational constant, in km^3 / (kg s^2).
pub const NEWTON_G: f64 = 6.6743e-20;

pub use elements::{keplerian_parameters, OrbitalElements};
