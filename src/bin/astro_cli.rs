use anyhow::{ensure, Result};
use clap::Parser;
use nalgebra::Vector3;

use orbit_sandbox::astro::{OrbitalElements, NEWTON_G};

/// Prints the orbital elements of a state vector around a point mass.
#[derive(Debug, Parser)]
struct Args {
    /// Position relative to the primary, as x y z
    #[arg(long, num_args = 3, required = true, allow_negative_numbers = true)]
    position: Vec<f64>,
    /// Velocity relative to the primary, as x y z
    #[arg(long, num_args = 3, required = true, allow_negative_numbers = true)]
    velocity: Vec<f64>,
    /// Combined mass of the primary and the orbiting body
    #[arg(long)]
    mass: f64,
    #[arg(long, default_value_t = NEWTON_G)]
    gravitational_constant: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.mass > 0.0, "mass must be positive");

    let position = Vector3::from_column_slice(&args.position);
    let velocity = Vector3::from_column_slice(&args.velocity);
    let orbit = OrbitalElements::from_state(
        &position,
        &velocity,
        &Vector3::zeros(),
        args.mass,
        args.gravitational_constant,
    );

    println!("Orbital characteristics");
    println!("- Semi-major axis: {}", orbit.semimajor_axis());
    println!("- Semi-minor axis: {}", orbit.semiminor_axis());
    println!("- Apoapsis: {:?}", orbit.apoapsis());
    println!("- Periapsis: {}", orbit.periapsis());
    println!("- Orbital eccentricity: {}", orbit.eccentricity());
    println!(
        "- Orbital inclination: {}",
        orbit.inclination().to_degrees()
    );
    println!(
        "- Argument of periapsis: {}",
        orbit.arg_periapsis().to_degrees()
    );
    println!("- LAN: {}", orbit.long_asc_node().to_degrees());
    println!("- True anomaly: {}", orbit.true_anomaly().to_degrees());
    println!(
        "- Eccentric anomaly: {:?}",
        orbit.eccentric_anomaly().map(f64::to_degrees)
    );
    println!("- Specific orbital energy: {}", orbit.energy());
    println!("- Angular momentum: {:?}", orbit.angular_momentum().as_slice());
    println!("- Orbital period: {:?}", orbit.period());
    Ok(())
}
