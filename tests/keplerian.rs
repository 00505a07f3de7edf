use approx::assert_relative_eq;
use nalgebra::Vector3;
use orbit_sandbox::astro::{keplerian_parameters, NEWTON_G};
use orbit_sandbox::model::{BodyId, BodyInit, World};

fn world_with_primary(mass: f64, position: Vector3<f64>, velocity: Vector3<f64>) -> (World, BodyId) {
    let mut world = World::default();
    world
        .add_body(BodyInit::new(Vector3::zeros(), Vector3::zeros(), mass).fixed())
        .unwrap();
    let body = world.add_body(BodyInit::new(position, velocity, 1.0)).unwrap();
    (world, body)
}

#[test]
fn test_reference_hyperbola() {
    let (world, body) = world_with_primary(
        1.0 / NEWTON_G,
        Vector3::new(3000.0, 0.0, 0.0),
        Vector3::new(10.0, 10.0, 10.0),
    );
    let orbit = world.elements_of(body).unwrap();

    assert_relative_eq!(orbit.angular_momentum(), Vector3::new(0.0, -30000.0, 30000.0));
    assert_relative_eq!(orbit.inclination().to_degrees(), 45.0, epsilon = 1e-6);
    assert_relative_eq!(orbit.long_asc_node().to_degrees(), 0.0);
    assert_relative_eq!(orbit.arg_periapsis().to_degrees(), 324.74, epsilon = 5e-3);
    assert_relative_eq!(orbit.true_anomaly().to_degrees(), 35.26, epsilon = 5e-3);
    assert!(orbit.eccentricity() > 1.0);
    assert!(orbit.period().is_none());
}

#[test]
fn test_reference_ellipse() {
    let (world, body) = world_with_primary(
        1e26,
        Vector3::new(1500.0, -500.0, 1000.0),
        Vector3::new(0.0, 20.0, 40.0),
    );
    let orbit = world.elements_of(body).unwrap();

    assert_relative_eq!(orbit.eccentricity(), 0.54, epsilon = 5e-3);
    assert_relative_eq!(orbit.inclination(), 1.18, epsilon = 5e-3);
    assert_relative_eq!(orbit.long_asc_node(), 5.70, epsilon = 5e-3);
    assert_relative_eq!(orbit.true_anomaly(), 2.79, epsilon = 5e-3);
    assert_relative_eq!(orbit.arg_periapsis(), 4.11, epsilon = 5e-3);
    assert!(orbit.is_closed());
    assert_relative_eq!(orbit.period().unwrap(), 113.96, epsilon = 0.01);
}

#[test]
fn test_extraction_is_pure() {
    let position = Vector3::new(1500.0, -500.0, 1000.0);
    let velocity = Vector3::new(0.0, 20.0, 40.0);

    let first = keplerian_parameters(&position, &velocity, &Vector3::zeros(), 1e26);
    let second = keplerian_parameters(&position, &velocity, &Vector3::zeros(), 1e26);
    assert_eq!(first, second);
}

#[test]
fn test_orbiting_body_is_most_massive() {
    // Everything at the same distance, nothing moving
    let masses = [3e20, 7e24, 1e22, 5e23];
    let directions = [Vector3::x(), -Vector3::x(), Vector3::y(), Vector3::z()];

    let mut world = World::default();
    let probe = world
        .add_body(BodyInit::new(Vector3::zeros(), Vector3::zeros(), 1.0))
        .unwrap();
    let ids: Vec<BodyId> = masses
        .iter()
        .zip(directions.iter())
        .map(|(&m, d)| {
            world
                .add_body(BodyInit::new(d * 500.0, Vector3::zeros(), m))
                .unwrap()
        })
        .collect();

    assert_eq!(world.primary_of(probe).unwrap(), ids[1]);

    // Disabling the heaviest hands it to the next one down
    world.set_disabled(ids[1], true).unwrap();
    assert_eq!(world.primary_of(probe).unwrap(), ids[3]);
}
