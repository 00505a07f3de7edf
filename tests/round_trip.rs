use approx::assert_relative_eq;
use itertools::{EitherOrBoth, Itertools};
use nalgebra::Vector3;
use orbit_sandbox::model::{propagate, BodyId, BodyInit, World};

const STEPS_PER_ORBIT: usize = 2000;

fn sun_and_probe(sun_fixed: bool, probe_mass: f64) -> (World, BodyId, BodyId) {
    let mut world = World::default();
    let mut sun = BodyInit::new(Vector3::zeros(), Vector3::zeros(), 1e26);
    if sun_fixed {
        sun = sun.fixed();
    }
    let sun = world.add_body(sun).unwrap();
    let probe = world
        .add_body(BodyInit::new(
            Vector3::new(1000.0, 0.0, 0.0),
            Vector3::new(0.0, 90.0, 0.0),
            probe_mass,
        ))
        .unwrap();
    (world, sun, probe)
}

#[test]
fn test_fixed_primary_round_trip() {
    let (mut world, _, probe) = sun_and_probe(true, 1.0);
    let start = world.body(probe).unwrap().clone();
    let period = world.elements_of(probe).unwrap().period().unwrap();

    let dt = period / STEPS_PER_ORBIT as f64;
    for _ in 0..STEPS_PER_ORBIT {
        world.update(dt);
    }

    let end = world.body(probe).unwrap();
    assert_relative_eq!(end.position, start.position, epsilon = 1e-2);
    assert_relative_eq!(end.velocity, start.velocity, epsilon = 1e-3);
}

#[test]
fn test_free_pair_round_trip() {
    // Both bodies move; the relative orbit still closes, since extraction
    // uses the combined mass.
    let (mut world, sun, probe) = sun_and_probe(false, 1e25);
    let relative = |world: &World| {
        let a = world.body(sun).unwrap();
        let b = world.body(probe).unwrap();
        (b.position - a.position, b.velocity - a.velocity)
    };
    let (start_position, start_velocity) = relative(&world);
    let orbit = world.elements_of(probe).unwrap();
    assert_relative_eq!(orbit.mass(), 1.1e26);

    let dt = orbit.period().unwrap() / STEPS_PER_ORBIT as f64;
    for _ in 0..STEPS_PER_ORBIT {
        world.update(dt);
    }

    let (end_position, end_velocity) = relative(&world);
    assert_relative_eq!(end_position, start_position, epsilon = 1e-2);
    assert_relative_eq!(end_velocity, start_velocity, epsilon = 1e-3);
    // The pair as a whole has drifted, though
    assert!(world.body(sun).unwrap().position.y > 0.0);
}

#[test]
fn test_propagation_round_trip() {
    let (world, _, probe) = sun_and_probe(true, 1.0);
    let start = world.body(probe).unwrap().clone();
    let period = world.elements_of(probe).unwrap().period().unwrap();

    let propagation = propagate(&world, probe, period / STEPS_PER_ORBIT as f64, period).unwrap();
    assert_eq!(propagation.len(), STEPS_PER_ORBIT);

    let end = propagation.iter().last().unwrap();
    assert_relative_eq!(end.position, start.position, epsilon = 1e-2);
    assert_relative_eq!(end.velocity, start.velocity, epsilon = 1e-3);

    // Halfway round is apoapsis
    let halfway = propagation.iter().nth(STEPS_PER_ORBIT / 2 - 1).unwrap();
    assert!(halfway.position.x < -1000.0);
    assert_eq!(world.body(probe).unwrap().position, start.position);
}

#[test]
fn test_propagation_matches_live_simulation() {
    let (mut world, _, probe) = sun_and_probe(true, 1.0);
    let dt = 0.1;
    let propagation = propagate(&world, probe, dt, 50.0).unwrap();

    let mut live = vec![];
    for _ in 0..500 {
        world.update(dt);
        live.push(world.body(probe).unwrap().clone());
    }

    for pair in propagation.iter().zip_longest(live.iter()) {
        match pair {
            EitherOrBoth::Both(predicted, actual) => {
                assert_relative_eq!(predicted.position, actual.position, max_relative = 1e-12);
                assert_relative_eq!(predicted.velocity, actual.velocity, max_relative = 1e-12);
                assert_eq!(predicted.forces.len(), 1);
                assert_eq!(predicted.forces[0].source, BodyId(0));
            }
            _ => panic!("propagation and simulation have different lengths"),
        }
    }
}
