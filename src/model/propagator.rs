use nalgebra::Vector3;
use tracing::warn;

use super::body::{Body, BodyId, Force};
use super::gravity::{Gravity, PointMasses};
use super::world::World;
use crate::astro::OrbitalElements;
use crate::error::{SimError, SimResult};
use crate::math::geometry::angular_distance;

/// A prediction of where a body will go, computed by integrating a shadow
/// copy of it while every other enabled body stays put.
///
/// Nothing is computed up front. Iterating (via [Propagation::iter]) runs the
/// integrator and yields one snapshot per step, and can be done as many times
/// as needed; the world is never touched.
#[derive(Debug, Clone)]
pub struct Propagation {
    shadow: Body,
    /// Shadow at index 0, attractors after it.
    initial: PointMasses,
    sources: Vec<BodyId>,
    gravity: Gravity,
    step: f64,
    num_steps: usize,
    /// Position and combined mass of what the shadow starts out orbiting.
    primary: Option<(Vector3<f64>, f64)>,
}

/// Propagates body `id` forward by `duration`, in steps of `dt`.
pub fn propagate(world: &World, id: BodyId, dt: f64, duration: f64) -> SimResult<Propagation> {
    let body = world.body(id)?.clone();
    Propagation::new(world, body, dt, duration)
}

impl Propagation {
    /// Sets up a propagation of `shadow`, which may be a live body or a
    /// hypothetical one. If the shadow shares an id with a live body, that
    /// body is not used as an attractor. A fixed or disabled shadow stays put,
    /// as it would in the live world.
    pub fn new(world: &World, shadow: Body, dt: f64, duration: f64) -> SimResult<Self> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimError::InvalidStep(dt));
        }
        if !(duration >= 0.0 && duration.is_finite()) {
            return Err(SimError::InvalidDuration(duration));
        }

        let sources: Vec<BodyId> = world
            .enabled_bodies()
            .filter(|b| b.id != shadow.id)
            .map(|b| b.id)
            .collect();
        if sources.is_empty() {
            warn!(body = %shadow.id, "propagating a body with nothing to attract it");
        }

        let mut entries = vec![(shadow.position, shadow.velocity, shadow.mass, shadow.is_movable())];
        for id in &sources {
            let b = world.body(*id)?;
            entries.push((b.position, b.velocity, b.mass, false));
        }

        let primary = world
            .find_orbiting_body(&shadow.position, Some(shadow.id))
            .and_then(|id| world.body(id).ok())
            .map(|p| (p.position, p.mass + shadow.mass));

        Ok(Propagation {
            shadow,
            initial: PointMasses::new(&entries),
            sources,
            gravity: *world.gravity(),
            step: dt,
            num_steps: count_steps(duration, dt),
            primary,
        })
    }

    pub fn len(&self) -> usize {
        self.num_steps
    }

    pub fn is_empty(&self) -> bool {
        self.num_steps == 0
    }

    pub fn iter(&self) -> Steps<'_> {
        Steps {
            propagation: self,
            system: self.initial.clone(),
            taken: 0,
        }
    }

    /// The predicted state closest (in straight-line distance) to `target`.
    pub fn closest_to_position(&self, target: &Vector3<f64>) -> Option<Body> {
        self.iter()
            .map(|b| ((b.position - target).norm(), b))
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, b)| b)
    }

    /// The predicted state whose true anomaly (around the body the shadow
    /// started out orbiting) is closest to `anomaly`.
    pub fn closest_to_anomaly(&self, anomaly: f64) -> Option<Body> {
        let (center, mass) = self.primary?;
        let constant = self.gravity.constant;
        self.iter()
            .map(|b| {
                let orbit =
                    OrbitalElements::from_state(&b.position, &b.velocity, &center, mass, constant);
                (angular_distance(orbit.true_anomaly(), anomaly), b)
            })
            .filter(|(d, _)| !d.is_nan())
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, b)| b)
    }
}

impl<'a> IntoIterator for &'a Propagation {
    type Item = Body;
    type IntoIter = Steps<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the snapshots of a [Propagation].
pub struct Steps<'a> {
    propagation: &'a Propagation,
    system: PointMasses,
    taken: usize,
}

impl Iterator for Steps<'_> {
    type Item = Body;

    fn next(&mut self) -> Option<Body> {
        let propagation = self.propagation;
        if self.taken >= propagation.num_steps {
            return None;
        }

        self.system.step(&propagation.gravity, propagation.step);
        self.taken += 1;

        let forces = self
            .system
            .contributions(&propagation.gravity, 0)
            .into_iter()
            .map(|(j, acceleration)| Force {
                source: propagation.sources[j - 1],
                acceleration,
            })
            .collect();

        Some(Body {
            position: self.system.position(0),
            velocity: self.system.velocity(0),
            forces,
            ..propagation.shadow.clone()
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.propagation.num_steps - self.taken;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Steps<'_> {}

/// Number of steps of size `dt` that cover `duration`. A ratio that's an
/// integer up to rounding error isn't bumped up to the next one.
fn count_steps(duration: f64, dt: f64) -> usize {
    let ratio = duration / dt;
    let nearest = ratio.round();
    if (ratio - nearest).abs() < 1e-9 * nearest.max(1.0) {
        nearest as usize
    } else {
        ratio.ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::model::BodyInit;

    fn two_body_world() -> (World, BodyId) {
        let mut world = World::default();
        world
            .add_body(BodyInit::new(Vector3::zeros(), Vector3::zeros(), 1e26).fixed())
            .unwrap();
        let satellite = world
            .add_body(BodyInit::new(
                Vector3::new(1500.0, -500.0, 1000.0),
                Vector3::new(0.0, 20.0, 40.0),
                1.0,
            ))
            .unwrap();
        (world, satellite)
    }

    #[test]
    fn test_count_steps() {
        assert_eq!(count_steps(0.0, 0.5), 0);
        assert_eq!(count_steps(10.0, 0.5), 20);
        assert_eq!(count_steps(10.1, 0.5), 21);
        assert_eq!(count_steps(0.3, 0.1), 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        let (world, satellite) = two_body_world();
        assert!(matches!(
            propagate(&world, satellite, 0.0, 10.0),
            Err(SimError::InvalidStep(_))
        ));
        assert!(matches!(
            propagate(&world, satellite, f64::NAN, 10.0),
            Err(SimError::InvalidStep(_))
        ));
        assert!(matches!(
            propagate(&world, satellite, 0.1, -1.0),
            Err(SimError::InvalidDuration(_))
        ));
        assert!(matches!(
            propagate(&world, BodyId(7), 0.1, 1.0),
            Err(SimError::UnknownBody(_))
        ));
    }

    #[test]
    fn test_zero_duration_is_empty() {
        let (world, satellite) = two_body_world();
        let propagation = propagate(&world, satellite, 0.1, 0.0).unwrap();
        assert!(propagation.is_empty());
        assert_eq!(propagation.iter().count(), 0);
    }

    #[test]
    fn test_does_not_touch_world() {
        let (mut world, satellite) = two_body_world();
        let before = world.body(satellite).unwrap().clone();

        let propagation = propagate(&world, satellite, 0.1, 5.0).unwrap();
        let snapshots: Vec<Body> = propagation.iter().collect();
        assert_eq!(snapshots.len(), 50);

        let after = world.body(satellite).unwrap();
        assert_eq!(after.position, before.position);
        assert_eq!(after.velocity, before.velocity);

        // Same step, same answer as the live integrator
        world.update(0.1);
        assert_relative_eq!(snapshots[0].position, world.body(satellite).unwrap().position);
        assert_relative_eq!(snapshots[0].velocity, world.body(satellite).unwrap().velocity);
        assert_eq!(snapshots[0].id, satellite);
        assert_eq!(snapshots[0].forces[0].source, BodyId(0));
    }

    #[test]
    fn test_fixed_shadow_stays_put() {
        let (world, _) = two_body_world();
        let propagation = propagate(&world, BodyId(0), 0.5, 20.0).unwrap();

        for snapshot in &propagation {
            assert_eq!(snapshot.position, Vector3::zeros());
            assert_eq!(snapshot.velocity, Vector3::zeros());
        }
        assert_eq!(propagation.iter().count(), 40);
    }

    #[test]
    fn test_restartable() {
        let (world, satellite) = two_body_world();
        let propagation = propagate(&world, satellite, 0.5, 10.0).unwrap();

        let first: Vec<_> = propagation.iter().map(|b| b.position).collect();
        let second: Vec<_> = (&propagation).into_iter().map(|b| b.position).collect();
        assert_eq!(first, second);
        assert_eq!(propagation.iter().len(), 20);
    }

    #[test]
    fn test_closest_searches() {
        let (world, satellite) = two_body_world();
        let propagation = propagate(&world, satellite, 0.05, 20.0).unwrap();
        let snapshots: Vec<Body> = propagation.iter().collect();

        let target = snapshots[123].position;
        let closest = propagation.closest_to_position(&target).unwrap();
        assert_eq!(closest.position, target);

        let orbit = world
            .elements_around(satellite, &snapshots[200].position, &snapshots[200].velocity)
            .unwrap();
        let closest = propagation.closest_to_anomaly(orbit.true_anomaly()).unwrap();
        assert_eq!(closest.position, snapshots[200].position);
    }

    #[test]
    fn test_no_primary_no_anomaly_search() {
        let mut world = World::default();
        let lonely = world
            .add_body(BodyInit::new(Vector3::zeros(), Vector3::x(), 1.0))
            .unwrap();

        let propagation = propagate(&world, lonely, 1.0, 3.0).unwrap();
        let last = propagation.iter().last().unwrap();
        // Nothing pulls on it, so it coasts
        assert_relative_eq!(last.position, Vector3::new(3.0, 0.0, 0.0));
        assert!(last.forces.is_empty());
        assert!(propagation.closest_to_anomaly(0.0).is_none());
    }
}
