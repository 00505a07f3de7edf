use nalgebra::Vector3;

use super::body::{Body, BodyId, BodyInit, Force};
use super::gravity::{Gravity, PointMasses};
use crate::astro::OrbitalElements;
use crate::error::{SimError, SimResult};

/// The body store: the authoritative list of simulated point masses.
///
/// Bodies are only ever appended; to take one out of the simulation, disable
/// it. A body's id is its index in the store.
#[derive(Debug, Clone, Default)]
pub struct World {
    bodies: Vec<Body>,
    gravity: Gravity,
}

impl World {
    pub fn new(gravity: Gravity) -> Self {
        World {
            bodies: vec![],
            gravity,
        }
    }

    pub fn gravity(&self) -> &Gravity {
        &self.gravity
    }

    pub fn add_body(&mut self, init: BodyInit) -> SimResult<BodyId> {
        if !(init.mass > 0.0 && init.mass.is_finite()) {
            return Err(SimError::InvalidMass(init.mass));
        }

        let id = BodyId(self.bodies.len());
        self.bodies.push(Body::from_init(id, init));
        Ok(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies.iter()
    }

    pub fn enabled_bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies.iter().filter(|b| !b.disabled)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn body(&self, id: BodyId) -> SimResult<&Body> {
        self.bodies.get(id.0).ok_or(SimError::UnknownBody(id))
    }

    fn body_mut(&mut self, id: BodyId) -> SimResult<&mut Body> {
        self.bodies.get_mut(id.0).ok_or(SimError::UnknownBody(id))
    }

    pub fn set_disabled(&mut self, id: BodyId, disabled: bool) -> SimResult<()> {
        let body = self.body_mut(id)?;
        body.disabled = disabled;
        if disabled {
            body.forces.clear();
        }
        Ok(())
    }

    pub fn set_state(
        &mut self,
        id: BodyId,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
    ) -> SimResult<()> {
        let body = self.body_mut(id)?;
        body.position = position;
        body.velocity = velocity;
        Ok(())
    }

    /// Instantaneously changes a body's velocity.
    pub fn apply_delta_v(&mut self, id: BodyId, delta_v: Vector3<f64>) -> SimResult<()> {
        let body = self.body_mut(id)?;
        if !body.is_movable() {
            return Err(SimError::BodyNotControllable(id));
        }
        body.velocity += delta_v;
        Ok(())
    }

    /// Advances every movable body by one RK4 step of length `dt`, and
    /// refreshes the force cache of every enabled body.
    pub fn update(&mut self, dt: f64) {
        let ids: Vec<BodyId> = self.enabled_bodies().map(|b| b.id).collect();
        let mut system = self.point_masses(&ids, |b| b.is_movable());

        system.step(&self.gravity, dt);

        for (i, id) in ids.iter().enumerate() {
            let forces = system
                .contributions(&self.gravity, i)
                .into_iter()
                .map(|(j, acceleration)| Force {
                    source: ids[j],
                    acceleration,
                })
                .collect();

            let body = &mut self.bodies[id.0];
            if body.is_movable() {
                body.position = system.position(i);
                body.velocity = system.velocity(i);
            }
            body.forces = forces;
        }
    }

    /// Packs the given bodies into an integrator state, in order.
    pub(crate) fn point_masses(
        &self,
        ids: &[BodyId],
        movable: impl Fn(&Body) -> bool,
    ) -> PointMasses {
        let entries: Vec<_> = ids
            .iter()
            .map(|id| &self.bodies[id.0])
            .map(|b| (b.position, b.velocity, b.mass, movable(b)))
            .collect();
        PointMasses::new(&entries)
    }

    /// The enabled body that pulls hardest on something sitting at
    /// `position`. `exclude` keeps a body from being picked as its own
    /// primary.
    pub fn find_orbiting_body(
        &self,
        position: &Vector3<f64>,
        exclude: Option<BodyId>,
    ) -> Option<BodyId> {
        self.enabled_bodies()
            .filter(|b| Some(b.id) != exclude)
            .map(|b| {
                let pull = self.gravity.acceleration(position, &b.position, b.mass);
                (b.id, pull.norm())
            })
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }

    /// The primary that body `id` is currently orbiting.
    pub fn primary_of(&self, id: BodyId) -> SimResult<BodyId> {
        let body = self.body(id)?;
        self.find_orbiting_body(&body.position, Some(id))
            .ok_or(SimError::NoAttractor(id))
    }

    /// Orbital elements of body `id` around its current primary, using the
    /// combined mass of the pair.
    pub fn elements_of(&self, id: BodyId) -> SimResult<OrbitalElements> {
        let body = self.body(id)?;
        self.elements_around(id, &body.position, &body.velocity)
    }

    /// Orbital elements of an arbitrary state, treated as if it were body
    /// `id`'s.
    pub fn elements_around(
        &self,
        id: BodyId,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> SimResult<OrbitalElements> {
        let body = self.body(id)?;
        let primary = self
            .find_orbiting_body(position, Some(id))
            .ok_or(SimError::NoAttractor(id))?;
        let primary = self.body(primary)?;

        Ok(OrbitalElements::from_state(
            position,
            velocity,
            &primary.position,
            primary.mass + body.mass,
            self.gravity.constant,
        ))
    }
}
