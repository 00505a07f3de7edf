use std::fmt;

use nalgebra::Vector3;

/// Stable identity of a body: its index in the store. Never reused.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodyId(pub usize);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The acceleration one other body contributed the last time forces were
/// computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    pub source: BodyId,
    pub acceleration: Vector3<f64>,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub name: Option<String>,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub mass: f64,
    /// The integrator never moves a fixed body, but it still attracts others.
    pub fixed: bool,
    /// A disabled body is left out of every force and orbit computation.
    pub disabled: bool,
    /// Cache of the last per-source accelerations; not authoritative.
    pub forces: Vec<Force>,
}

/// Everything needed to add a body to a [World](super::World).
#[derive(Debug, Clone)]
pub struct BodyInit {
    pub name: Option<String>,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub mass: f64,
    pub fixed: bool,
    pub disabled: bool,
}

impl BodyInit {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>, mass: f64) -> Self {
        BodyInit {
            name: None,
            position,
            velocity,
            mass,
            fixed: false,
            disabled: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

impl Body {
    pub(crate) fn from_init(id: BodyId, init: BodyInit) -> Self {
        Body {
            id,
            name: init.name,
            position: init.position,
            velocity: init.velocity,
            mass: init.mass,
            fixed: init.fixed,
            disabled: init.disabled,
            forces: vec![],
        }
    }

    /// Whether the integrator is allowed to move this body.
    pub fn is_movable(&self) -> bool {
        !self.fixed && !self.disabled
    }

    /// Sum of the cached per-source accelerations.
    pub fn total_acceleration(&self) -> Vector3<f64> {
        self.forces.iter().map(|f| f.acceleration).sum()
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("body {}", self.id),
        }
    }
}
