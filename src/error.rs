use thiserror::Error;

use crate::maneuver::{NodeStatus, ParentOrbit, PlanId};
use crate::model::BodyId;

pub type SimResult<T> = Result<T, SimError>;

/// Everything the simulation core refuses to do. Degenerate geometry is not
/// in here: it shows up as `NaN`s in derived quantities instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f64),
    #[error("time step must be positive and finite, got {0}")]
    InvalidStep(f64),
    #[error("propagation duration must be non-negative and finite, got {0}")]
    InvalidDuration(f64),
    #[error("burn fraction must be in (0, 1], got {0}")]
    InvalidBurnFraction(f64),
    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
    #[error("gravitational constant must be positive and finite, got {0}")]
    InvalidGravity(f64),
    #[error("no body with id {0}")]
    UnknownBody(BodyId),
    #[error("no maneuver plan with id {0}")]
    UnknownPlan(PlanId),
    #[error("body {0} has no enabled body to orbit")]
    NoAttractor(BodyId),
    #[error("predicted orbit is open (e = {eccentricity})")]
    OpenOrbit { eccentricity: f64 },
    #[error("plan {plan} is {status:?} and can no longer be edited")]
    PlanNotEditable { plan: PlanId, status: NodeStatus },
    #[error("{0:?} is not the active orbit and cannot take a new node")]
    ParentNotActive(ParentOrbit),
    #[error("body {0} is fixed or disabled and cannot be maneuvered")]
    BodyNotControllable(BodyId),
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
}
