use std::fmt;

use nalgebra::Vector3;

use super::burn::{delta_v, PhaseReference};
use crate::astro::OrbitalElements;
use crate::model::BodyId;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlanId(pub usize);

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Pending,
    Executing,
    Completed,
    Aborted,
}

/// The orbit a node is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentOrbit {
    /// The live orbit of the controlled body.
    Body(BodyId),
    /// The orbit predicted by another node.
    Plan(PlanId),
}

/// What the caller provides when registering a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRequest {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub target_angle: f64,
    pub prograde: f64,
    pub phase: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnUpdate {
    pub prograde: f64,
    pub phase: f64,
}

#[derive(Debug, Clone)]
pub struct PlanNode {
    pub(super) id: PlanId,
    pub(super) status: NodeStatus,
    pub(super) parent: ParentOrbit,
    // Anchor: where on the parent orbit the burn happens
    pub(super) position: Vector3<f64>,
    pub(super) velocity: Vector3<f64>,
    pub(super) target_angle: f64,
    pub(super) prograde: f64,
    pub(super) phase: f64,
    pub(super) remaining_prograde: f64,
    pub(super) remaining_phase: f64,
    pub(super) predicted: OrbitalElements,
    pub(super) invalid: bool,
    pub(super) accepts_children: bool,
}

impl PlanNode {
    pub fn id(&self) -> PlanId {
        self.id
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn parent(&self) -> ParentOrbit {
        self.parent
    }

    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// True anomaly of the anchor on the parent orbit.
    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    pub fn prograde(&self) -> f64 {
        self.prograde
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Magnitude of the prograde component still to be burned. Never
    /// increases once the node is executing.
    pub fn remaining_prograde(&self) -> f64 {
        self.remaining_prograde
    }

    pub fn remaining_phase(&self) -> f64 {
        self.remaining_phase
    }

    /// The orbit the body is expected to be on after this burn.
    pub fn predicted(&self) -> &OrbitalElements {
        &self.predicted
    }

    /// Set when the predicted orbit can't be drawn (open, or numerically
    /// broken). Invalid nodes are kept but never start executing.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Only the last node in the chain accepts children.
    pub fn accepts_children(&self) -> bool {
        self.accepts_children
    }

    /// The full planned velocity change at the anchor.
    pub fn delta_v(&self, reference: PhaseReference) -> Vector3<f64> {
        delta_v(
            &(self.position - self.predicted.center()),
            &self.velocity,
            self.prograde,
            self.phase,
            reference,
        )
    }

    pub fn is_editable(&self) -> bool {
        self.status == NodeStatus::Pending
    }
}
