//! Chains of planned velocity changes ("maneuver nodes").
//!
//! Each node is anchored somewhere on its parent orbit (either the controlled
//! body's live orbit, or the orbit predicted by the node before it), and
//! carries a burn split into a prograde and a phase component. Nodes execute
//! oldest-first against the real body once it reaches the anchor.

mod burn;
mod node;
mod planner;

pub use burn::{delta_v, BurnTuning, PhaseReference};
pub use node::{BurnUpdate, NodeRequest, NodeStatus, ParentOrbit, PlanId, PlanNode};
pub use planner::{LoopReport, ManeuverPlanner};
