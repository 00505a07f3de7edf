use std::collections::BTreeMap;

use nalgebra::Vector3;
use tracing::{debug, trace, warn};

use super::burn::{delta_v, BurnTuning};
use super::node::{BurnUpdate, NodeRequest, NodeStatus, ParentOrbit, PlanId, PlanNode};
use crate::astro::OrbitalElements;
use crate::error::{SimError, SimResult};
use crate::math::geometry::angular_distance;
use crate::model::{BodyId, World};

/// What happened during one pass of [`ManeuverPlanner::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopReport {
    pub started: Option<PlanId>,
    pub burned: Option<PlanId>,
    pub completed: Option<PlanId>,
    pub removed: Vec<PlanId>,
}

impl LoopReport {
    pub fn changed(&self) -> bool {
        self.started.is_some()
            || self.burned.is_some()
            || self.completed.is_some()
            || !self.removed.is_empty()
    }
}

/// Owns the chain of maneuver nodes planned for a single controlled body.
///
/// Nodes live in an arena keyed by [`PlanId`]; ids are handed out in
/// increasing order, so the first entry is always the oldest node (and the
/// next one to execute), and the last is the tip of the chain.
#[derive(Debug, Clone)]
pub struct ManeuverPlanner {
    body: BodyId,
    nodes: BTreeMap<PlanId, PlanNode>,
    next_plan_id: usize,
    tuning: BurnTuning,
}

impl ManeuverPlanner {
    pub fn new(body: BodyId, tuning: BurnTuning) -> Self {
        ManeuverPlanner {
            body,
            nodes: BTreeMap::new(),
            next_plan_id: 0,
            tuning,
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn tuning(&self) -> &BurnTuning {
        &self.tuning
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, oldest first.
    pub fn nodes(&self) -> impl Iterator<Item = &PlanNode> + '_ {
        self.nodes.values()
    }

    pub fn node(&self, id: PlanId) -> SimResult<&PlanNode> {
        self.nodes.get(&id).ok_or(SimError::UnknownPlan(id))
    }

    /// Predicted orbits that are fit to be drawn, oldest first.
    pub fn predicted_orbits(&self) -> impl Iterator<Item = (PlanId, &OrbitalElements)> + '_ {
        self.nodes
            .values()
            .filter(|n| !n.invalid)
            .map(|n| (n.id, &n.predicted))
    }

    /// The newest node that hasn't been aborted, if any.
    pub fn active_node(&self) -> Option<PlanId> {
        self.nodes
            .values()
            .rev()
            .find(|n| n.status != NodeStatus::Aborted)
            .map(|n| n.id)
    }

    /// The only orbit new nodes may be attached to: the tip of the chain, or
    /// the body's own orbit if there's no chain.
    pub fn active_orbit(&self) -> ParentOrbit {
        match self.active_node() {
            Some(id) => ParentOrbit::Plan(id),
            None => ParentOrbit::Body(self.body),
        }
    }

    /// Orbit of `parent` as things currently stand.
    pub fn parent_elements(&self, world: &World, parent: ParentOrbit) -> SimResult<OrbitalElements> {
        match parent {
            ParentOrbit::Body(id) => world.elements_of(id),
            ParentOrbit::Plan(id) => Ok(self.node(id)?.predicted),
        }
    }

    /// Position and velocity at true anomaly `target_angle` on `parent`.
    pub fn anchor_on(
        &self,
        world: &World,
        parent: ParentOrbit,
        target_angle: f64,
    ) -> SimResult<(Vector3<f64>, Vector3<f64>)> {
        let orbit = self.parent_elements(world, parent)?;
        orbit
            .state_at_anomaly(target_angle)
            .ok_or(SimError::OpenOrbit {
                eccentricity: orbit.eccentricity(),
            })
    }

    /// Orbit that results from burning `(prograde, phase)` at the given
    /// state.
    fn predict(
        &self,
        world: &World,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        prograde: f64,
        phase: f64,
    ) -> SimResult<OrbitalElements> {
        let primary = world
            .find_orbiting_body(position, Some(self.body))
            .ok_or(SimError::NoAttractor(self.body))?;
        let center = world.body(primary)?.position;
        let dv = delta_v(
            &(position - center),
            velocity,
            prograde,
            phase,
            self.tuning.phase_reference,
        );
        world.elements_around(self.body, position, &(velocity + dv))
    }

    pub fn register_node(
        &mut self,
        world: &World,
        parent: ParentOrbit,
        request: NodeRequest,
    ) -> SimResult<PlanId> {
        if parent != self.active_orbit() {
            return Err(SimError::ParentNotActive(parent));
        }
        if !world.body(self.body)?.is_movable() {
            return Err(SimError::BodyNotControllable(self.body));
        }

        let predicted = self.predict(
            world,
            &request.position,
            &request.velocity,
            request.prograde,
            request.phase,
        )?;
        if !predicted.is_drawable() {
            return Err(SimError::OpenOrbit {
                eccentricity: predicted.eccentricity(),
            });
        }

        let id = PlanId(self.next_plan_id);
        self.next_plan_id += 1;

        let node = PlanNode {
            id,
            status: NodeStatus::Pending,
            parent,
            position: request.position,
            velocity: request.velocity,
            target_angle: request.target_angle,
            prograde: request.prograde,
            phase: request.phase,
            remaining_prograde: request.prograde.abs(),
            remaining_phase: request.phase.abs(),
            predicted,
            invalid: false,
            accepts_children: false,
        };
        self.nodes.insert(id, node);
        self.refresh_interactivity();

        debug!(
            plan = %id,
            ?parent,
            prograde = request.prograde,
            phase = request.phase,
            "registered maneuver node"
        );
        Ok(id)
    }

    /// Replaces a pending node's burn, and re-anchors everything downstream
    /// of it on the new predicted orbits.
    pub fn update_node(&mut self, world: &World, id: PlanId, update: BurnUpdate) -> SimResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(SimError::UnknownPlan(id))?;
        if !node.is_editable() {
            return Err(SimError::PlanNotEditable {
                plan: id,
                status: node.status,
            });
        }

        node.prograde = update.prograde;
        node.phase = update.phase;
        node.remaining_prograde = update.prograde.abs();
        node.remaining_phase = update.phase.abs();
        debug!(plan = %id, prograde = update.prograde, phase = update.phase, "updated maneuver node");

        self.redraw_from(world, Some(id));
        Ok(())
    }

    /// Removes a node, returning the ids of every node that went away.
    ///
    /// With `compact`, downstream nodes survive: the node's direct children
    /// move onto its parent orbit at the same target angle, and everything
    /// after them is translated by the same amount. Without it, all
    /// downstream nodes go too.
    pub fn deregister_node(
        &mut self,
        world: &World,
        id: PlanId,
        compact: bool,
    ) -> SimResult<Vec<PlanId>> {
        let removed_node = self.nodes.remove(&id).ok_or(SimError::UnknownPlan(id))?;
        let mut removed = vec![id];

        if compact {
            self.reattach_children(world, &removed_node);
        } else {
            let downstream: Vec<PlanId> = self.nodes.range(id..).map(|(k, _)| *k).collect();
            for k in downstream {
                self.nodes.remove(&k);
                removed.push(k);
            }
        }

        debug!(plan = %id, compact, removed = removed.len(), "deregistered maneuver node");
        self.refresh_interactivity();
        self.redraw(world);
        Ok(removed)
    }

    fn reattach_children(&mut self, world: &World, removed: &PlanNode) {
        let children: Vec<PlanId> = self
            .nodes
            .values()
            .filter(|n| n.parent == ParentOrbit::Plan(removed.id))
            .map(|n| n.id)
            .collect();
        let Some(&first) = children.first() else {
            return;
        };

        for child in &children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = removed.parent;
            }
        }

        let (old_position, old_velocity, target_angle) = {
            let node = &self.nodes[&first];
            (node.position, node.velocity, node.target_angle)
        };
        let (position, velocity) = match self.anchor_on(world, removed.parent, target_angle) {
            Ok(anchor) => anchor,
            Err(err) => {
                warn!(plan = %first, %err, "could not re-anchor node; leaving it in place");
                return;
            }
        };

        let shift = (position - old_position, velocity - old_velocity);
        for node in self.nodes.range_mut(first..).map(|(_, n)| n) {
            node.position += shift.0;
            node.velocity += shift.1;
        }
        debug!(plan = %first, shift = ?shift.0, "re-anchored downstream nodes");
    }

    /// Marks a node for removal; the next [`tick`](Self::tick) sweeps it up,
    /// along with everything downstream of it.
    pub fn abort_node(&mut self, id: PlanId) -> SimResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(SimError::UnknownPlan(id))?;
        match node.status {
            NodeStatus::Pending | NodeStatus::Executing => {
                node.status = NodeStatus::Aborted;
                debug!(plan = %id, "aborted maneuver node");
                Ok(())
            }
            NodeStatus::Aborted => Ok(()),
            status @ NodeStatus::Completed => Err(SimError::PlanNotEditable { plan: id, status }),
        }
    }

    /// Recomputes every node's predicted orbit from its anchor and burn.
    pub fn redraw(&mut self, world: &World) {
        self.redraw_from(world, None)
    }

    /// Like `redraw`, but nodes newer than `reanchor_after` that hang off
    /// another node are first moved to their target angle on that node's
    /// (freshly predicted) orbit.
    fn redraw_from(&mut self, world: &World, reanchor_after: Option<PlanId>) {
        let ids: Vec<PlanId> = self.nodes.keys().copied().collect();
        for id in ids {
            let (parent, target_angle) = {
                let node = &self.nodes[&id];
                (node.parent, node.target_angle)
            };
            let needs_anchor = matches!(parent, ParentOrbit::Plan(_))
                && reanchor_after.map_or(false, |after| id > after);
            if needs_anchor {
                match self.anchor_on(world, parent, target_angle) {
                    Ok((position, velocity)) => {
                        if let Some(node) = self.nodes.get_mut(&id) {
                            node.position = position;
                            node.velocity = velocity;
                        }
                    }
                    Err(err) => warn!(plan = %id, %err, "could not re-anchor node"),
                }
            }

            let prediction = {
                let node = &self.nodes[&id];
                self.predict(world, &node.position, &node.velocity, node.prograde, node.phase)
            };
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let was_invalid = node.invalid;
            match prediction {
                Ok(orbit) => {
                    node.invalid = !orbit.is_drawable();
                    node.predicted = orbit;
                }
                Err(err) => {
                    warn!(plan = %id, %err, "could not predict orbit");
                    node.invalid = true;
                }
            }
            if node.invalid && !was_invalid {
                warn!(
                    plan = %id,
                    eccentricity = node.predicted.eccentricity(),
                    "predicted orbit is no longer drawable"
                );
            }
        }
    }

    fn refresh_interactivity(&mut self) {
        let active = self.active_node();
        for node in self.nodes.values_mut() {
            node.accepts_children = Some(node.id) == active;
        }
    }

    /// One pass of the maneuver loop: sweep aborted nodes, then (unless
    /// `frozen`) start or continue the oldest node's burn.
    pub fn tick(&mut self, world: &mut World, frozen: bool) -> LoopReport {
        let mut report = LoopReport::default();

        let aborted: Vec<PlanId> = self
            .nodes
            .values()
            .filter(|n| n.status == NodeStatus::Aborted)
            .map(|n| n.id)
            .collect();
        for id in aborted {
            if self.nodes.contains_key(&id) {
                if let Ok(removed) = self.deregister_node(world, id, false) {
                    report.removed.extend(removed);
                }
            }
        }

        if !frozen {
            self.execute(world, &mut report);
        }

        self.refresh_interactivity();
        report
    }

    fn execute(&mut self, world: &mut World, report: &mut LoopReport) {
        let Some(node) = self.nodes.values_mut().next() else {
            return;
        };
        let id = node.id;

        if node.status == NodeStatus::Pending {
            if node.invalid {
                return;
            }
            let current = match world.elements_of(self.body) {
                Ok(orbit) => orbit,
                Err(err) => {
                    warn!(plan = %id, %err, "cannot locate controlled body");
                    return;
                }
            };
            let distance = angular_distance(current.true_anomaly(), node.target_angle);
            if distance.is_nan() || distance > self.tuning.tolerance {
                return;
            }
            node.status = NodeStatus::Executing;
            report.started = Some(id);
            debug!(plan = %id, anomaly = current.true_anomaly(), "starting burn");
        }
        if node.status != NodeStatus::Executing {
            return;
        }

        let (relative_position, velocity) = match world
            .primary_of(self.body)
            .and_then(|primary| world.body(primary).map(|p| p.position))
            .and_then(|center| world.body(self.body).map(|b| (b.position - center, b.velocity)))
        {
            Ok(state) => state,
            Err(err) => {
                warn!(plan = %id, %err, "cannot burn");
                return;
            }
        };

        let prograde_step = self.tuning.increment(node.remaining_prograde);
        let phase_step = self.tuning.increment(node.remaining_phase);
        let dv = delta_v(
            &relative_position,
            &velocity,
            prograde_step.copysign(node.prograde),
            phase_step.copysign(node.phase),
            self.tuning.phase_reference,
        );
        if let Err(err) = world.apply_delta_v(self.body, dv) {
            warn!(plan = %id, %err, "cannot burn");
            return;
        }
        node.remaining_prograde -= prograde_step;
        node.remaining_phase -= phase_step;
        report.burned = Some(id);
        trace!(
            plan = %id,
            remaining_prograde = node.remaining_prograde,
            remaining_phase = node.remaining_phase,
            "burn increment"
        );

        if node.remaining_prograde <= 0.0 && node.remaining_phase <= 0.0 {
            node.status = NodeStatus::Completed;
            report.completed = Some(id);
            debug!(plan = %id, "burn complete");
            match self.deregister_node(world, id, true) {
                Ok(removed) => report.removed.extend(removed),
                Err(err) => warn!(plan = %id, %err, "could not retire completed node"),
            }
        }
    }
}
