//! The simulation context: owns the body store and the maneuver planner,
//! drives them once per tick, and tells observers what changed.

mod dispatch;
mod readout;

pub use dispatch::{Dispatcher, Listener, Notification};
pub use readout::Readout;

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::config::{Scenario, SimConfig};
use crate::error::{SimError, SimResult};
use crate::maneuver::{BurnUpdate, LoopReport, ManeuverPlanner, NodeRequest, ParentOrbit, PlanId};
use crate::math::geometry::wrap_angle;
use crate::model::{Body, BodyId, BodyInit, Propagation, World};

/// Longest preview we'll produce when the duration is left to us.
pub const MAX_PREVIEW_STEPS: usize = 10_000;

#[derive(Debug)]
pub struct Simulation {
    world: World,
    planner: ManeuverPlanner,
    dispatcher: Dispatcher,
    config: SimConfig,
    time: f64,
    frozen: bool,
    show_delta_v: bool,
    target_angle: f64,
    readout: Option<Readout>,
}

impl Simulation {
    pub fn new(world: World, controlled: BodyId, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        world.body(controlled)?;

        let planner = ManeuverPlanner::new(controlled, config.burn_tuning());
        let mut simulation = Simulation {
            world,
            planner,
            dispatcher: Dispatcher::new(),
            frozen: config.start_frozen,
            config,
            time: 0.0,
            show_delta_v: true,
            target_angle: 0.0,
            readout: None,
        };
        simulation.refresh_readout();
        Ok(simulation)
    }

    /// Builds the world described by `scenario`, then registers its plans in
    /// order, each on the orbit left by the one before.
    pub fn from_scenario(scenario: &Scenario) -> SimResult<Self> {
        let mut world = World::new(scenario.simulation.gravity());
        for body in &scenario.bodies {
            world.add_body(body.into())?;
        }

        let mut simulation =
            Simulation::new(world, BodyId(scenario.controlled), scenario.simulation.clone())?;
        for plan in &scenario.plans {
            simulation.register_node_at(plan.target_angle_deg.to_radians(), plan.prograde, plan.phase)?;
        }

        info!(
            bodies = simulation.world.len(),
            plans = simulation.planner.len(),
            "loaded scenario"
        );
        Ok(simulation)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn planner(&self) -> &ManeuverPlanner {
        &self.planner
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn controlled(&self) -> BodyId {
        self.planner.body()
    }

    /// Simulated seconds elapsed; doesn't advance while frozen.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Orbit summary of the controlled body, as of the last tick or edit.
    /// `None` when it has nothing to orbit.
    pub fn readout(&self) -> Option<&Readout> {
        self.readout.as_ref()
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&Notification) + 'static) {
        self.dispatcher.add_listener(listener);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        debug!(frozen, "freeze toggled");
        self.dispatcher.dispatch(Notification::FreezeChanged(frozen));
    }

    pub fn show_delta_v(&self) -> bool {
        self.show_delta_v
    }

    pub fn set_show_delta_v(&mut self, show: bool) {
        self.show_delta_v = show;
        self.dispatcher.dispatch(Notification::ShowDeltaVChanged(show));
    }

    /// The anomaly currently picked out for the next node.
    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    pub fn set_target_angle(&mut self, angle: f64) {
        self.target_angle = wrap_angle(angle);
        self.dispatcher
            .dispatch(Notification::TargetAngleChanged(self.target_angle));
    }

    pub fn add_body(&mut self, init: BodyInit) -> SimResult<BodyId> {
        let id = self.world.add_body(init)?;
        self.after_body_edit(id);
        Ok(id)
    }

    pub fn set_body_disabled(&mut self, id: BodyId, disabled: bool) -> SimResult<()> {
        self.world.set_disabled(id, disabled)?;
        self.after_body_edit(id);
        Ok(())
    }

    /// Teleports a body. Predicted orbits are recomputed, since they may
    /// depend on where the primaries are.
    pub fn set_body_state(
        &mut self,
        id: BodyId,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
    ) -> SimResult<()> {
        self.world.set_state(id, position, velocity)?;
        self.after_body_edit(id);
        Ok(())
    }

    fn after_body_edit(&mut self, id: BodyId) {
        self.planner.redraw(&self.world);
        self.refresh_readout();
        self.dispatcher.dispatch(Notification::BodyChanged(id));
    }

    /// Registers a node on the active orbit.
    pub fn register_node(&mut self, request: NodeRequest) -> SimResult<PlanId> {
        let parent = self.planner.active_orbit();
        let id = self.planner.register_node(&self.world, parent, request)?;
        self.dispatcher.dispatch(Notification::PlanRegistered(id));
        if self.show_delta_v {
            self.dispatcher.dispatch(Notification::ShowDeltaVChanged(true));
        }
        Ok(id)
    }

    /// Registers a node at true anomaly `target_angle` of the active orbit.
    pub fn register_node_at(&mut self, target_angle: f64, prograde: f64, phase: f64) -> SimResult<PlanId> {
        let parent = self.planner.active_orbit();
        let (position, velocity) = self.planner.anchor_on(&self.world, parent, target_angle)?;
        self.register_node(NodeRequest {
            position,
            velocity,
            target_angle: wrap_angle(target_angle),
            prograde,
            phase,
        })
    }

    /// Registers a node at the currently picked target angle.
    pub fn register_node_at_target(&mut self, prograde: f64, phase: f64) -> SimResult<PlanId> {
        self.register_node_at(self.target_angle, prograde, phase)
    }

    pub fn update_node(&mut self, id: PlanId, update: BurnUpdate) -> SimResult<()> {
        self.planner.update_node(&self.world, id, update)?;
        self.dispatcher.dispatch(Notification::PlanUpdated(id));
        Ok(())
    }

    pub fn deregister_node(&mut self, id: PlanId, compact: bool) -> SimResult<Vec<PlanId>> {
        let removed = self.planner.deregister_node(&self.world, id, compact)?;
        self.dispatcher
            .dispatch(Notification::PlansRemoved(removed.clone()));
        Ok(removed)
    }

    pub fn abort_node(&mut self, id: PlanId) -> SimResult<()> {
        self.planner.abort_node(id)?;
        self.dispatcher.dispatch(Notification::PlanAborted(id));
        Ok(())
    }

    /// Predicted path of the controlled body, with nothing else moving.
    pub fn preview(&self) -> SimResult<Propagation> {
        let body = self.world.body(self.controlled())?.clone();
        let period = self
            .world
            .elements_of(body.id)
            .ok()
            .and_then(|orbit| orbit.period());
        Propagation::new(
            &self.world,
            body,
            self.config.preview_step,
            self.preview_duration(period),
        )
    }

    /// Predicted path of the controlled body right after node `id` burns.
    pub fn preview_plan(&self, id: PlanId) -> SimResult<Propagation> {
        let node = self.planner.node(id)?;
        let mut shadow = self.world.body(self.controlled())?.clone();
        shadow.position = node.position();
        shadow.velocity = node.velocity() + node.delta_v(self.config.phase_reference);
        shadow.forces.clear();

        let period = node.predicted().period();
        Propagation::new(
            &self.world,
            shadow,
            self.config.preview_step,
            self.preview_duration(period),
        )
    }

    /// Predicted path along the active orbit, the one new nodes attach to.
    pub fn preview_active(&self) -> SimResult<Propagation> {
        match self.planner.active_orbit() {
            ParentOrbit::Body(_) => self.preview(),
            ParentOrbit::Plan(id) => self.preview_plan(id),
        }
    }

    /// Points the target angle at the spot on the active orbit nearest to
    /// `point` (say, where the user clicked). Returns the new angle.
    pub fn pick_target(&mut self, point: &Vector3<f64>) -> SimResult<f64> {
        let path = self.preview_active()?;
        let Some(nearest) = path.closest_to_position(point) else {
            return Err(SimError::InvalidDuration(0.0));
        };
        let orbit = self
            .world
            .elements_around(nearest.id, &nearest.position, &nearest.velocity)?;
        self.set_target_angle(orbit.true_anomaly());
        Ok(self.target_angle)
    }

    /// Where on the active orbit the target angle currently falls, for
    /// drawing a marker. `None` if the orbit has no primary to measure
    /// anomalies from.
    pub fn target_marker(&self) -> SimResult<Option<Body>> {
        Ok(self.preview_active()?.closest_to_anomaly(self.target_angle))
    }

    fn preview_duration(&self, period: Option<f64>) -> f64 {
        if self.config.preview_duration > 0.0 {
            return self.config.preview_duration;
        }
        let cap = self.config.preview_step * MAX_PREVIEW_STEPS as f64;
        match period {
            Some(period) if period.is_finite() => period.min(cap),
            _ => cap,
        }
    }

    /// One step of the whole system: physics (unless frozen), then the
    /// maneuver loop, then the readout.
    pub fn tick(&mut self, dt: f64) -> SimResult<LoopReport> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimError::InvalidStep(dt));
        }

        if !self.frozen {
            self.world.update(dt);
            self.time += dt;
        }
        let report = self.planner.tick(&mut self.world, self.frozen);
        self.refresh_readout();

        if !self.frozen {
            self.dispatcher.dispatch(Notification::Ticked);
        }
        if let Some(id) = report.started {
            self.dispatcher.dispatch(Notification::BurnStarted(id));
        }
        if let Some(id) = report.completed {
            self.dispatcher.dispatch(Notification::BurnCompleted(id));
        }
        if !report.removed.is_empty() {
            self.dispatcher
                .dispatch(Notification::PlansRemoved(report.removed.clone()));
        }
        Ok(report)
    }

    fn refresh_readout(&mut self) {
        self.readout = self
            .world
            .elements_of(self.controlled())
            .ok()
            .map(|orbit| Readout::new(&orbit));
    }
}
