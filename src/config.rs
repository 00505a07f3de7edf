//! Tunables and scenario files, both read from TOML.

use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::Deserialize;

use crate::astro::NEWTON_G;
use crate::error::{SimError, SimResult};
use crate::maneuver::{BurnTuning, PhaseReference};
use crate::model::{BodyId, BodyInit, Gravity};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub gravitational_constant: f64,
    pub softening: f64,
    /// Step used when driving the live simulation.
    pub time_step: f64,
    pub preview_step: f64,
    /// Zero means "one period of the live orbit".
    pub preview_duration: f64,
    pub execution_tolerance_deg: f64,
    pub burn_fraction: f64,
    pub burn_epsilon: f64,
    pub phase_reference: PhaseReference,
    pub start_frozen: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            gravitational_constant: NEWTON_G,
            softening: 0.1,
            time_step: 0.25,
            preview_step: 0.25,
            preview_duration: 0.0,
            execution_tolerance_deg: 1.0,
            burn_fraction: 1.0 / 15.0,
            burn_epsilon: 1e-6,
            phase_reference: PhaseReference::OrbitNormal,
            start_frozen: true,
        }
    }
}

impl SimConfig {
    pub fn gravity(&self) -> Gravity {
        Gravity::new(self.gravitational_constant, self.softening)
    }

    pub fn burn_tuning(&self) -> BurnTuning {
        BurnTuning {
            tolerance: self.execution_tolerance_deg.to_radians(),
            fraction: self.burn_fraction,
            epsilon: self.burn_epsilon,
            phase_reference: self.phase_reference,
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let constant = self.gravitational_constant;
        if !(constant > 0.0 && constant.is_finite()) {
            return Err(SimError::InvalidGravity(constant));
        }
        if !(self.softening >= 0.0 && self.softening.is_finite()) {
            return Err(SimError::InvalidTolerance {
                name: "softening",
                value: self.softening,
            });
        }
        for step in [self.time_step, self.preview_step] {
            if !(step > 0.0 && step.is_finite()) {
                return Err(SimError::InvalidStep(step));
            }
        }
        if !(self.preview_duration >= 0.0 && self.preview_duration.is_finite()) {
            return Err(SimError::InvalidDuration(self.preview_duration));
        }
        self.burn_tuning().validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl From<&BodyConfig> for BodyInit {
    fn from(config: &BodyConfig) -> Self {
        BodyInit {
            name: config.name.clone(),
            position: Vector3::from(config.position),
            velocity: Vector3::from(config.velocity),
            mass: config.mass,
            fixed: config.fixed,
            disabled: config.disabled,
        }
    }
}

/// A node to register at start-up, on whatever the active orbit is at that
/// point.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    pub target_angle_deg: f64,
    #[serde(default)]
    pub prograde: f64,
    #[serde(default)]
    pub phase: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub simulation: SimConfig,
    pub bodies: Vec<BodyConfig>,
    /// Index into `bodies` of the body that maneuvers are planned for.
    pub controlled: usize,
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> SimResult<Self> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> SimResult<()> {
        self.simulation.validate()?;
        if let Some(body) = self
            .bodies
            .iter()
            .find(|b| !(b.mass > 0.0 && b.mass.is_finite()))
        {
            return Err(SimError::InvalidMass(body.mass));
        }
        if self.controlled >= self.bodies.len() {
            return Err(SimError::UnknownBody(BodyId(self.controlled)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const SCENARIO: &str = r#"
controlled = 1

[simulation]
time_step = 0.1
execution_tolerance_deg = 2.0
phase_reference = { world-axis = [0.0, 0.0, 1.0] }

[[bodies]]
name = "Sun"
position = [0.0, 0.0, 0.0]
velocity = [0.0, 0.0, 0.0]
mass = 1e26
fixed = true

[[bodies]]
name = "Probe"
position = [1000.0, 0.0, 0.0]
velocity = [0.0, 90.0, 0.0]
mass = 1.0

[[plans]]
target_angle_deg = 180.0
prograde = 5.0
"#;

    #[test]
    fn test_defaults() {
        let config: SimConfig = toml::from_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert!(config.start_frozen);
        assert_relative_eq!(config.burn_tuning().tolerance, 1.0_f64.to_radians());
        assert_eq!(config.phase_reference, PhaseReference::OrbitNormal);
    }

    #[test]
    fn test_load_scenario() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();

        assert_eq!(scenario.controlled, 1);
        assert_relative_eq!(scenario.simulation.time_step, 0.1);
        // Unset keys keep their defaults
        assert_relative_eq!(scenario.simulation.preview_step, 0.25);
        assert_eq!(
            scenario.simulation.phase_reference,
            PhaseReference::WorldAxis([0.0, 0.0, 1.0])
        );

        let sun = BodyInit::from(&scenario.bodies[0]);
        assert_eq!(sun.name.as_deref(), Some("Sun"));
        assert!(sun.fixed);
        assert!(!sun.disabled);
        assert_eq!(BodyInit::from(&scenario.bodies[1]).velocity, Vector3::new(0.0, 90.0, 0.0));

        assert_eq!(scenario.plans.len(), 1);
        assert_relative_eq!(scenario.plans[0].phase, 0.0);
    }

    #[test]
    fn test_rejects_bad_scenarios() {
        let massless = SCENARIO.replace("mass = 1.0", "mass = 0.0");
        assert!(matches!(
            Scenario::from_toml(&massless),
            Err(SimError::InvalidMass(_))
        ));

        let uncontrolled = SCENARIO.replace("controlled = 1", "controlled = 2");
        assert!(matches!(
            Scenario::from_toml(&uncontrolled),
            Err(SimError::UnknownBody(BodyId(2)))
        ));

        let bad_step = SCENARIO.replace("time_step = 0.1", "time_step = -0.1");
        assert!(matches!(
            Scenario::from_toml(&bad_step),
            Err(SimError::InvalidStep(_))
        ));

        let stalled = SCENARIO.replace("time_step = 0.1", "time_step = 0.1\nburn_fraction = 0.0");
        assert!(matches!(
            Scenario::from_toml(&stalled),
            Err(SimError::InvalidBurnFraction(_))
        ));

        let overshoot = SCENARIO.replace("time_step = 0.1", "time_step = 0.1\nburn_fraction = 1.5");
        assert!(matches!(
            Scenario::from_toml(&overshoot),
            Err(SimError::InvalidBurnFraction(_))
        ));

        let loose = SCENARIO.replace("execution_tolerance_deg = 2.0", "execution_tolerance_deg = -2.0");
        assert!(matches!(
            Scenario::from_toml(&loose),
            Err(SimError::InvalidTolerance { name: "execution tolerance", .. })
        ));

        let negative_epsilon = SCENARIO.replace("time_step = 0.1", "time_step = 0.1\nburn_epsilon = -1e-6");
        assert!(matches!(
            Scenario::from_toml(&negative_epsilon),
            Err(SimError::InvalidTolerance { name: "burn epsilon", .. })
        ));

        let no_gravity = SCENARIO.replace("time_step = 0.1", "time_step = 0.1\ngravitational_constant = 0.0");
        assert!(matches!(
            Scenario::from_toml(&no_gravity),
            Err(SimError::InvalidGravity(_))
        ));

        let typo = SCENARIO.replace("time_step", "timestep");
        assert!(matches!(Scenario::from_toml(&typo), Err(SimError::Parse(_))));

        // NaN can't be written in TOML by accident, but can be set in code
        let mut config = SimConfig::default();
        config.burn_fraction = f64::NAN;
        assert!(matches!(config.validate(), Err(SimError::InvalidBurnFraction(_))));
        config.burn_fraction = 1.0;
        config.burn_epsilon = f64::NAN;
        assert!(matches!(config.validate(), Err(SimError::InvalidTolerance { .. })));
        config.burn_epsilon = 0.0;
        config.gravitational_constant = f64::INFINITY;
        assert!(matches!(config.validate(), Err(SimError::InvalidGravity(_))));

        assert!(matches!(
            Scenario::load("no/such/scenario.toml"),
            Err(SimError::Io(_))
        ));
    }
}
