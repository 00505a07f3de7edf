use std::fmt;

use crate::astro::OrbitalElements;

/// Human-readable summary of the controlled body's orbit. Angles are in
/// degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub eccentricity: f64,
    pub inclination: f64,
    pub long_asc_node: f64,
    pub arg_periapsis: f64,
    pub true_anomaly: f64,
    pub radius: f64,
    pub speed: f64,
    pub period: Option<f64>,
}

impl Readout {
    pub fn new(orbit: &OrbitalElements) -> Self {
        Readout {
            eccentricity: orbit.eccentricity(),
            inclination: orbit.inclination().to_degrees(),
            long_asc_node: orbit.long_asc_node().to_degrees(),
            arg_periapsis: orbit.arg_periapsis().to_degrees(),
            true_anomaly: orbit.true_anomaly().to_degrees(),
            radius: orbit.radius(),
            speed: orbit.speed(),
            period: orbit.period(),
        }
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Eccentricity: {:.6}", self.eccentricity)?;
        writeln!(f, "- Inclination: {:.3}", self.inclination)?;
        writeln!(f, "- LAN: {:.3}", self.long_asc_node)?;
        writeln!(f, "- Argument of periapsis: {:.3}", self.arg_periapsis)?;
        writeln!(f, "- True anomaly: {:.3}", self.true_anomaly)?;
        writeln!(f, "- Radius: {:.3}", self.radius)?;
        writeln!(f, "- Speed: {:.3}", self.speed)?;
        match self.period {
            Some(period) => write!(f, "- Period: {:.3}", period),
            None => write!(f, "- Period: open orbit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::*;
    use crate::astro::{keplerian_parameters, NEWTON_G};

    #[test]
    fn test_readout() {
        let orbit = keplerian_parameters(
            &Vector3::new(1500.0, -500.0, 1000.0),
            &Vector3::new(0.0, 20.0, 40.0),
            &Vector3::zeros(),
            1e26,
        );
        let readout = Readout::new(&orbit);

        assert_relative_eq!(readout.inclination, 67.411, epsilon = 1e-3);
        assert_relative_eq!(readout.true_anomaly, 159.853, epsilon = 1e-3);
        assert!(readout.period.is_some());

        let text = readout.to_string();
        assert!(text.starts_with("- Eccentricity: 0.544"));
        assert!(text.lines().last().unwrap().starts_with("- Period: "));
    }

    #[test]
    fn test_open_orbit() {
        let orbit = keplerian_parameters(
            &Vector3::new(3000.0, 0.0, 0.0),
            &Vector3::new(10.0, 10.0, 10.0),
            &Vector3::zeros(),
            1.0 / NEWTON_G,
        );
        let readout = Readout::new(&orbit);
        assert_eq!(readout.period, None);
        assert!(readout.to_string().ends_with("- Period: open orbit"));
    }
}
