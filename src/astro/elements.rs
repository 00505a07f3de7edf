use std::f64::consts::PI;

use nalgebra::{Rotation3, Vector3};

use super::NEWTON_G;
use crate::math::geometry::{directed_angle, guarded_acos, wrap_angle};

/// Below this eccentricity there's no meaningful periapsis direction.
const CIRCULAR_TOLERANCE: f64 = 1e-10;

/// The classical (Keplerian) elements of an orbit, plus some derived
/// quantities.
///
/// These are computed on demand from a position and velocity and never stored
/// as authoritative state. Everything here is a best-effort computation: for
/// open orbits (`e >= 1`) the semi-major axis, semi-minor axis and period are
/// meaningless, which is why the accessors for the latter return `Option`.
/// Degenerate input (coincident bodies, zero mass) can produce `NaN`s; use
/// [OrbitalElements::is_drawable] to filter those out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    semimajor_axis: f64,
    eccentricity: f64,
    inclination: f64,
    long_asc_node: f64,
    arg_periapsis: f64,
    true_anomaly: f64,
    radius: f64,
    speed: f64,
    center: Vector3<f64>,
    mass: f64,
    mu: f64,
    angular_momentum: Vector3<f64>,
    eccentricity_vector: Vector3<f64>,
}

/// Computes the orbital elements of a body at `position` moving with
/// `velocity`, around an attractor at `center` with the given combined mass.
pub fn keplerian_parameters(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    center: &Vector3<f64>,
    combined_mass: f64,
) -> OrbitalElements {
    OrbitalElements::from_state(position, velocity, center, combined_mass, NEWTON_G)
}

impl OrbitalElements {
    /// Like [keplerian_parameters], but with an explicit gravitational
    /// constant.
    pub fn from_state(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        center: &Vector3<f64>,
        combined_mass: f64,
        gravitational_constant: f64,
    ) -> Self {
        let mu = gravitational_constant * combined_mass;

        // Everything is done in the frame of the attracting body
        let r_vec = position - center;
        let r = r_vec.norm();
        let v = velocity.norm();

        let h_vec = r_vec.cross(velocity);
        let h = h_vec.norm();

        // LRL vector = v x h / mu - r/|r|
        let e_vec = if mu == 0.0 || r == 0.0 {
            Vector3::zeros()
        } else {
            velocity.cross(&h_vec) / mu - r_vec / r
        };
        let e = e_vec.norm();
        let circular = e < CIRCULAR_TOLERANCE;

        // Inclination is the angle the normal makes with z
        let inclination = guarded_acos(h_vec.z, h);

        // The ascending node lies along z x h. If the orbit is equatorial
        // there's no such line, and we use the x-axis in its place.
        let node = Vector3::z().cross(&h_vec);
        let n = node.norm();

        let long_asc_node = if node.y < 0.0 {
            2.0 * PI - guarded_acos(node.x, n)
        } else {
            guarded_acos(node.x, n)
        };

        let arg_periapsis = if circular {
            0.0
        } else if n == 0.0 {
            directed_angle(&Vector3::x(), &e_vec, &h_vec)
        } else if e_vec.z < 0.0 {
            2.0 * PI - guarded_acos(node.dot(&e_vec), n * e)
        } else {
            guarded_acos(node.dot(&e_vec), n * e)
        };

        // On a circular orbit there's no periapsis, so the anomaly is
        // measured from the line of nodes instead.
        let true_anomaly = if circular {
            let reference = if n == 0.0 { Vector3::x() } else { node };
            directed_angle(&reference, &r_vec, &h_vec)
        } else if r_vec.dot(velocity) < 0.0 {
            2.0 * PI - guarded_acos(r_vec.dot(&e_vec), r * e)
        } else {
            guarded_acos(r_vec.dot(&e_vec), r * e)
        };

        // Vis-viva: E = v^2/2 - mu/r, and a = -mu / 2E
        let energy = v * v / 2.0 - mu / r;
        let semimajor_axis = -mu / (2.0 * energy);

        OrbitalElements {
            semimajor_axis,
            eccentricity: e,
            inclination,
            long_asc_node,
            arg_periapsis,
            true_anomaly,
            radius: r,
            speed: v,
            center: *center,
            mass: combined_mass,
            mu,
            angular_momentum: h_vec,
            eccentricity_vector: e_vec,
        }
    }

    // -- Orbital elements --

    /// Best-effort semi-major axis. Negative for hyperbolic orbits.
    pub fn semimajor_axis(&self) -> f64 {
        self.semimajor_axis
    }

    /// Best-effort semi-minor axis, `a sqrt|1 - e^2|`.
    pub fn semiminor_axis(&self) -> f64 {
        self.semimajor_axis * (1.0 - self.eccentricity.powi(2)).abs().sqrt()
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    /// Right ascension of the ascending node, in [0, 2pi).
    pub fn long_asc_node(&self) -> f64 {
        self.long_asc_node
    }

    pub fn arg_periapsis(&self) -> f64 {
        self.arg_periapsis
    }

    pub fn true_anomaly(&self) -> f64 {
        self.true_anomaly
    }

    /// Eccentric anomaly, in [0, 2pi). Only defined on closed orbits.
    pub fn eccentric_anomaly(&self) -> Option<f64> {
        if !self.is_closed() {
            return None;
        }
        // tan(E/2) = sqrt((1-e)/(1+e)) * tan(theta/2)
        let e = self.eccentricity;
        let factor = ((1.0 - e) / (1.0 + e)).sqrt();
        let half_theta = self.true_anomaly / 2.0;
        let ecc = 2.0 * (factor * half_theta.sin()).atan2(half_theta.cos());
        Some(wrap_angle(ecc))
    }

    // -- Other characteristics --

    pub fn is_closed(&self) -> bool {
        self.eccentricity < 1.0 && self.semimajor_axis > 0.0
    }

    /// Whether this orbit is a closed ellipse with every element finite, and
    /// so can be handed to something that draws it.
    pub fn is_drawable(&self) -> bool {
        self.is_closed()
            && [
                self.semimajor_axis,
                self.eccentricity,
                self.inclination,
                self.long_asc_node,
                self.arg_periapsis,
                self.true_anomaly,
            ]
            .iter()
            .all(|x| x.is_finite())
    }

    pub fn period(&self) -> Option<f64> {
        if self.is_closed() {
            Some(2.0 * PI * (self.semimajor_axis.powi(3) / self.mu).sqrt())
        } else {
            None
        }
    }

    pub fn semilatus_rectum(&self) -> f64 {
        self.angular_momentum.norm_squared() / self.mu
    }

    pub fn periapsis(&self) -> f64 {
        self.semilatus_rectum() / (1.0 + self.eccentricity)
    }

    pub fn apoapsis(&self) -> Option<f64> {
        if self.is_closed() {
            Some(self.semilatus_rectum() / (1.0 - self.eccentricity))
        } else {
            None
        }
    }

    pub fn energy(&self) -> f64 {
        self.speed * self.speed / 2.0 - self.mu / self.radius
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Specific angular momentum vector, `r x v`.
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.angular_momentum
    }

    pub fn eccentricity_vector(&self) -> Vector3<f64> {
        self.eccentricity_vector
    }

    /// Moves the xy plane to the orbital plane, with x pointing towards
    /// periapsis.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), self.long_asc_node)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.inclination)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.arg_periapsis)
    }

    /// The absolute position and velocity of a body on this orbit at the given
    /// true anomaly. Returns `None` for orbits that aren't closed ellipses.
    pub fn state_at_anomaly(&self, theta: f64) -> Option<(Vector3<f64>, Vector3<f64>)> {
        if !self.is_drawable() {
            return None;
        }

        let p = self.semilatus_rectum();
        let ecc = self.eccentricity;
        let radius = p / (1.0 + ecc * theta.cos());

        let rotation = self.rotation();
        let position = rotation * (radius * Vector3::new(theta.cos(), theta.sin(), 0.0));
        let velocity =
            rotation * ((self.mu / p).sqrt() * Vector3::new(-theta.sin(), ecc + theta.cos(), 0.0));

        Some((self.center + position, velocity))
    }
}
