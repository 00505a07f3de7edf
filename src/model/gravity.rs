use nalgebra::{DVector, Vector3};

use crate::astro::NEWTON_G;

/// Newtonian point-mass gravity, softened so coincident bodies don't blow up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub constant: f64,
    pub softening: f64,
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity {
            constant: NEWTON_G,
            softening: 0.1,
        }
    }
}

impl Gravity {
    pub fn new(constant: f64, softening: f64) -> Self {
        Gravity {
            constant,
            softening,
        }
    }

    /// Acceleration felt at `target` due to a mass sitting at `source`.
    pub fn acceleration(
        &self,
        target: &Vector3<f64>,
        source: &Vector3<f64>,
        source_mass: f64,
    ) -> Vector3<f64> {
        let d = source - target;
        let r_squared = d.norm_squared() + self.softening * self.softening;
        d * (self.constant * source_mass / r_squared.powf(1.5))
    }
}

/// A set of point masses packaged up as one ODE state, so that a single RK4
/// step moves all of them at once.
#[derive(Debug, Clone)]
pub(crate) struct PointMasses {
    /// Laid out as [positions..., velocities...], three entries per body.
    state: DVector<f64>,
    masses: Vec<f64>,
    movable: Vec<bool>,
}

impl PointMasses {
    pub fn new(bodies: &[(Vector3<f64>, Vector3<f64>, f64, bool)]) -> Self {
        let n = bodies.len();
        let mut state = DVector::zeros(6 * n);
        for (i, (position, velocity, _, _)) in bodies.iter().enumerate() {
            state.fixed_rows_mut::<3>(3 * i).copy_from(position);
            state.fixed_rows_mut::<3>(3 * (n + i)).copy_from(velocity);
        }

        PointMasses {
            state,
            masses: bodies.iter().map(|b| b.2).collect(),
            movable: bodies.iter().map(|b| b.3).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn position(&self, i: usize) -> Vector3<f64> {
        self.state.fixed_rows::<3>(3 * i).into_owned()
    }

    pub fn velocity(&self, i: usize) -> Vector3<f64> {
        self.state.fixed_rows::<3>(3 * (self.len() + i)).into_owned()
    }

    /// The acceleration each other body contributes to body `i`, in index
    /// order.
    pub fn contributions(&self, gravity: &Gravity, i: usize) -> Vec<(usize, Vector3<f64>)> {
        let p_i = self.position(i);
        (0..self.len())
            .filter(|&j| j != i)
            .map(|j| (j, gravity.acceleration(&p_i, &self.position(j), self.masses[j])))
            .collect()
    }

    /// Time derivative of `y`: velocities go into the position slots, summed
    /// pairwise accelerations into the velocity slots. Immovable bodies get a
    /// zero derivative.
    fn derivative(&self, gravity: &Gravity, y: &DVector<f64>) -> DVector<f64> {
        let n = self.len();
        let mut dy = DVector::zeros(6 * n);

        for i in 0..n {
            if !self.movable[i] {
                continue;
            }

            let p_i = y.fixed_rows::<3>(3 * i).into_owned();
            let mut accel = Vector3::zeros();
            for j in (0..n).filter(|&j| j != i) {
                let p_j = y.fixed_rows::<3>(3 * j).into_owned();
                accel += gravity.acceleration(&p_i, &p_j, self.masses[j]);
            }

            let v_i = y.fixed_rows::<3>(3 * (n + i)).into_owned();
            dy.fixed_rows_mut::<3>(3 * i).copy_from(&v_i);
            dy.fixed_rows_mut::<3>(3 * (n + i)).copy_from(&accel);
        }

        dy
    }

    /// Advances every movable body by one classic fourth-order Runge-Kutta
    /// step.
    pub fn step(&mut self, gravity: &Gravity, dt: f64) {
        let y = &self.state;
        let k1 = self.derivative(gravity, y);
        let k2 = self.derivative(gravity, &(y + &k1 * (dt / 2.0)));
        let k3 = self.derivative(gravity, &(y + &k2 * (dt / 2.0)));
        let k4 = self.derivative(gravity, &(y + &k3 * dt));

        let next = y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
        self.state = next;
    }
}
