use nalgebra::Vector3;

use std::f64::consts::PI;

pub fn directed_angle(u: &Vector3<f64>, v: &Vector3<f64>, up: &Vector3<f64>) -> f64 {
    // Returns the angle between u and v, measured as a positive angle around 'up'.
    let theta = u.angle(v);
    if u.cross(v).dot(up) >= 0.0 {
        theta
    } else {
        2.0 * PI - theta
    }
}

/// `acos(numerator / denominator)`, falling back to zero when the denominator
/// vanishes. The ratio is clamped into [-1, 1] so that rounding can't push it
/// out of the domain; a `NaN` ratio stays `NaN`.
pub fn guarded_acos(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0).acos()
}

/// Normalizes `v`, or returns the zero vector if `v` has no length.
pub fn unit_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm == 0.0 {
        Vector3::zeros()
    } else {
        v / norm
    }
}

/// Wraps an angle into [0, 2pi).
pub fn wrap_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(2.0 * PI);
    // rem_euclid can round up to exactly 2pi for tiny negative inputs
    if wrapped >= 2.0 * PI {
        0.0
    } else {
        wrapped
    }
}

/// The unsigned distance between two angles, going whichever way around the
/// circle is shorter. Always in [0, pi].
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = wrap_angle(a - b);
    diff.min(2.0 * PI - diff)
}
