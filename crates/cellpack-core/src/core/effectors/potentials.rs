use nalgebra::Vector3;

/// `0.5 * k * (x - x0)²`
#[inline]
pub fn harmonic(k: f64, x: f64, x0: f64) -> f64 {
    0.5 * k * (x - x0).powi(2)
}

/// Derivative of [`harmonic`] with respect to `x`.
#[inline]
pub fn harmonic_derivative(k: f64, x: f64, x0: f64) -> f64 {
    k * (x - x0)
}

/// `k * x²`
#[inline]
pub fn quadratic(k: f64, x: f64) -> f64 {
    k * x * x
}

#[inline]
pub fn quadratic_derivative(k: f64, x: f64) -> f64 {
    2.0 * k * x
}

/// Unit vector along `v`, or zero for a degenerate vector.
#[inline]
pub fn unit_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm > 0.0 { v / norm } else { Vector3::zeros() }
}

/// Sign of `x` with an exact zero at the origin.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
