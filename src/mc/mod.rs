//! Mathematical Routines - Control (Chapter MC)
//!
//! Stability tests on the spectrum of a system, in the continuous-time or
//! discrete-time sense.

use ndarray::Array2;
use num_complex::Complex64;

use crate::mb::frobenius_norm;

/// Default boundary band, in ulps of `max(1, ||A||_F)`.
const BOUNDARY_ULPS: f64 = 1e3;

/// Time domain of a system
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemType {
    /// Continuous-time system: dx/dt = Ax + Bu
    Continuous,
    /// Discrete-time system: x(k+1) = Ax(k) + Bu(k)
    Discrete,
}

impl SystemType {
    /// Classify a sampling period: 0 is continuous, positive is discrete.
    pub fn from_sampling_period(dt: f64) -> Self {
        if dt > 0.0 {
            SystemType::Discrete
        } else {
            SystemType::Continuous
        }
    }

    /// Lowercase tag, `"continuous"` or `"discrete"`.
    pub fn tag(&self) -> &'static str {
        match self {
            SystemType::Continuous => "continuous",
            SystemType::Discrete => "discrete",
        }
    }

    /// The set the time variable ranges over: `'R'` (reals) or `'Z'` (integers).
    pub fn sampling_set(&self) -> char {
        match self {
            SystemType::Continuous => 'R',
            SystemType::Discrete => 'Z',
        }
    }
}

impl std::fmt::Display for SystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of a pole-location stability test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityResult {
    /// True if every pole lies strictly inside the stability region
    pub stable: bool,
    /// Number of poles outside the region and beyond the boundary band
    /// (RHP for continuous-time, outside the unit circle for discrete-time)
    pub num_unstable: usize,
    /// Number of poles on the boundary (imaginary axis or unit circle, up
    /// to the tolerance); these make the system unstable as well
    pub num_marginal: usize,
}

/// Default width of the boundary band for the poles of `a`:
/// `1e3 * eps * max(1, ||A||_F)`.
///
/// Poles computed in floating point sit within a few ulps of
/// `||A||` of their exact values, so a pole on the imaginary axis (or unit
/// circle) lands on either side of it; the band catches both.
pub fn boundary_tolerance(a: &Array2<f64>) -> f64 {
    BOUNDARY_ULPS * f64::EPSILON * frobenius_norm(a).max(1.0)
}

/// Determines whether a set of poles is stable.
///
/// - **Continuous-time**: stable if every pole has Re(p) < -tol
/// - **Discrete-time**: stable if every pole has |p| < 1 - tol
///
/// A pole with |Re(p)| <= tol (resp. ||p| - 1| <= tol) is on the boundary:
/// it is counted in `num_marginal` and the result is not stable. A NaN pole
/// is unstable. An empty pole set (static gain) is stable.
///
/// # Arguments
///
/// * `system_type` - Time domain that selects the stability region
/// * `poles` - Eigenvalues of the state matrix
/// * `tol` - Half-width of the boundary band, see [`boundary_tolerance`]
///
/// # Examples
///
/// ```
/// use ndarray::Array2;
/// use num_complex::Complex64;
/// use lti_rs::mc::{pole_stability, SystemType};
///
/// let poles = [Complex64::new(-1.0, 2.0), Complex64::new(-1.0, -2.0)];
/// let result = pole_stability(SystemType::Continuous, &poles, 1e-12);
/// assert!(result.stable);
///
/// // Same poles, but outside the unit circle
/// let result = pole_stability(SystemType::Discrete, &poles, 1e-12);
/// assert!(!result.stable);
/// assert_eq!(result.num_unstable, 2);
///
/// // Rounded image of an imaginary-axis pole
/// let result = pole_stability(SystemType::Continuous, &[Complex64::new(-4e-16, 1.0)], 1e-12);
/// assert!(!result.stable);
/// assert_eq!(result.num_marginal, 1);
/// ```
pub fn pole_stability(system_type: SystemType, poles: &[Complex64], tol: f64) -> StabilityResult {
    let mut num_unstable = 0;
    let mut num_marginal = 0;

    for pole in poles {
        let measure = match system_type {
            SystemType::Continuous => pole.re,
            SystemType::Discrete => pole.norm() - 1.0,
        };
        if measure > tol || measure.is_nan() {
            num_unstable += 1;
        } else if measure >= -tol {
            num_marginal += 1;
        }
    }

    StabilityResult {
        stable: num_unstable == 0 && num_marginal == 0,
        num_unstable,
        num_marginal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const TOL: f64 = 1e-12;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_stable_continuous() {
        let result = pole_stability(SystemType::Continuous, &[c(-1.0, 0.0), c(-4.0, 0.0)], TOL);
        assert!(result.stable);
        assert_eq!(result.num_unstable, 0);
        assert_eq!(result.num_marginal, 0);
    }

    #[test]
    fn test_unstable_continuous() {
        let result = pole_stability(SystemType::Continuous, &[c(-1.0, 0.0), c(0.5, 3.0), c(0.5, -3.0)], TOL);
        assert!(!result.stable);
        assert_eq!(result.num_unstable, 2);
    }

    #[test]
    fn test_imaginary_axis_is_marginal() {
        let result = pole_stability(SystemType::Continuous, &[c(0.0, 1.0), c(0.0, -1.0)], TOL);
        assert!(!result.stable);
        assert_eq!(result.num_unstable, 0);
        assert_eq!(result.num_marginal, 2);
    }

    #[test]
    fn test_rounded_boundary_poles_are_marginal() {
        // Exact poles +-i and 1, perturbed by rounding to either side
        let result = pole_stability(
            SystemType::Continuous,
            &[c(-3.9e-16, 1.0), c(-3.9e-16, -1.0), c(-0.5, 0.0)],
            TOL,
        );
        assert!(!result.stable);
        assert_eq!(result.num_marginal, 2);
        assert_eq!(result.num_unstable, 0);

        let result = pole_stability(SystemType::Discrete, &[c(1.0 - 2e-16, 0.0), c(2e-16 + 1.0, 0.0)], TOL);
        assert_eq!(result.num_marginal, 2);
        assert_eq!(result.num_unstable, 0);
    }

    #[test]
    fn test_poles_outside_band_are_classified() {
        let result = pole_stability(SystemType::Continuous, &[c(-1e-6, 1.0), c(1e-6, 0.0)], TOL);
        assert_eq!(result.num_marginal, 0);
        assert_eq!(result.num_unstable, 1);
    }

    #[test]
    fn test_boundary_tolerance_scales_with_norm() {
        let small = boundary_tolerance(&array![[0.1]]);
        assert_eq!(small, 1e3 * f64::EPSILON);
        let large = boundary_tolerance(&array![[0.0, 300.0], [400.0, 0.0]]);
        assert!((large - 500.0 * 1e3 * f64::EPSILON).abs() < 1e-20);
    }

    #[test]
    fn test_stable_discrete() {
        let result = pole_stability(SystemType::Discrete, &[c(0.5, 0.5), c(-0.9, 0.0)], TOL);
        assert!(result.stable);
    }

    #[test]
    fn test_unit_circle_is_marginal() {
        let result = pole_stability(SystemType::Discrete, &[c(1.0, 0.0), c(0.0, -1.0), c(0.2, 0.0)], TOL);
        assert!(!result.stable);
        assert_eq!(result.num_marginal, 2);
        assert_eq!(result.num_unstable, 0);
    }

    #[test]
    fn test_left_half_plane_outside_unit_circle() {
        // Stable in continuous time, unstable once sampled
        let poles = [c(-1.0, 0.0), c(-4.0, 0.0)];
        assert!(pole_stability(SystemType::Continuous, &poles, TOL).stable);
        let result = pole_stability(SystemType::Discrete, &poles, TOL);
        assert!(!result.stable);
        assert_eq!(result.num_marginal, 1);
        assert_eq!(result.num_unstable, 1);
    }

    #[test]
    fn test_no_poles_is_stable() {
        assert!(pole_stability(SystemType::Continuous, &[], TOL).stable);
        assert!(pole_stability(SystemType::Discrete, &[], TOL).stable);
    }

    #[test]
    fn test_nan_pole_is_unstable() {
        let result = pole_stability(SystemType::Continuous, &[c(f64::NAN, 0.0)], TOL);
        assert!(!result.stable);
        assert_eq!(result.num_unstable, 1);
    }

    #[test]
    fn test_system_type_from_sampling_period() {
        assert_eq!(SystemType::from_sampling_period(0.0), SystemType::Continuous);
        assert_eq!(SystemType::from_sampling_period(0.1), SystemType::Discrete);
        assert_eq!(SystemType::Continuous.tag(), "continuous");
        assert_eq!(SystemType::Discrete.to_string(), "discrete");
        assert_eq!(SystemType::Continuous.sampling_set(), 'R');
        assert_eq!(SystemType::Discrete.sampling_set(), 'Z');
    }
}
