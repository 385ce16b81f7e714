//! State-Space Models
//!
//! [`StateSpace`] holds the matrices of a linear time-invariant system
//! ```text
//!     dx/dt = A x + B u        (continuous-time, dt = 0)
//!     x(k+1) = A x(k) + B u(k) (discrete-time,   dt > 0)
//!     y = C x + D u
//! ```
//! and derives its structure once, at construction: poles, transmission
//! zeros and stability. A model with no A matrix is a static gain y = D u.

use std::fmt;

use log::debug;
use ndarray::Array2;
use num_complex::Complex64;

use crate::ab::{ab08nd, system_poles, AnalysisOptions};
use crate::error::{Result, SystemError};
use crate::mc::{boundary_tolerance, pole_stability, StabilityResult, SystemType};

/// Validated state-space model with its poles, zeros and stability.
///
/// Models are immutable; changing a matrix means building a new model.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use lti_rs::StateSpace;
///
/// let sys = StateSpace::build(
///     Some(array![[0.0, 1.0], [-4.0, -5.0]]),
///     Some(array![[0.0], [1.0]]),
///     Some(array![[1.0, 0.0]]),
///     Some(array![[1.0]]),
///     0.0,
/// )
/// .unwrap();
///
/// assert_eq!(sys.shape(), (1, 1));
/// assert!(sys.is_siso());
/// assert!(sys.is_stable());
/// assert_eq!(sys.poles().len(), 2);
/// assert_eq!(sys.zeros().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct StateSpace {
    a: Option<Array2<f64>>,
    b: Option<Array2<f64>>,
    c: Option<Array2<f64>>,
    d: Option<Array2<f64>>,
    dt: f64,
    is_siso: bool,
    poles: Vec<Complex64>,
    zeros: Vec<Complex64>,
    stability: StabilityResult,
}

impl StateSpace {
    /// Builds a model with the default [`AnalysisOptions`].
    ///
    /// # Arguments
    ///
    /// * `a` - N×N state matrix, or None for a static gain
    /// * `b` - N×M input matrix (optional)
    /// * `c` - P×N output matrix (optional)
    /// * `d` - P×M feed-through matrix, required when `a` is None
    /// * `dt` - Sampling period: 0 for continuous time, positive for
    ///   discrete time
    ///
    /// # Errors
    ///
    /// * `InvalidSamplingPeriod` - `dt` is negative, NaN or infinite
    /// * `DimensionMismatch` - Matrix shapes are inconsistent
    /// * `MissingMatrix` - Neither `a` nor `d` is given
    /// * `AnalysisFailure` - The pole or zero computation did not converge
    pub fn build(
        a: Option<Array2<f64>>,
        b: Option<Array2<f64>>,
        c: Option<Array2<f64>>,
        d: Option<Array2<f64>>,
        dt: f64,
    ) -> Result<Self> {
        Self::build_with_options(a, b, c, d, dt, &AnalysisOptions::default())
    }

    /// Builds a model with explicit [`AnalysisOptions`].
    ///
    /// Validation is the same as [`StateSpace::build`]; the options only
    /// steer the derived structure: the rank tolerance, infinity limit and
    /// balancing of the zero computation (`ab08nd`), and the width of the
    /// stability boundary band (`pole_stability`).
    ///
    /// # Arguments
    ///
    /// * `a`, `b`, `c`, `d`, `dt` - As for [`StateSpace::build`]
    /// * `options` - Numerical tolerances; `None` fields select defaults
    ///
    /// # Errors
    ///
    /// * `InvalidSamplingPeriod`, `DimensionMismatch`, `MissingMatrix` -
    ///   As for [`StateSpace::build`]
    /// * `AnalysisFailure` - LAPACK failed on the poles or zeros, or A has
    ///   non-finite entries
    pub fn build_with_options(
        a: Option<Array2<f64>>,
        b: Option<Array2<f64>>,
        c: Option<Array2<f64>>,
        d: Option<Array2<f64>>,
        dt: f64,
        options: &AnalysisOptions,
    ) -> Result<Self> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SystemError::InvalidSamplingPeriod(dt));
        }

        let is_siso = match &a {
            Some(a_mat) => {
                validate_dynamic(a_mat, b.as_ref(), c.as_ref(), d.as_ref())?;
                matches!((&b, &c), (Some(b_mat), Some(c_mat)) if b_mat.ncols() == 1 && c_mat.nrows() == 1)
            }
            None => match &d {
                Some(d_mat) => d_mat.dim() == (1, 1),
                None => {
                    return Err(SystemError::MissingMatrix(
                        "D required for static-gain model".to_string(),
                    ))
                }
            },
        };

        let (poles, zeros) = match &a {
            Some(a_mat) => {
                let poles = system_poles(a_mat)?;
                let zeros = match (&b, &c) {
                    (Some(b_mat), Some(c_mat)) => {
                        let d_mat = d
                            .clone()
                            .unwrap_or_else(|| Array2::zeros((c_mat.nrows(), b_mat.ncols())));
                        ab08nd(a_mat, b_mat, c_mat, &d_mat, options)?.zeros
                    }
                    _ => Vec::new(),
                };
                (poles, zeros)
            }
            None => (Vec::new(), Vec::new()),
        };

        let system_type = SystemType::from_sampling_period(dt);
        let tol = match (options.stability_tol, &a) {
            (Some(tol), _) => tol,
            (None, Some(a_mat)) => boundary_tolerance(a_mat),
            (None, None) => 0.0,
        };
        let stability = pole_stability(system_type, &poles, tol);

        let sys = StateSpace {
            a,
            b,
            c,
            d,
            dt,
            is_siso,
            poles,
            zeros,
            stability,
        };
        debug!(
            "built {} model: {} states, {} inputs, {} outputs, {} zeros, stable = {}",
            system_type,
            sys.number_of_states(),
            sys.number_of_inputs(),
            sys.number_of_outputs(),
            sys.zeros.len(),
            sys.stability.stable
        );
        Ok(sys)
    }

    /// Number of states N (0 for a static gain).
    pub fn number_of_states(&self) -> usize {
        self.a.as_ref().map_or(0, |a| a.nrows())
    }

    /// Number of inputs M, taken from B, or from D when B is absent.
    pub fn number_of_inputs(&self) -> usize {
        match (&self.a, &self.b, &self.d) {
            (Some(_), Some(b), _) => b.ncols(),
            (_, _, Some(d)) => d.ncols(),
            _ => 0,
        }
    }

    /// Number of outputs P, taken from C, or from D when C is absent.
    pub fn number_of_outputs(&self) -> usize {
        match (&self.a, &self.c, &self.d) {
            (Some(_), Some(c), _) => c.nrows(),
            (_, _, Some(d)) => d.nrows(),
            _ => 0,
        }
    }

    /// (outputs, inputs)
    pub fn shape(&self) -> (usize, usize) {
        (self.number_of_outputs(), self.number_of_inputs())
    }

    pub fn sampling_period(&self) -> f64 {
        self.dt
    }

    pub fn system_type(&self) -> SystemType {
        SystemType::from_sampling_period(self.dt)
    }

    /// `'R'` for continuous-time models, `'Z'` for discrete-time ones.
    pub fn sampling_set(&self) -> char {
        self.system_type().sampling_set()
    }

    /// The matrices exactly as supplied: (A, B, C, D).
    #[allow(clippy::type_complexity)]
    pub fn matrices(
        &self,
    ) -> (
        Option<&Array2<f64>>,
        Option<&Array2<f64>>,
        Option<&Array2<f64>>,
        Option<&Array2<f64>>,
    ) {
        (
            self.a.as_ref(),
            self.b.as_ref(),
            self.c.as_ref(),
            self.d.as_ref(),
        )
    }

    /// Eigenvalues of A, by descending real part then descending imaginary
    /// part. Empty for a static gain.
    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    /// Finite transmission zeros in the same order as the poles. Empty for
    /// a static gain or when B or C is absent.
    pub fn zeros(&self) -> &[Complex64] {
        &self.zeros
    }

    pub fn is_stable(&self) -> bool {
        self.stability.stable
    }

    /// Full stability report, including unstable and marginal pole counts.
    pub fn stability(&self) -> &StabilityResult {
        &self.stability
    }

    pub fn is_siso(&self) -> bool {
        self.is_siso
    }

    pub fn is_gain(&self) -> bool {
        self.a.is_none()
    }

    /// The gain matrix D of a static-gain model.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for a model with dynamics.
    pub fn to_array(&self) -> Result<&Array2<f64>> {
        match (&self.a, &self.d) {
            (None, Some(d)) => Ok(d),
            _ => Err(SystemError::InvalidOperation(
                "only static gain models can be converted to arrays".to_string(),
            )),
        }
    }
}

fn validate_dynamic(
    a: &Array2<f64>,
    b: Option<&Array2<f64>>,
    c: Option<&Array2<f64>>,
    d: Option<&Array2<f64>>,
) -> Result<()> {
    let (rows, cols) = a.dim();
    if let Some(b) = b {
        if b.nrows() != rows {
            return Err(SystemError::DimensionMismatch("A/B row mismatch".to_string()));
        }
    }
    if let Some(c) = c {
        if c.ncols() != cols {
            return Err(SystemError::DimensionMismatch("A/C column mismatch".to_string()));
        }
    }
    if rows != cols {
        return Err(SystemError::DimensionMismatch(format!(
            "A must be square, got {}x{}",
            rows, cols
        )));
    }
    if let Some(d) = d {
        if let Some(b) = b {
            if d.ncols() != b.ncols() {
                return Err(SystemError::DimensionMismatch(format!(
                    "B/D column mismatch: B has {} columns, D has {}",
                    b.ncols(),
                    d.ncols()
                )));
            }
        }
        if let Some(c) = c {
            if d.nrows() != c.nrows() {
                return Err(SystemError::DimensionMismatch(format!(
                    "C/D row mismatch: C has {} rows, D has {}",
                    c.nrows(),
                    d.nrows()
                )));
            }
        }
    }
    Ok(())
}

impl fmt::Display for StateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "State representation with sampling time: {:.3}", self.dt)?;
        if self.is_gain() {
            writeln!(
                f,
                "{}x{} Static Gain",
                self.number_of_outputs(),
                self.number_of_inputs()
            )
        } else {
            writeln!(
                f,
                "{} states, {} inputs, and {} outputs",
                self.number_of_states(),
                self.number_of_inputs(),
                self.number_of_outputs()
            )
        }
    }
}
