//! Transformation Routines (Chapter TB)
//!
//! Transformations on state-space systems that improve numerical
//! conditioning before the eigenvalue and zero computations run.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Result, SystemError};

/// Which matrices take part in balancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceJob {
    /// A, B and C are all involved.
    All,
    /// Only A and B are involved.
    InputOnly,
    /// Only A and C are involved.
    OutputOnly,
    /// Only A is involved.
    StateOnly,
}

impl BalanceJob {
    fn with_b(self) -> bool {
        matches!(self, BalanceJob::All | BalanceJob::InputOnly)
    }

    fn with_c(self) -> bool {
        matches!(self, BalanceJob::All | BalanceJob::OutputOnly)
    }
}

fn asum(x: ArrayView1<f64>) -> f64 {
    x.iter().map(|v| v.abs()).sum()
}

fn amax(x: ArrayView1<f64>) -> f64 {
    x.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// 1-norm of the system matrix `S = [A B; C 0]` restricted to the
/// matrices selected by `job`.
fn system_norm(
    job: BalanceJob,
    a: &Array2<f64>,
    b: Option<&Array2<f64>>,
    c: Option<&Array2<f64>>,
) -> f64 {
    let mut snorm: f64 = 0.0;
    for j in 0..a.ncols() {
        let mut col_sum = asum(a.column(j));
        if job.with_c() {
            if let Some(c_mat) = c {
                col_sum += asum(c_mat.column(j));
            }
        }
        snorm = snorm.max(col_sum);
    }
    if job.with_b() {
        if let Some(b_mat) = b {
            for j in 0..b_mat.ncols() {
                snorm = snorm.max(asum(b_mat.column(j)));
            }
        }
    }
    snorm
}

/// Balances a state-space system by diagonal similarity transformation.
///
/// Reduces the 1-norm of the system matrix
/// ```text
///     S = ( A  B )
///         ( C  0 )
/// ```
/// by applying a diagonal similarity transformation inv(D)*A*D iteratively
/// to make the rows and columns of diag(D,I)^(-1) * S * diag(D,I) as close
/// in norm as possible. Eigenvalues and transmission zeros are invariant
/// under the transformation.
///
/// # Arguments
///
/// * `job` - Which matrices are involved in balancing
/// * `a` - State matrix (N×N), modified in-place to inv(D)*A*D
/// * `b` - Input matrix (N×M), modified in-place to inv(D)*B (if used)
/// * `c` - Output matrix (P×N), modified in-place to C*D (if used)
/// * `maxred` - Maximum allowed reduction ratio. If <= 0.0, uses 10.0.
///   Must be > 1.0 if positive.
///
/// # Returns
///
/// * `Ok((scale, reduction))` - Diagonal of D and the achieved norm
///   reduction ratio (0.0 when S is zero)
/// * `Err(SystemError::DimensionMismatch)` - Inconsistent shapes
/// * `Err(SystemError::InvalidOperation)` - `maxred` in (0, 1)
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use lti_rs::tb::{tb01id, BalanceJob};
///
/// let mut a = array![[1.0, 1000.0], [0.001, 1.0]];
/// let (scale, reduction) = tb01id(BalanceJob::StateOnly, &mut a, None, None, 0.0).unwrap();
/// assert_eq!(scale.len(), 2);
/// assert!(reduction > 1.0);
/// ```
///
/// # SLICOT Reference
///
/// Translation of SLICOT routine TB01ID (based on LAPACK DGEBAL).
pub fn tb01id(
    job: BalanceJob,
    a: &mut Array2<f64>,
    mut b: Option<&mut Array2<f64>>,
    mut c: Option<&mut Array2<f64>>,
    maxred: f64,
) -> Result<(Array1<f64>, f64)> {
    const SCLFAC: f64 = 10.0;
    const FACTOR: f64 = 0.95;
    const MAXR: f64 = 10.0;

    let n = a.nrows();
    if a.ncols() != n {
        return Err(SystemError::DimensionMismatch(format!(
            "A must be square, got {}×{}",
            n,
            a.ncols()
        )));
    }
    if maxred > 0.0 && maxred < 1.0 {
        return Err(SystemError::InvalidOperation(format!(
            "MAXRED must be <= 0.0 or >= 1.0, got {}",
            maxred
        )));
    }
    if let Some(b_mat) = b.as_deref() {
        if b_mat.nrows() != n {
            return Err(SystemError::DimensionMismatch(format!(
                "B must have {} rows, got {}",
                n,
                b_mat.nrows()
            )));
        }
    }
    if let Some(c_mat) = c.as_deref() {
        if c_mat.ncols() != n {
            return Err(SystemError::DimensionMismatch(format!(
                "C must have {} columns, got {}",
                n,
                c_mat.ncols()
            )));
        }
    }

    if n == 0 {
        return Ok((Array1::zeros(0), 0.0));
    }

    let withb = job.with_b() && b.as_deref().is_some_and(|m| m.ncols() > 0);
    let withc = job.with_c() && c.as_deref().is_some_and(|m| m.nrows() > 0);

    let mut scale: Array1<f64> = Array1::ones(n);
    let initial_norm = system_norm(job, a, b.as_deref(), c.as_deref());
    if initial_norm == 0.0 {
        return Ok((scale, 0.0));
    }

    let sfmin1 = f64::MIN_POSITIVE / f64::EPSILON;
    let sfmax1 = 1.0 / sfmin1;
    let sfmin2 = sfmin1 * SCLFAC;
    let sfmax2 = 1.0 / sfmin2;

    let sred = if maxred <= 0.0 { MAXR } else { maxred };
    let maxnrm = (initial_norm / sred).max(sfmin1);

    loop {
        let mut noconv = false;

        for i in 0..n {
            let mut co: f64 = 0.0;
            let mut ro: f64 = 0.0;
            for j in 0..n {
                if j != i {
                    co += a[(j, i)].abs();
                    ro += a[(i, j)].abs();
                }
            }
            let mut ca = amax(a.column(i));
            let mut ra = amax(a.row(i));

            if withc {
                if let Some(c_mat) = c.as_deref() {
                    co += asum(c_mat.column(i));
                    ca = ca.max(amax(c_mat.column(i)));
                }
            }
            if withb {
                if let Some(b_mat) = b.as_deref() {
                    ro += asum(b_mat.row(i));
                    ra = ra.max(amax(b_mat.row(i)));
                }
            }

            if co == 0.0 && ro == 0.0 {
                continue;
            }
            if co == 0.0 {
                if ro <= maxnrm {
                    continue;
                }
                co = maxnrm;
            }
            if ro == 0.0 {
                if co <= maxnrm {
                    continue;
                }
                ro = maxnrm;
            }

            let mut g = ro / SCLFAC;
            let mut f: f64 = 1.0;
            let s = co + ro;

            while co < g && f.max(co).max(ca) < sfmax2 && ro.min(g).min(ra) > sfmin2 {
                f *= SCLFAC;
                co *= SCLFAC;
                ca *= SCLFAC;
                g /= SCLFAC;
                ro /= SCLFAC;
                ra /= SCLFAC;
            }

            g = co / SCLFAC;
            while g >= ro && ro.max(ra) < sfmax2 && f.min(co).min(g).min(ca) > sfmin2 {
                f /= SCLFAC;
                co /= SCLFAC;
                ca /= SCLFAC;
                g /= SCLFAC;
                ro *= SCLFAC;
                ra *= SCLFAC;
            }

            if (co + ro) >= FACTOR * s {
                continue;
            }
            if f < 1.0 && scale[i] < 1.0 && f * scale[i] <= sfmin1 {
                continue;
            }
            if f > 1.0 && scale[i] > 1.0 && scale[i] >= sfmax1 / f {
                continue;
            }

            let g = 1.0 / f;
            scale[i] *= f;
            noconv = true;

            a.row_mut(i).mapv_inplace(|v| v * g);
            a.column_mut(i).mapv_inplace(|v| v * f);
            if withb {
                if let Some(b_mat) = b.as_deref_mut() {
                    b_mat.row_mut(i).mapv_inplace(|v| v * g);
                }
            }
            if withc {
                if let Some(c_mat) = c.as_deref_mut() {
                    c_mat.column_mut(i).mapv_inplace(|v| v * f);
                }
            }
        }

        if !noconv {
            break;
        }
    }

    let final_norm = system_norm(job, a, b.as_deref(), c.as_deref());
    Ok((scale, initial_norm / final_norm))
}
