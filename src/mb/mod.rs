//! Mathematical Routines - Basic Operations (Chapter MB)
//!
//! Low-level linear algebra used by the analysis routines: Householder
//! reflectors and rank-revealing QR factorization. Eigenvalue problems go
//! to LAPACK through `ndarray-linalg` (see the AB chapter).

use ndarray::{s, Array1, Array2, ArrayViewMut1};

use crate::error::Result;

/// Generate Householder reflector vector
///
/// Returns (tau, beta) where the reflector is H = I - tau*v*v' with
/// H*x = beta*e1. On exit `x` holds v = [1, v2, v3, ...]. When x is
/// already a multiple of e1, tau is 0 and `x` is left untouched.
pub(crate) fn householder_vector(mut x: ArrayViewMut1<f64>) -> (f64, f64) {
    let n = x.len();
    if n == 0 {
        return (0.0, 0.0);
    }

    let alpha = x[0];
    let sigma = if n > 1 {
        x.slice(s![1..]).iter().map(|v| v * v).sum::<f64>().sqrt()
    } else {
        0.0
    };

    if sigma == 0.0 {
        return (0.0, alpha);
    }

    let norm = alpha.hypot(sigma);
    let beta = if alpha >= 0.0 { -norm } else { norm };
    let tau = (beta - alpha) / beta;

    let denom = alpha - beta;
    x.slice_mut(s![1..]).mapv_inplace(|v| v / denom);
    x[0] = 1.0;

    (tau, beta)
}

/// Apply H = I - tau*v*v' from the left to rows `offset..offset+len(v)`
/// of `m`, restricted to columns `cols..`.
pub(crate) fn apply_householder_left(
    m: &mut Array2<f64>,
    v: &Array1<f64>,
    tau: f64,
    offset: usize,
    cols: usize,
) {
    if tau == 0.0 {
        return;
    }
    for j in cols..m.ncols() {
        let w: f64 = v
            .iter()
            .enumerate()
            .map(|(i, vi)| vi * m[(offset + i, j)])
            .sum();
        for (i, vi) in v.iter().enumerate() {
            m[(offset + i, j)] -= tau * w * vi;
        }
    }
}

/// Apply H = I - tau*v*v' from the right to columns
/// `offset..offset+len(v)` of every row of `m`.
pub(crate) fn apply_householder_right(m: &mut Array2<f64>, v: &Array1<f64>, tau: f64, offset: usize) {
    if tau == 0.0 {
        return;
    }
    for r in 0..m.nrows() {
        let w: f64 = v
            .iter()
            .enumerate()
            .map(|(i, vi)| m[(r, offset + i)] * vi)
            .sum();
        for (i, vi) in v.iter().enumerate() {
            m[(r, offset + i)] -= tau * w * vi;
        }
    }
}

/// Frobenius norm of a matrix.
pub(crate) fn frobenius_norm(m: &Array2<f64>) -> f64 {
    m.iter().fold(0.0, |acc: f64, v| acc.hypot(*v))
}

/// Rank-revealing QR factorization with column pivoting.
#[derive(Clone, Debug)]
pub struct RankRevealingQr {
    /// Orthogonal factor (ROWS×ROWS), accumulated explicitly
    pub q: Array2<f64>,
    /// Upper trapezoidal factor Q'*M*P; rows `rank..` are exactly zero
    pub r: Array2<f64>,
    /// Column permutation: column `j` of M*P is column `jpvt[j]` of M
    pub jpvt: Vec<usize>,
    /// Numerical rank of M
    pub rank: usize,
}

/// Computes a rank-revealing QR factorization with column pivoting.
///
/// Factors M*P = Q*R where Q is orthogonal, P is a permutation that moves
/// the column of largest remaining norm to the front at every step, and R
/// is upper trapezoidal. The factorization stops as soon as every
/// remaining column has norm <= `tol`; that step count is the numerical
/// rank, and the trailing rows of R are set to exact zeros.
///
/// # Arguments
///
/// * `m` - ROWS×COLS matrix to factor
/// * `tol` - Optional rank tolerance. If None, uses
///   `max(ROWS, COLS) * eps * ||M||_F`
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use lti_rs::mb::mb03od;
///
/// // Second row is twice the first: rank 1
/// let m = array![[1.0, 2.0], [2.0, 4.0]];
/// let qr = mb03od(&m, None).unwrap();
/// assert_eq!(qr.rank, 1);
/// ```
///
/// # SLICOT Reference
///
/// Follows SLICOT routine MB03OD (Householder QR with column pivoting and
/// rank determination). The incremental condition estimator of the Fortran
/// routine is replaced by the column-norm test.
pub fn mb03od(m: &Array2<f64>, tol: Option<f64>) -> Result<RankRevealingQr> {
    let (rows, cols) = m.dim();
    let mut r = m.to_owned();
    let mut q = Array2::eye(rows);
    let mut jpvt: Vec<usize> = (0..cols).collect();

    let toldef = tol.unwrap_or_else(|| (rows.max(cols) as f64) * f64::EPSILON * frobenius_norm(m));

    let mut rank = 0;
    for k in 0..rows.min(cols) {
        let mut piv = k;
        let mut pnorm = -1.0;
        for j in k..cols {
            let norm = r.slice(s![k.., j]).iter().fold(0.0, |acc: f64, v| acc.hypot(*v));
            if norm > pnorm {
                pnorm = norm;
                piv = j;
            }
        }
        if pnorm <= toldef {
            break;
        }

        if piv != k {
            for i in 0..rows {
                r.swap((i, k), (i, piv));
            }
            jpvt.swap(k, piv);
        }

        let mut v = r.slice(s![k.., k]).to_owned();
        let (tau, beta) = householder_vector(v.view_mut());
        apply_householder_left(&mut r, &v, tau, k, k);
        apply_householder_right(&mut q, &v, tau, k);

        r[(k, k)] = beta;
        r.slice_mut(s![k + 1.., k]).fill(0.0);
        rank += 1;
    }

    r.slice_mut(s![rank.., ..]).fill(0.0);

    Ok(RankRevealingQr { q, r, jpvt, rank })
}
