//! Analysis Routines - Chapter AB
//!
//! This module contains analysis routines for state-space systems:
//! poles (eigenvalues of A) and transmission zeros (finite generalized
//! eigenvalues of the system pencil).

use log::{debug, trace, warn};
use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use ndarray_linalg::{Eig, EigGeneralized, GeneralizedEigenvalue};
use num_complex::Complex64;

use crate::error::{Result, SystemError};
use crate::mb::{frobenius_norm, mb03od};
use crate::tb::{tb01id, BalanceJob};

/// Imaginary parts below this many ulps of the system scale are rounding
/// noise from the QZ iteration.
const IMAG_SNAP_ULPS: f64 = 1e3;

/// Numerical options for the pole/zero computations.
///
/// Tolerances follow the `Option<f64>` convention of the routines: `None`
/// selects the automatic default.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisOptions {
    /// Rank decision tolerance for the staircase reduction. If None, uses
    /// `max(N+P, N+M) * eps * ||[A B; C D]||_F`.
    pub rank_tol: Option<f64>,
    /// Zeros with modulus above this are treated as lying at infinity. If
    /// None, uses `max(1, ||[A B; C D]||_F) / sqrt(eps)`.
    pub infinite_zero_limit: Option<f64>,
    /// Balance `[A B; C 0]` with `tb01id` before computing zeros.
    pub balance: bool,
    /// Poles this close to the stability boundary count as marginal. If
    /// None, uses `1e3 * eps * max(1, ||A||_F)`.
    pub stability_tol: Option<f64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            rank_tol: None,
            infinite_zero_limit: None,
            balance: true,
            stability_tol: None,
        }
    }
}

/// Sort eigenvalues by descending real part, then descending imaginary part.
pub(crate) fn sort_spectrum(values: &mut [Complex64]) {
    values.sort_by(|x, y| y.re.total_cmp(&x.re).then_with(|| y.im.total_cmp(&x.im)));
}

/// Makes every complex value and its nearest conjugate partner an exact
/// conjugate pair (mean real part, mean |imaginary part|). Unpaired and
/// real values are left alone.
pub(crate) fn pair_conjugates(values: &mut [Complex64]) {
    let n = values.len();
    let mut paired = vec![false; n];
    for i in 0..n {
        if paired[i] || values[i].im == 0.0 {
            continue;
        }
        let target = values[i].conj();
        let partner = (i + 1..n)
            .filter(|&j| !paired[j] && values[j].im * values[i].im < 0.0)
            .min_by(|&j, &k| {
                (values[j] - target)
                    .norm()
                    .total_cmp(&(values[k] - target).norm())
            });
        if let Some(j) = partner {
            let re = 0.5 * (values[i].re + values[j].re);
            let im = 0.5 * (values[i].im.abs() + values[j].im.abs());
            values[i] = Complex64::new(re, im.copysign(values[i].im));
            values[j] = Complex64::new(re, im.copysign(values[j].im));
            paired[i] = true;
            paired[j] = true;
        }
    }
}

/// Computes the poles of a state-space system.
///
/// The poles are the eigenvalues of the state matrix A, with multiplicity,
/// ordered by descending real part and then descending imaginary part, so
/// a complex pair appears as (re + i*im, re - i*im).
///
/// # Arguments
///
/// * `a` - N×N state matrix
///
/// # Returns
///
/// * `Ok(poles)` - N eigenvalues of A
/// * `Err(SystemError::DimensionMismatch)` - If A is not square
/// * `Err(SystemError::AnalysisFailure)` - If A has non-finite entries or
///   LAPACK's DGEEV fails to converge
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use lti_rs::ab::system_poles;
///
/// let a = array![[0.0, 1.0], [-4.0, -5.0]];
/// let poles = system_poles(&a).unwrap();
/// assert!((poles[0].re + 1.0).abs() < 1e-12);
/// assert!((poles[1].re + 4.0).abs() < 1e-12);
/// ```
pub fn system_poles(a: &Array2<f64>) -> Result<Vec<Complex64>> {
    let (n, ncols) = a.dim();
    if n != ncols {
        return Err(SystemError::DimensionMismatch(format!(
            "A must be square, got {}×{}",
            n, ncols
        )));
    }
    if n == 0 {
        return Ok(Vec::new());
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(SystemError::AnalysisFailure(
            "A has non-finite entries".to_string(),
        ));
    }

    let (eigs, _) = a.eig().map_err(|e| {
        warn!("pole computation failed: {}", e);
        SystemError::AnalysisFailure(format!("eigenvalues of A: {}", e))
    })?;
    let mut poles = eigs.to_vec();
    pair_conjugates(&mut poles);
    sort_spectrum(&mut poles);
    Ok(poles)
}

/// A state-space system `(A, B, C, D)` produced by a zero-preserving
/// reduction.
#[derive(Clone, Debug, PartialEq)]
pub struct ReducedSystem {
    /// Reduced state matrix (NR×NR)
    pub a: Array2<f64>,
    /// Reduced input matrix (NR×MR)
    pub b: Array2<f64>,
    /// Reduced output matrix (PR×NR)
    pub c: Array2<f64>,
    /// Reduced feed-through matrix (PR×MR) of full row rank
    pub d: Array2<f64>,
}

fn check_dimensions(a: &Array2<f64>, b: &Array2<f64>, c: &Array2<f64>, d: &Array2<f64>) -> Result<()> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(SystemError::DimensionMismatch(format!(
            "A must be square, got {}×{}",
            n,
            a.ncols()
        )));
    }
    if b.nrows() != n {
        return Err(SystemError::DimensionMismatch(format!(
            "B must have {} rows, got {}",
            n,
            b.nrows()
        )));
    }
    if c.ncols() != n {
        return Err(SystemError::DimensionMismatch(format!(
            "C must have {} columns, got {}",
            n,
            c.ncols()
        )));
    }
    if d.dim() != (c.nrows(), b.ncols()) {
        return Err(SystemError::DimensionMismatch(format!(
            "D must be {}×{}, got {}×{}",
            c.nrows(),
            b.ncols(),
            d.nrows(),
            d.ncols()
        )));
    }
    Ok(())
}

fn system_matrix_norm(a: &Array2<f64>, b: &Array2<f64>, c: &Array2<f64>, d: &Array2<f64>) -> f64 {
    frobenius_norm(a)
        .hypot(frobenius_norm(b))
        .hypot(frobenius_norm(c))
        .hypot(frobenius_norm(d))
}

fn default_rank_tol(a: &Array2<f64>, b: &Array2<f64>, c: &Array2<f64>, d: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let dim = (n + c.nrows()).max(n + b.ncols());
    dim as f64 * f64::EPSILON * system_matrix_norm(a, b, c, d)
}

fn stack_rows<'a>(top: ArrayView2<'a, f64>, bottom: ArrayView2<'a, f64>) -> Result<Array2<f64>> {
    concatenate(Axis(0), &[top, bottom]).map_err(|e| SystemError::DimensionMismatch(e.to_string()))
}

fn stack_cols<'a>(left: ArrayView2<'a, f64>, right: ArrayView2<'a, f64>) -> Result<Array2<f64>> {
    concatenate(Axis(1), &[left, right]).map_err(|e| SystemError::DimensionMismatch(e.to_string()))
}

/// Reduces a system to one with the same transmission zeros and a
/// feed-through matrix of full row rank.
///
/// Each step row-compresses D with a rank-revealing QR factorization. The
/// output rows that D cannot reach form C2; these are column-compressed
/// and the states they observe are eliminated, turning their dynamics into
/// new outputs. Outputs with nothing left to observe are dropped. The loop
/// ends as soon as D has full row rank (possibly with no states left).
///
/// Every step is an orthogonal transformation or a unimodular elimination
/// of the system pencil, so its finite zeros are preserved.
///
/// # Arguments
///
/// * `a` - N×N state matrix
/// * `b` - N×M input matrix
/// * `c` - P×N output matrix
/// * `d` - P×M feed-through matrix
/// * `tol` - Optional rank tolerance. If None, uses
///   `max(N+P, N+M) * eps * ||[A B; C D]||_F`
///
/// # Returns
///
/// The reduced system. Its D has full row rank and no more rows than the
/// original; its state dimension does not exceed N.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use lti_rs::ab::ab08nx;
///
/// // G(s) = 1/((s+1)(s+2)) has relative degree 2: both states deflate
/// let a = array![[0.0, 1.0], [-2.0, -3.0]];
/// let b = array![[0.0], [1.0]];
/// let c = array![[1.0, 0.0]];
/// let d = array![[0.0]];
/// let reduced = ab08nx(&a, &b, &c, &d, None).unwrap();
/// assert_eq!(reduced.a.nrows(), 0);
/// assert_eq!(reduced.d.dim(), (1, 1));
/// ```
///
/// # SLICOT Reference
///
/// Follows SLICOT routine AB08NX (Emami-Naeini and Van Dooren reduction).
/// Orthogonal factors are formed explicitly rather than kept as reflectors.
pub fn ab08nx(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
    tol: Option<f64>,
) -> Result<ReducedSystem> {
    check_dimensions(a, b, c, d)?;
    let toler = tol.unwrap_or_else(|| default_rank_tol(a, b, c, d));

    let mut a = a.to_owned();
    let mut b = b.to_owned();
    let mut c = c.to_owned();
    let mut d = d.to_owned();

    loop {
        let p = d.nrows();
        if p == 0 {
            break;
        }

        // Row compression of D: U'*D = [D1; 0]
        let row_qr = mb03od(&d, Some(toler))?;
        let rho = row_qr.rank;
        if rho == p {
            break;
        }
        let ut = row_qr.q.t();
        let d1 = ut.dot(&d).slice(s![..rho, ..]).to_owned();
        let uc = ut.dot(&c);
        let c1 = uc.slice(s![..rho, ..]).to_owned();

        // Column compression of C2: C2*V = [C21 0]
        let col_qr = mb03od(&uc.slice(s![rho.., ..]).t().to_owned(), Some(toler))?;
        let mu = col_qr.rank;
        if mu == 0 {
            trace!("ab08nx: dropping {} outputs with no coupling", p - rho);
            c = c1;
            d = d1;
            continue;
        }

        // The first MU transformed states are observed by C2; eliminate them
        let v = col_qr.q;
        let at = v.t().dot(&a).dot(&v);
        let bt = v.t().dot(&b);
        let ct = c1.dot(&v);

        c = stack_rows(ct.slice(s![.., mu..]), at.slice(s![..mu, mu..]))?;
        d = stack_rows(d1.view(), bt.slice(s![..mu, ..]))?;
        a = at.slice(s![mu.., mu..]).to_owned();
        b = bt.slice(s![mu.., ..]).to_owned();

        trace!(
            "ab08nx: rank(D) = {}, deflated {} states, {} remain",
            rho,
            mu,
            a.nrows()
        );
    }

    Ok(ReducedSystem { a, b, c, d })
}

/// Transmission zeros of a system, with the normal rank of its transfer
/// function matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct TransmissionZeros {
    /// Finite zeros, ordered by descending real part, then descending
    /// imaginary part
    pub zeros: Vec<Complex64>,
    /// Normal rank of G(s) = C*inv(sI - A)*B + D
    pub normal_rank: usize,
}

/// Computes the transmission zeros of a state-space system.
///
/// The zeros are the finite values z at which the system pencil
/// ```text
///     ( zI - A   B )
///     (   C      D )
/// ```
/// drops below its normal rank.
///
/// # Arguments
///
/// * `a` - N×N state matrix
/// * `b` - N×M input matrix
/// * `c` - P×N output matrix
/// * `d` - P×M feed-through matrix
/// * `options` - Balancing switch, rank tolerance and infinity limit
///
/// # Returns
///
/// * `Ok(TransmissionZeros)` - The finite zeros and the normal rank
/// * `Err(SystemError::DimensionMismatch)` - Inconsistent shapes
/// * `Err(SystemError::AnalysisFailure)` - If LAPACK's DGGEV fails
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use lti_rs::ab::{ab08nd, AnalysisOptions};
///
/// // G(s) = (s + 3) / ((s + 1)(s + 2))
/// let a = array![[0.0, 1.0], [-2.0, -3.0]];
/// let b = array![[0.0], [1.0]];
/// let c = array![[3.0, 1.0]];
/// let d = array![[0.0]];
///
/// let result = ab08nd(&a, &b, &c, &d, &AnalysisOptions::default()).unwrap();
/// assert_eq!(result.zeros.len(), 1);
/// assert!((result.zeros[0].re + 3.0).abs() < 1e-10);
/// assert_eq!(result.normal_rank, 1);
/// ```
///
/// # Algorithm
///
/// 1. **Balancing** (optional): `tb01id` with `BalanceJob::All`
/// 2. **Reduction**: unless D is square and nonsingular, `ab08nx` is applied
///    to the system and then to its dual (A', C', B', D'), leaving a
///    system whose D is square and nonsingular
/// 3. **Compression**: an orthogonal W with [C D]*W = [0 Df] makes the
///    pencil block triangular; its leading NR×NR part (Af, Bf) carries
///    the zeros
/// 4. **QZ**: DGGEV (`EigGeneralized`) on (Af, Bf); eigenvalues at
///    infinity, indeterminate ones and those beyond the infinity limit are
///    discarded, and complex zeros are paired into exact conjugates
///
/// # SLICOT Reference
///
/// Follows SLICOT routine AB08ND.
pub fn ab08nd(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
    options: &AnalysisOptions,
) -> Result<TransmissionZeros> {
    check_dimensions(a, b, c, d)?;

    let snorm = system_matrix_norm(a, b, c, d);
    let limit = options
        .infinite_zero_limit
        .unwrap_or_else(|| snorm.max(1.0) / f64::EPSILON.sqrt());

    let mut a = a.to_owned();
    let mut b = b.to_owned();
    let mut c = c.to_owned();
    if options.balance {
        tb01id(BalanceJob::All, &mut a, Some(&mut b), Some(&mut c), 0.0)?;
    }

    let toler = options
        .rank_tol
        .unwrap_or_else(|| default_rank_tol(&a, &b, &c, d));

    let square_regular = d.nrows() == d.ncols() && mb03od(d, Some(toler))?.rank == d.nrows();
    let reduced = if square_regular {
        ReducedSystem {
            a,
            b,
            c,
            d: d.to_owned(),
        }
    } else {
        let outer = ab08nx(&a, &b, &c, d, Some(toler))?;
        let dual = ab08nx(
            &outer.a.t().to_owned(),
            &outer.c.t().to_owned(),
            &outer.b.t().to_owned(),
            &outer.d.t().to_owned(),
            Some(toler),
        )?;
        ReducedSystem {
            a: dual.a.t().to_owned(),
            b: dual.c.t().to_owned(),
            c: dual.b.t().to_owned(),
            d: dual.d.t().to_owned(),
        }
    };

    let nr = reduced.a.nrows();
    let normal_rank = reduced.d.nrows();
    if reduced.d.ncols() != normal_rank {
        return Err(SystemError::AnalysisFailure(format!(
            "reduced feed-through is {}×{}, expected a square matrix",
            normal_rank,
            reduced.d.ncols()
        )));
    }
    if nr == 0 {
        debug!("ab08nd: no states left after reduction, normal rank {}", normal_rank);
        return Ok(TransmissionZeros {
            zeros: Vec::new(),
            normal_rank,
        });
    }

    // [C D]*W = [0 Df]: reversed orthogonal factor of the QR of [C D]'
    let cd = stack_cols(reduced.c.view(), reduced.d.view())?;
    let w = mb03od(&cd.t().to_owned(), Some(toler))?.q.slice(s![.., ..;-1]).to_owned();
    let ab = stack_cols(reduced.a.view(), reduced.b.view())?;
    let af = ab.dot(&w).slice(s![.., ..nr]).to_owned();
    let bf = w.slice(s![..nr, ..nr]).to_owned();

    let snap = IMAG_SNAP_ULPS * f64::EPSILON * snorm.max(1.0);
    let (eigs, _) = (af, bf).eig_generalized(None).map_err(|e| {
        warn!("zero computation failed: {}", e);
        SystemError::AnalysisFailure(format!("generalized eigenvalues of the reduced pencil: {}", e))
    })?;
    let mut zeros: Vec<Complex64> = eigs
        .iter()
        .filter_map(|ev| match ev {
            GeneralizedEigenvalue::Finite(z, _) if z.norm() <= limit => Some(*z),
            _ => None,
        })
        .map(|z| {
            if z.im.abs() <= snap * z.norm().max(1.0) {
                Complex64::new(z.re, 0.0)
            } else {
                z
            }
        })
        .collect();
    pair_conjugates(&mut zeros);
    sort_spectrum(&mut zeros);

    debug!(
        "ab08nd: {} finite zeros from a {}-state reduced pencil, normal rank {}",
        zeros.len(),
        nr,
        normal_rank
    );

    Ok(TransmissionZeros { zeros, normal_rank })
}
