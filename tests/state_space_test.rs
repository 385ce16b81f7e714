//! Integration tests for the StateSpace model
//! Tests construction, validation, queries and the derived structure

use approx::assert_relative_eq;
use ndarray::{arr2, Array2};
use num_complex::Complex64;

use lti_rs::{AnalysisOptions, StateSpace, SystemError, SystemType};

fn example_matrices() -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
    (
        arr2(&[[0.0, 1.0], [-4.0, -5.0]]),
        arr2(&[[0.0], [1.0]]),
        arr2(&[[1.0, 0.0]]),
        arr2(&[[1.0]]),
    )
}

// ===== Construction and Queries =====

#[test]
fn test_discrete_model_queries() {
    let (a, b, c, d) = example_matrices();
    let sys = StateSpace::build(
        Some(a.clone()),
        Some(b.clone()),
        Some(c.clone()),
        Some(d.clone()),
        0.1,
    )
    .expect("valid model should build");

    assert_eq!(sys.sampling_period(), 0.1);
    assert_eq!(sys.sampling_set(), 'Z');
    assert_eq!(sys.system_type(), SystemType::Discrete);
    assert_eq!(sys.system_type().tag(), "discrete");
    assert_eq!(sys.number_of_states(), 2);
    assert_eq!(sys.number_of_inputs(), 1);
    assert_eq!(sys.number_of_outputs(), 1);
    assert_eq!(sys.shape(), (1, 1));
    assert!(sys.is_siso());
    assert!(!sys.is_gain());

    let (a1, b1, c1, d1) = sys.matrices();
    assert_eq!(a1, Some(&a));
    assert_eq!(b1, Some(&b));
    assert_eq!(c1, Some(&c));
    assert_eq!(d1, Some(&d));

    assert!(matches!(
        sys.to_array(),
        Err(SystemError::InvalidOperation(_))
    ));

    assert_eq!(
        sys.to_string(),
        "State representation with sampling time: 0.100\n2 states, 1 inputs, and 1 outputs\n"
    );
}

#[test]
fn test_discrete_model_poles_outside_unit_disk() {
    // Poles -1 and -4: neither lies strictly inside the unit circle
    let (a, b, c, d) = example_matrices();
    let sys = StateSpace::build(Some(a), Some(b), Some(c), Some(d), 0.1).unwrap();

    let poles = sys.poles();
    assert_eq!(poles.len(), 2);
    assert_relative_eq!(poles[0].re, -1.0, epsilon = 1e-12);
    assert_relative_eq!(poles[1].re, -4.0, epsilon = 1e-12);
    assert!(poles.iter().all(|p| p.im == 0.0));

    assert!(!sys.is_stable());
    assert!(sys.stability().num_unstable >= 1);
}

#[test]
fn test_continuous_model_same_matrices_is_stable() {
    let (a, b, c, d) = example_matrices();
    let sys = StateSpace::build(Some(a), Some(b), Some(c), Some(d), 0.0).unwrap();

    assert_eq!(sys.sampling_set(), 'R');
    assert_eq!(sys.system_type(), SystemType::Continuous);
    assert!(sys.is_stable());

    // (s^2 + 5s + 5)/(s^2 + 5s + 4)
    let zeros = sys.zeros();
    assert_eq!(zeros.len(), 2);
    assert_relative_eq!(zeros[0].re, (-5.0 + 5.0_f64.sqrt()) / 2.0, epsilon = 1e-9);
    assert_relative_eq!(zeros[1].re, (-5.0 - 5.0_f64.sqrt()) / 2.0, epsilon = 1e-9);
}

#[test]
fn test_static_gain() {
    let d = arr2(&[[2.0, 0.5], [1.0, -1.0]]);
    let sys = StateSpace::build(None, None, None, Some(d.clone()), 0.0).unwrap();

    assert!(sys.is_gain());
    assert!(sys.is_stable());
    assert!(sys.poles().is_empty());
    assert!(sys.zeros().is_empty());
    assert!(!sys.is_siso());
    assert_eq!(sys.shape(), (2, 2));
    assert_eq!(sys.to_array().unwrap(), &d);
    assert_eq!(
        sys.to_string(),
        "State representation with sampling time: 0.000\n2x2 Static Gain\n"
    );
}

#[test]
fn test_scalar_static_gain_is_siso() {
    let sys = StateSpace::build(None, None, None, Some(arr2(&[[3.0]])), 0.5).unwrap();
    assert!(sys.is_siso());
    assert!(sys.is_stable());
    assert_eq!(sys.sampling_set(), 'Z');
}

// ===== Validation =====

#[test]
fn test_c_column_mismatch() {
    let (a, b, _, d) = example_matrices();
    let c = arr2(&[[1.0, 0.0, 2.0]]);
    let result = StateSpace::build(Some(a), Some(b), Some(c), Some(d), 0.1);
    assert_eq!(
        result.unwrap_err(),
        SystemError::DimensionMismatch("A/C column mismatch".to_string())
    );
}

#[test]
fn test_b_row_mismatch() {
    let (a, _, c, d) = example_matrices();
    let b = arr2(&[[0.0], [1.0], [2.0]]);
    let result = StateSpace::build(Some(a), Some(b), Some(c), Some(d), 0.1);
    assert_eq!(
        result.unwrap_err(),
        SystemError::DimensionMismatch("A/B row mismatch".to_string())
    );
}

#[test]
fn test_static_gain_without_d() {
    let (_, b, c, _) = example_matrices();
    let result = StateSpace::build(None, Some(b), Some(c), None, 0.1);
    assert_eq!(
        result.unwrap_err(),
        SystemError::MissingMatrix("D required for static-gain model".to_string())
    );
}

#[test]
fn test_absent_b_is_valid() {
    let (a, _, c, d) = example_matrices();
    let sys = StateSpace::build(Some(a), None, Some(c), Some(d), 0.1)
        .expect("absent B should be accepted");
    assert_eq!(sys.number_of_inputs(), 1);
    assert_eq!(sys.poles().len(), 2);
    assert!(sys.zeros().is_empty());
}

#[test]
fn test_absent_c_is_valid() {
    let (a, b, _, d) = example_matrices();
    let sys = StateSpace::build(Some(a), Some(b), None, Some(d), 0.1)
        .expect("absent C should be accepted");
    assert_eq!(sys.number_of_outputs(), 1);
    assert!(sys.zeros().is_empty());
}

#[test]
fn test_error_messages() {
    let err = StateSpace::build(None, None, None, None, 0.0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing matrix: D required for static-gain model"
    );

    let err = StateSpace::build(None, None, None, Some(arr2(&[[1.0]])), -1.0).unwrap_err();
    assert!(err.to_string().contains("sampling period"));
}

#[test]
fn test_non_finite_state_matrix_fails_analysis() {
    let a = arr2(&[[f64::NAN, 1.0], [0.0, -1.0]]);
    let result = StateSpace::build(Some(a), None, None, None, 0.0);
    assert!(matches!(result, Err(SystemError::AnalysisFailure(_))));
}

// ===== Derived Structure =====

#[test]
fn test_mimo_model() {
    // Two decoupled first-order lags with unit feed-through
    let a = arr2(&[[-1.0, 0.0], [0.0, -2.0]]);
    let b = Array2::eye(2);
    let c = Array2::eye(2);
    let d = Array2::eye(2);
    let sys = StateSpace::build(Some(a), Some(b), Some(c), Some(d), 0.0).unwrap();

    assert!(!sys.is_siso());
    assert_eq!(sys.shape(), (2, 2));
    assert_eq!(sys.zeros().len(), 2);
    assert_relative_eq!(sys.zeros()[0].re, -2.0, epsilon = 1e-9);
    assert_relative_eq!(sys.zeros()[1].re, -3.0, epsilon = 1e-9);
    assert_eq!(
        sys.to_string(),
        "State representation with sampling time: 0.000\n2 states, 2 inputs, and 2 outputs\n"
    );
}

#[test]
fn test_siso_has_at_most_n_zeros() {
    let a = arr2(&[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [-6.0, -11.0, -6.0]]);
    let b = arr2(&[[0.0], [0.0], [1.0]]);
    let c = arr2(&[[5.0, 2.0, 1.0]]);
    let sys = StateSpace::build(Some(a), Some(b), Some(c), Some(arr2(&[[0.0]])), 0.0).unwrap();

    assert_eq!(sys.poles().len(), 3);
    assert!(sys.zeros().len() <= 3);

    let zeros = sys.zeros();
    assert_eq!(zeros.len(), 2);
    assert_relative_eq!(zeros[0].re, -1.0, epsilon = 1e-9);
    assert_relative_eq!(zeros[0].im, 2.0, epsilon = 1e-9);
    assert_relative_eq!(zeros[1].im, -2.0, epsilon = 1e-9);
}

#[test]
fn test_complex_poles_ordered_as_conjugate_pairs() {
    let a = arr2(&[[-0.5, 3.0], [-3.0, -0.5]]);
    let sys = StateSpace::build(Some(a), None, None, None, 0.0).unwrap();
    let poles = sys.poles();
    assert_eq!(poles[0], poles[1].conj());
    assert!(poles[0].im > 0.0);
    assert!(sys.is_stable());
}

#[test]
fn test_integrator_is_marginal() {
    let a = arr2(&[[0.0]]);
    let sys = StateSpace::build(
        Some(a),
        Some(arr2(&[[1.0]])),
        Some(arr2(&[[1.0]])),
        None,
        0.0,
    )
    .unwrap();
    assert_eq!(sys.poles(), &[Complex64::new(0.0, 0.0)]);
    assert!(!sys.is_stable());
    assert_eq!(sys.stability().num_marginal, 1);
}

#[test]
fn test_discrete_stable_model() {
    let a = arr2(&[[0.5, 0.1], [0.0, -0.3]]);
    let sys = StateSpace::build(Some(a), None, None, None, 0.01).unwrap();
    assert!(sys.is_stable());
}

#[test]
fn test_options_limit_zeros() {
    // (s + 100)/(s + 1): the zero is dropped when the limit is below it
    let a = arr2(&[[-1.0]]);
    let b = arr2(&[[1.0]]);
    let c = arr2(&[[99.0]]);
    let d = arr2(&[[1.0]]);
    let options = AnalysisOptions {
        infinite_zero_limit: Some(10.0),
        ..AnalysisOptions::default()
    };
    let sys = StateSpace::build_with_options(Some(a), Some(b), Some(c), Some(d), 0.0, &options)
        .unwrap();
    assert!(sys.zeros().is_empty());
}

// ===== Stability Boundary =====

/// Dense unimodular T = L*U with its exact inverse U^-1 * L^-1.
fn dense_transform() -> (Array2<f64>, Array2<f64>) {
    let l = arr2(&[[1.0, 0.0, 0.0], [2.0, 1.0, 0.0], [-1.0, 3.0, 1.0]]);
    let u = arr2(&[[1.0, -1.0, 2.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]]);
    let l_inv = arr2(&[[1.0, 0.0, 0.0], [-2.0, 1.0, 0.0], [7.0, -3.0, 1.0]]);
    let u_inv = arr2(&[[1.0, 1.0, -3.0], [0.0, 1.0, -1.0], [0.0, 0.0, 1.0]]);
    (l.dot(&u), u_inv.dot(&l_inv))
}

#[test]
fn test_dense_transform_is_exact_inverse() {
    let (t, t_inv) = dense_transform();
    assert_eq!(t.dot(&t_inv), Array2::<f64>::eye(3));
}

#[test]
fn test_imaginary_axis_poles_of_dense_model_are_marginal() {
    // Poles +-i and -1, hidden behind a dense similarity transform
    let (t, t_inv) = dense_transform();
    let j = arr2(&[[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0]]);
    let a = t.dot(&j).dot(&t_inv);

    let sys = StateSpace::build(Some(a), None, None, None, 0.0).unwrap();
    let poles = sys.poles();
    assert_relative_eq!(poles[0].re, 0.0, epsilon = 1e-9);
    assert_relative_eq!(poles[0].im, 1.0, epsilon = 1e-9);
    assert_eq!(poles[1], poles[0].conj());

    assert!(!sys.is_stable());
    assert_eq!(sys.stability().num_marginal, 2);
    assert_eq!(sys.stability().num_unstable, 0);
}

#[test]
fn test_unit_circle_poles_of_dense_model_are_marginal() {
    // z^2 + z + 1 has its roots on the unit circle; third pole at 0.5
    let (t, t_inv) = dense_transform();
    let j = arr2(&[[0.0, 1.0, 0.0], [-1.0, -1.0, 0.0], [0.0, 0.0, 0.5]]);
    let a = t.dot(&j).dot(&t_inv);

    let sys = StateSpace::build(Some(a), None, None, None, 0.05).unwrap();
    for p in &sys.poles()[1..] {
        assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-9);
    }

    assert!(!sys.is_stable());
    assert_eq!(sys.stability().num_marginal, 2);
    assert_eq!(sys.stability().num_unstable, 0);
}
