//! lti-rs: state-space models of linear time-invariant systems
//!
//! A [`StateSpace`] model is built from the matrices (A, B, C, D) and a
//! sampling period. Construction validates the dimensions and computes the
//! poles, transmission zeros and stability of the system once; the model
//! is immutable afterwards.
//!
//! # Organization
//!
//! The numerical routines are grouped into modules named after the
//! SLICOT chapters they follow:
//! - `ab`: Analysis routines (poles, AB08ND transmission zeros, AB08NX reduction)
//! - `mb`: Mathematical routines - Basic operations (MB03OD rank-revealing QR)
//! - `mc`: Mathematical routines - Control (pole-location stability)
//!
//! Eigenvalue problems are solved by LAPACK (DGEEV, DGGEV) through
//! `ndarray-linalg`.
//! - `tb`: Transformation routines (TB01ID balancing)
//! - `ss`: The [`StateSpace`] model built on top of them
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use lti_rs::{StateSpace, SystemType};
//!
//! let sys = StateSpace::build(
//!     Some(array![[0.0, 1.0], [-2.0, -3.0]]),
//!     Some(array![[0.0], [1.0]]),
//!     Some(array![[3.0, 1.0]]),
//!     Some(array![[0.0]]),
//!     0.0,
//! )
//! .unwrap();
//!
//! assert_eq!(sys.system_type(), SystemType::Continuous);
//! assert!(sys.is_stable());
//! assert!((sys.zeros()[0].re + 3.0).abs() < 1e-10);
//! ```

pub mod ab;
pub mod error;
pub mod mb;
pub mod mc;
pub mod ss;
pub mod tb;

pub use ab::AnalysisOptions;
pub use error::{Result, SystemError};
pub use mc::{StabilityResult, SystemType};
pub use ss::StateSpace;
