//! Demonstration of pole, zero and stability analysis
//!
//! Builds a few state-space models and prints their structure. Run with
//! `RUST_LOG=debug` to see the reduction steps of the zero computation.

use lti_rs::StateSpace;
use ndarray::{arr2, Array2};
use num_complex::Complex64;

fn print_values(label: &str, values: &[Complex64]) {
    if values.is_empty() {
        println!("  {}: none", label);
        return;
    }
    println!("  {}:", label);
    for v in values {
        if v.im == 0.0 {
            println!("    {:.4}", v.re);
        } else {
            println!("    {:.4} {:+.4}i", v.re, v.im);
        }
    }
}

fn report(title: &str, sys: &StateSpace) {
    println!("--- {} ---", title);
    print!("{}", sys);
    print_values("poles", sys.poles());
    print_values("zeros", sys.zeros());
    let stability = sys.stability();
    println!(
        "  stable: {} ({} unstable, {} marginal)\n",
        stability.stable, stability.num_unstable, stability.num_marginal
    );
}

fn main() {
    env_logger::init();

    println!("=== Pole/Zero Analysis Demonstration ===\n");

    // SISO: G(s) = (s + 3) / ((s + 1)(s + 2))
    let siso = StateSpace::build(
        Some(arr2(&[[0.0, 1.0], [-2.0, -3.0]])),
        Some(arr2(&[[0.0], [1.0]])),
        Some(arr2(&[[3.0, 1.0]])),
        Some(arr2(&[[0.0]])),
        0.0,
    );
    match siso {
        Ok(sys) => report("SISO lag-lead", &sys),
        Err(e) => println!("SISO model failed: {}", e),
    }

    // Same matrices sampled at 0.1 s: poles -1 and -4 are not inside the unit circle
    let sampled = StateSpace::build(
        Some(arr2(&[[0.0, 1.0], [-4.0, -5.0]])),
        Some(arr2(&[[0.0], [1.0]])),
        Some(arr2(&[[1.0, 0.0]])),
        Some(arr2(&[[1.0]])),
        0.1,
    );
    match sampled {
        Ok(sys) => report("Discrete-time model", &sys),
        Err(e) => println!("Discrete model failed: {}", e),
    }

    // Tall MIMO: two outputs sharing the zero at -4
    let tall = StateSpace::build(
        Some(arr2(&[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [-6.0, -11.0, -6.0]])),
        Some(arr2(&[[0.0], [0.0], [1.0]])),
        Some(arr2(&[[20.0, 9.0, 1.0], [4.0, 1.0, 0.0]])),
        Some(Array2::zeros((2, 1))),
        0.0,
    );
    match tall {
        Ok(sys) => report("One input, two outputs", &sys),
        Err(e) => println!("MIMO model failed: {}", e),
    }

    // Static gain
    match StateSpace::build(None, None, None, Some(arr2(&[[2.0, 0.0], [0.0, 0.5]])), 0.0) {
        Ok(sys) => report("Static gain", &sys),
        Err(e) => println!("Gain model failed: {}", e),
    }

    // Inconsistent dimensions are rejected
    let bad = StateSpace::build(
        Some(arr2(&[[0.0, 1.0], [-4.0, -5.0]])),
        None,
        Some(arr2(&[[1.0, 0.0, 2.0]])),
        None,
        0.0,
    );
    if let Err(e) = bad {
        println!("Rejected model: {}", e);
    }
}
