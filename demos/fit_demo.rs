// demos/fit_demo.rs

//! Demonstration of MKZ damping-curve calibration
//!
//! This example shows how to:
//! 1. Build a measured damping curve (here: synthesized from known parameters)
//! 2. Fit MKZ parameters with both optimizer backends
//! 3. Inspect fit quality with the evaluation entry point

use anyhow::Result;
use soildyn_lib::models::utils::{damping_from_stress_strain, logspace};
use soildyn_lib::{
    calibrate_mkz_damping, default_configs, evaluate_mkz_misfit, shear_stress, DampingCurve,
    MkzParams, OptimizerBackend,
};

fn main() -> Result<()> {
    println!("MKZ Damping Curve Calibration Demo");
    println!("==================================");

    // Synthesize a "measured" curve from known parameters so the fit has a
    // known answer. Real callers load laboratory data instead.
    let true_params = MkzParams::new(3.5e-4, 0.88, 1.2, 1.0)?;
    let curve = make_synthetic_curve(&true_params, 1.3);
    println!(
        "Measured curve: {} points, strain {:.1e}% - {:.1e}%",
        curve.len(),
        curve.points()[0].strain_pct,
        curve.points()[curve.len() - 1].strain_pct
    );

    for backend in [OptimizerBackend::DifferentialEvolution, OptimizerBackend::Genetic] {
        let config = soildyn_lib::OptimizationConfig {
            backend,
            seed: 42,
            parallel: true,
            ..default_configs::fast()
        };

        println!("\nFitting with backend {:?}...", backend);
        let outcome = calibrate_mkz_damping(&curve, &config)?;

        println!("  gamma_ref: {:.6e} (true {:.6e})", outcome.params.gamma_ref, true_params.gamma_ref);
        println!("  s:         {:.6}   (true {:.6})", outcome.params.s, true_params.s);
        println!("  beta:      {:.6}   (true {:.6})", outcome.params.beta, true_params.beta);
        println!("  Gmax:      {:.1} (placeholder, override with a physical modulus)", outcome.params.g_max);
        println!("  mean absolute damping error: {:.4e}", outcome.misfit);

        // Replay the loss for the true parameters as a reference point.
        let reference = evaluate_mkz_misfit(&curve, &true_params)?;
        println!("  loss at the true parameters:  {:.4e}", reference);
    }

    // The legacy on-disk array layout, for interop with historical tooling.
    let fitted = calibrate_mkz_damping(&curve, &default_configs::fast())?;
    println!(
        "\nLegacy array layout (gamma_ref, 0.0, s, beta): {:?}",
        fitted.params.to_array(true)
    );

    Ok(())
}

fn make_synthetic_curve(params: &MkzParams, baseline_pct: f64) -> DampingCurve {
    let strain_pct = logspace(-4.0, 1.0, 25);
    let strain_unit: Vec<f64> = strain_pct.iter().map(|s| s / 100.0).collect();
    let stress = shear_stress(
        &strain_unit,
        params.gamma_ref,
        params.s,
        params.beta,
        params.g_max,
    );
    let damping_unit = damping_from_stress_strain(&strain_unit, &stress, params.g_max);

    let pairs: Vec<(f64, f64)> = strain_pct
        .iter()
        .zip(damping_unit.iter())
        .map(|(&s, &d)| (s, d * 100.0 + baseline_pct))
        .collect();
    DampingCurve::from_percent_pairs(&pairs).expect("synthetic curve is well formed")
}
