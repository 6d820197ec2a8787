// demos/plot_damping_fit.rs
// Fits a measured damping curve and produces an SVG comparing the measured
// points with the fitted MKZ damping curve.
//
// Usage:
//     cargo run --example plot_damping_fit -- [csv_path]
//
// The CSV must have a `strain_pct,damping_pct` header. Without an argument, a
// synthetic curve is used. The output is written to damping_fit.svg in the
// working directory.

use std::env;
use std::error::Error;

use plotters::prelude::*;
use soildyn_lib::models::utils::{damping_from_stress_strain, logspace};
use soildyn_lib::{calibrate_mkz_damping, default_configs, shear_stress, DampingCurve, MkzParams};

#[derive(serde::Deserialize)]
struct CsvRow {
    strain_pct: f64,
    damping_pct: f64,
}

fn load_csv(path: &str) -> Result<DampingCurve, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut pairs = Vec::new();
    for record in reader.deserialize() {
        let row: CsvRow = record?;
        pairs.push((row.strain_pct, row.damping_pct));
    }
    Ok(DampingCurve::from_percent_pairs(&pairs)?)
}

fn synthetic_curve() -> DampingCurve {
    let params = MkzParams::new(3.5e-4, 0.88, 1.2, 1.0).expect("valid demo parameters");
    let strain_pct = logspace(-4.0, 1.0, 25);
    let strain_unit: Vec<f64> = strain_pct.iter().map(|s| s / 100.0).collect();
    let stress = shear_stress(&strain_unit, params.gamma_ref, params.s, params.beta, 1.0);
    let damping = damping_from_stress_strain(&strain_unit, &stress, 1.0);
    let pairs: Vec<(f64, f64)> = strain_pct
        .iter()
        .zip(damping.iter())
        .map(|(&s, &d)| (s, d * 100.0 + 1.3))
        .collect();
    DampingCurve::from_percent_pairs(&pairs).expect("synthetic curve is well formed")
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let curve = if args.len() > 1 {
        load_csv(&args[1])?
    } else {
        println!("No CSV given; using a synthetic curve.");
        synthetic_curve()
    };

    // Fit
    let outcome = calibrate_mkz_damping(&curve, &default_configs::fast())?;
    println!(
        "Fitted: gamma_ref = {:.4e}, s = {:.4}, beta = {:.4} (loss {:.4e})",
        outcome.params.gamma_ref, outcome.params.s, outcome.params.beta, outcome.misfit
    );

    // Measured points, percent units.
    let measured: Vec<(f64, f64)> = curve
        .points()
        .iter()
        .map(|p| (p.strain_pct, p.damping_pct))
        .collect();
    let baseline_pct = measured[0].1;

    // Smooth fitted excess-damping line across the measured strain span,
    // shifted back up by the measured small-strain baseline.
    let strain_pct = logspace(
        measured[0].0.log10(),
        measured[measured.len() - 1].0.log10(),
        200,
    );
    let strain_unit: Vec<f64> = strain_pct.iter().map(|s| s / 100.0).collect();
    let stress = shear_stress(
        &strain_unit,
        outcome.params.gamma_ref,
        outcome.params.s,
        outcome.params.beta,
        1.0,
    );
    let fitted_damping = damping_from_stress_strain(&strain_unit, &stress, 1.0);
    let fitted_line: Vec<(f64, f64)> = strain_pct
        .iter()
        .zip(fitted_damping.iter())
        .map(|(&s, &d)| (s, d * 100.0 + baseline_pct))
        .collect();

    let y_max = measured
        .iter()
        .chain(fitted_line.iter())
        .map(|&(_, d)| d)
        .fold(f64::NEG_INFINITY, f64::max)
        * 1.1;

    // Plot
    let root = SVGBackend::new("damping_fit.svg", (1024, 640)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!("MKZ damping fit (loss {:.3e})", outcome.misfit),
            ("sans-serif", 28),
        )
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (measured[0].0..measured[measured.len() - 1].0).log_scale(),
            0.0..y_max,
        )?;

    chart
        .configure_mesh()
        .x_desc("Shear strain (%)")
        .y_desc("Damping ratio (%)")
        .draw()?;

    chart.draw_series(vec![PathElement::new(fitted_line, RED.stroke_width(2))])?;
    chart.draw_series(
        measured
            .iter()
            .map(|pt| Circle::new(*pt, 4, BLUE.filled())),
    )?;

    println!("Chart saved to damping_fit.svg");
    Ok(())
}
