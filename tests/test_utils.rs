use serde::Deserialize;
use soildyn_lib::models::utils::{damping_from_stress_strain, logspace};
use soildyn_lib::{shear_stress, DampingCurve, MkzParams};

/// CSV row structure matching the damping curve fixture format
#[derive(Debug, Deserialize)]
struct CsvRow {
    strain_pct: f64,
    damping_pct: f64,
}

/// Load a measured damping curve from a two-column CSV file.
#[allow(dead_code)] // each integration test crate pulls in what it needs
pub fn load_damping_curve_csv(file_path: &str) -> Result<DampingCurve, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let mut pairs = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        pairs.push((row.strain_pct, row.damping_pct));
    }
    Ok(DampingCurve::from_percent_pairs(&pairs)?)
}

/// Generate a synthetic measured curve (percent units) from known MKZ shape
/// parameters, including a small-strain damping baseline the way laboratory
/// curves carry one.
#[allow(dead_code)]
pub fn synthetic_damping_curve(
    params: &MkzParams,
    baseline_damping_pct: f64,
    n_points: usize,
) -> DampingCurve {
    // Strain from 1e-4 % to 10 % covers the full dense fitting grid once
    // converted to unit "1".
    let strain_pct = logspace(-4.0, 1.0, n_points);
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
        .map(|(&s_pct, &d_unit)| (s_pct, d_unit * 100.0 + baseline_damping_pct))
        .collect();

    DampingCurve::from_percent_pairs(&pairs).expect("synthetic curve is always well formed")
}
