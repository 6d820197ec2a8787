// demos/site_factors_demo.rs

//! Demonstration of site amplification factor queries
//!
//! Builds a lookup grid over the published calibration axes (with a
//! synthetic factor field in place of the real table assets), then queries
//! amplification and phase spectra for a site triple and shows how
//! out-of-range queries are flagged but still answered.

use anyhow::Result;
use soildyn_lib::{
    standard_pga_axis, standard_vs30_axis, standard_z1000_axis, FactorTable, PhaseMethod,
    SiteFactorGrid, SiteFactors,
};

fn main() -> Result<()> {
    println!("Site Amplification Factors Demo");
    println!("===============================");

    let vs30_axis = standard_vs30_axis();
    let z1000_axis = standard_z1000_axis();
    let pga_axis = standard_pga_axis();
    let freq_axis: Vec<f64> = vec![0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0];
    let dims = (
        vs30_axis.len(),
        z1000_axis.len(),
        pga_axis.len(),
        freq_axis.len(),
    );

    // Synthetic stand-in for the precomputed factor tables: softer and
    // deeper sites amplify more, stronger shaking amplifies less.
    let amp = {
        let (vs30, z1000, pga) = (vs30_axis.clone(), z1000_axis.clone(), pga_axis.clone());
        FactorTable::from_fn(dims, move |i, j, k, _| {
            1.0 + 250.0 / vs30[i] + z1000[j] / 3000.0 - 0.3 * pga[k]
        })?
    };
    let phase = {
        let freqs = freq_axis.clone();
        FactorTable::from_fn(dims, move |_, _, _, l| 0.02 * freqs[l].ln().max(0.0))?
    };

    let grid = SiteFactorGrid::new(
        vs30_axis,
        z1000_axis,
        pga_axis,
        freq_axis,
        amp.clone(),
        amp,
        phase.clone(),
        phase,
    )?;

    // A soft, deep site under moderate shaking.
    let sf = SiteFactors::new(&grid, 265.0, 128.0, 0.3)?;
    println!("\nSite: Vs30 = 265 m/s, z1000 = 128 m, PGA = 0.3 g");
    println!("Range flags: {:?}", sf.range_flags());
    println!("Bracketing indices (Vs30, z1000, PGA): {:?}", sf.find_neighbors());

    let amp_spectrum = sf.get_amplification(true);
    println!("\nFourier amplification spectrum:");
    for &(freq, value) in amp_spectrum.points() {
        println!("  {:>6.2} Hz: {:.4}", freq, value);
    }

    let phase_spectrum = sf.get_phase_shift(PhaseMethod::EqHh);
    println!("\nPhase shift spectrum (eq_hh):");
    for &(freq, value) in phase_spectrum.points() {
        println!("  {:>6.2} Hz: {:.4}", freq, value);
    }

    // Out-of-calibration query: flagged, not blocked.
    let extrapolated = SiteFactors::new(&grid, 120.0, 950.0, 2.0)?;
    println!("\nSite: Vs30 = 120 m/s, z1000 = 950 m, PGA = 2.0 g (outside calibration)");
    println!(
        "Range flags: {:?} (lookup proceeds via boundary extrapolation)",
        extrapolated.range_flags()
    );
    let amp_extrapolated = extrapolated.get_amplification(false);
    println!(
        "Response-spectrum amplification at {:.1} Hz: {:.4}",
        amp_extrapolated.points()[0].0,
        amp_extrapolated.points()[0].1
    );

    Ok(())
}
