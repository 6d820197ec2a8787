//! # Soildyn-Lib: Soil Dynamic Response Curves and Site Amplification Factors
//!
//! `soildyn-lib` is a Rust library for geotechnical earthquake engineering
//! workflows, focused on two jobs:
//!
//! - **Damping-curve calibration**: fit the parameters of the MKZ nonlinear
//!   stress-strain model to a measured damping-ratio-versus-strain curve,
//!   using a seeded population-based global search over a log-power
//!   parameter space.
//! - **Site factors**: map a site descriptor triple (Vs30, z1000, PGA) to
//!   amplification and phase-shift spectra by trilinear interpolation inside
//!   an irregular precomputed lookup grid.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use soildyn_lib::{calibrate_mkz_damping, default_configs, DampingCurve};
//!
//! // Measured curve: (strain %, damping %) rows.
//! let curve = DampingCurve::from_percent_pairs(&[
//!     (0.0001, 1.2),
//!     (0.001, 1.8),
//!     (0.01, 4.0),
//!     (0.1, 9.5),
//!     (1.0, 16.0),
//! ])?;
//!
//! let config = default_configs::fast();
//! let outcome = calibrate_mkz_damping(&curve, &config)?;
//! println!(
//!     "gamma_ref = {:.4e}, s = {:.4}, beta = {:.4}, misfit = {:.4e}",
//!     outcome.params.gamma_ref, outcome.params.s, outcome.params.beta, outcome.misfit
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Optimizer Backends
//!
//! Two interchangeable global minimizers run the search, selected through
//! [`OptimizationConfig::backend`] rather than by type:
//! - `differential_evolution`: continuous rand/1/bin differential evolution
//! - `genetic`: genetic algorithm with simulated binary crossover and
//!   polynomial mutation (crowding degree `eta`)
//!
//! Both support an optional parallel evaluation mode that fans one
//! generation's misfit evaluations across worker threads; with a fixed seed
//! the result is identical either way, because the objective is pure and all
//! randomness is drawn before each evaluation batch.
//!
//! ## Configuration Presets
//!
//! - [`default_configs::fast()`]: balanced speed/accuracy for development
//! - [`default_configs::thorough()`]: high-effort settings for final fits
//! - [`default_configs::minimal()`]: quick validation settings

// ================================================================================================
// MODULES
// ================================================================================================

pub mod calibration;
pub mod models;
pub mod site_factors;

// ================================================================================================
// IMPORTS
// ================================================================================================

use anyhow::Result;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Calibration configuration and input types
pub use calibration::{
    config::{OptimizationConfig, OptimizerBackend},
    pipeline::{evaluate_damping_fit, fit_damping_curve_with, preprocess_damping_curve},
    types::{DampingCurve, DampingPoint, FitOutcome, GlobalOptimizer},
};

// MKZ model types and the misfit objective
pub use models::mkz::{
    mkz_calibrator::DampingMisfit,
    mkz_model::{shear_stress, MkzCurve, MkzParams},
};

// Site factor engine types and operations
pub use site_factors::{
    range_check, search_sorted, standard_pga_axis, standard_vs30_axis, standard_z1000_axis,
    trilinear_interpolate, FactorTable, FrequencySpectrum, PhaseMethod, RangeFlag,
    SiteFactorGrid, SiteFactors,
};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured optimization settings for common use cases.
pub mod default_configs {
    use crate::calibration::config::OptimizationConfig;

    /// Balanced configuration for development and exploratory fitting.
    ///
    /// Population 100, 40 generations. Good convergence on smooth laboratory
    /// curves in well under a second.
    pub fn fast() -> OptimizationConfig {
        OptimizationConfig::fast()
    }

    /// High-effort configuration for final production fits.
    ///
    /// Population 1200, 200 generations. Use when the measured curve is noisy
    /// or the fit feeds a published site response model.
    pub fn thorough() -> OptimizationConfig {
        OptimizationConfig::thorough()
    }

    /// Minimal configuration for quick validation and unit tests.
    pub fn minimal() -> OptimizationConfig {
        OptimizationConfig::minimal()
    }
}

// ================================================================================================
// TOP-LEVEL API
// ================================================================================================

/// Fit MKZ model parameters to one measured damping curve.
///
/// The curve is a two-column (strain %, damping %) table. Preprocessing
/// subtracts the small-strain damping baseline, converts to unit "1", and
/// resamples onto a dense logarithmic strain grid; the backend named in
/// `config` then searches `(gamma_ref, s, beta)` as log10 powers inside the
/// configured bound interval. `g_max` always comes back as 1.0 (it cancels
/// out of the damping metric); override it with [`MkzParams::with_g_max`]
/// when a physical modulus is known.
///
/// # Errors
///
/// Fails before any search starts if the bound powers are inverted or the
/// curve table is malformed (the [`DampingCurve`] constructor catches
/// negative and non-finite values). Optimizer non-convergence is *not* an
/// error: the best candidate found is returned and
/// [`FitOutcome::misfit`] tells the caller how good it is.
///
/// # Example
///
/// ```rust,no_run
/// use soildyn_lib::{calibrate_mkz_damping, DampingCurve, OptimizationConfig};
///
/// let curve = DampingCurve::from_percent_pairs(&[(0.001, 1.5), (0.01, 3.0), (0.1, 8.0)])?;
/// let outcome = calibrate_mkz_damping(&curve, &OptimizationConfig::default())?;
/// println!("fit quality: {:.3e} ({})", outcome.misfit, outcome.backend);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn calibrate_mkz_damping(
    curve: &DampingCurve,
    config: &OptimizationConfig,
) -> Result<FitOutcome> {
    calibration::pipeline::fit_damping_curve(curve, config)
}

/// Evaluate the calibration loss for a fixed MKZ parameter set.
///
/// This produces **exactly the same loss value** that
/// [`calibrate_mkz_damping`] minimizes internally, so external callers can
/// measure fit quality without re-running the optimizer.
pub fn evaluate_mkz_misfit(curve: &DampingCurve, params: &MkzParams) -> Result<f64> {
    calibration::pipeline::evaluate_damping_fit(curve, params)
}
