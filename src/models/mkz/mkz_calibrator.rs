// src/models/mkz/mkz_calibrator.rs

//! MKZ damping misfit objective
//!
//! Scores a candidate MKZ parameter set against a target damping curve. The
//! optimizer works in a log10-transformed space: each candidate vector holds
//! `(log10(gamma_ref), log10(s), log10(beta))`, which keeps the search well
//! conditioned across the many orders of magnitude the physical parameters
//! span. `Gmax` is pinned to 1.0; it cancels out of the damping metric.

use crate::models::mkz::mkz_model::shear_stress;
use crate::models::utils::{damping_from_stress_strain, mean_absolute_error};
use anyhow::{anyhow, Result};

/// Objective value assigned to candidates whose misfit is not finite
/// (overflow in the stress denominator for extreme parameter guesses).
/// Selection pressure discards them without surfacing an error.
const REJECT_MISFIT: f64 = 1.0e12;

/// Number of free parameters in the damping-only fit.
pub const N_FREE_PARAMS: usize = 3;

/// Damping misfit objective over a fixed target curve.
///
/// The target curve must already be preprocessed: strain and damping in unit
/// "1", baseline damping removed, and resampled onto a dense strain grid (the
/// calibration pipeline does all of this). Evaluation is pure and stateless,
/// so one instance can be shared across parallel evaluations.
#[derive(Debug, Clone)]
pub struct DampingMisfit {
    strain: Vec<f64>,
    damping: Vec<f64>,
}

impl DampingMisfit {
    /// Constructor from a preprocessed target curve.
    pub fn new(strain: Vec<f64>, damping: Vec<f64>) -> Result<Self> {
        if strain.len() != damping.len() {
            return Err(anyhow!(
                "DampingMisfit requires same-length strain and damping arrays, got {} and {}",
                strain.len(),
                damping.len()
            ));
        }
        if strain.is_empty() {
            return Err(anyhow!("DampingMisfit requires a non-empty target curve"));
        }
        Ok(Self { strain, damping })
    }

    /// Target strain grid (unit "1").
    pub fn strain(&self) -> &[f64] {
        &self.strain
    }

    /// Target damping values (unit "1").
    pub fn damping(&self) -> &[f64] {
        &self.damping
    }

    /// Mean absolute error between the target damping curve and the damping
    /// implied by the candidate `(log10(gamma_ref), log10(s), log10(beta))`.
    ///
    /// Lower is better; non-negative; deterministic for identical inputs.
    pub fn evaluate(&self, log_params: &[f64]) -> f64 {
        assert_eq!(
            log_params.len(),
            N_FREE_PARAMS,
            "log-parameter vector length must be 3 for the MKZ damping fit"
        );

        let gamma_ref = 10f64.powf(log_params[0]);
        let s = 10f64.powf(log_params[1]);
        let beta = 10f64.powf(log_params[2]);
        let g_max = 1.0; // cancels out of the damping computation

        let stress = shear_stress(&self.strain, gamma_ref, s, beta, g_max);
        let predicted = damping_from_stress_strain(&self.strain, &stress, g_max);
        let error = mean_absolute_error(&self.damping, &predicted);

        if error.is_finite() {
            error
        } else {
            REJECT_MISFIT
        }
    }
}
