// src/models/mkz/mkz_model.rs

//! MKZ nonlinear stress-strain model implementation
//!
//! The MKZ model (Matasovic and Vucetic, 1993) is a closed-form backbone
//! curve for soil shear behavior. The shear stress at strain gamma is:
//!
//! tau(gamma) = Gmax * gamma / (1 + beta * (|gamma| / gamma_ref)^s)
//!
//! where the parameters are:
//! - gamma_ref: reference strain (shape parameter)
//! - s: shape exponent
//! - beta: shape coefficient
//! - Gmax: initial shear modulus (overall scale)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the MKZ stress-strain model.
///
/// All four parameters are strictly positive. `g_max` is a free scale factor:
/// it cancels out of the damping misfit, so the fitting pipeline always
/// produces `g_max == 1.0` and callers overwrite it when a physical modulus
/// is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MkzParams {
    /// Reference shear strain (unit "1")
    pub gamma_ref: f64,
    /// Shape exponent
    pub s: f64,
    /// Shape coefficient
    pub beta: f64,
    /// Initial shear modulus (arbitrary unit, Pa recommended)
    pub g_max: f64,
}

/// Validate MKZ parameters: all must be strictly positive and finite.
fn validate_mkz_params(gamma_ref: f64, s: f64, beta: f64, g_max: f64) -> Result<()> {
    if gamma_ref <= 0.0 || !gamma_ref.is_finite() {
        return Err(anyhow!(
            "MkzParams validation: gamma_ref ({}) must be > 0 and finite",
            gamma_ref
        ));
    }
    if s <= 0.0 || !s.is_finite() {
        return Err(anyhow!(
            "MkzParams validation: s ({}) must be > 0 and finite",
            s
        ));
    }
    if beta <= 0.0 || !beta.is_finite() {
        return Err(anyhow!(
            "MkzParams validation: beta ({}) must be > 0 and finite",
            beta
        ));
    }
    if g_max <= 0.0 || !g_max.is_finite() {
        return Err(anyhow!(
            "MkzParams validation: g_max ({}) must be > 0 and finite",
            g_max
        ));
    }
    Ok(())
}

impl MkzParams {
    /// Creates new MKZ parameters with validation.
    pub fn new(gamma_ref: f64, s: f64, beta: f64, g_max: f64) -> Result<Self> {
        validate_mkz_params(gamma_ref, s, beta, g_max)?;
        Ok(Self {
            gamma_ref,
            s,
            beta,
            g_max,
        })
    }

    /// Validates the current parameter set.
    pub fn validate(&self) -> Result<()> {
        validate_mkz_params(self.gamma_ref, self.s, self.beta, self.g_max)
    }

    /// Returns a copy with the scale factor replaced by a physical modulus.
    pub fn with_g_max(self, g_max: f64) -> Result<Self> {
        Self::new(self.gamma_ref, self.s, self.beta, g_max)
    }

    /// Flatten the parameters into the 4-element ordered array layout.
    ///
    /// Normal order is `(gamma_ref, s, beta, g_max)`. With `legacy_layout`,
    /// the on-disk convention of the historical text files is produced
    /// instead: `(gamma_ref, 0.0, s, beta)`, a placeholder slot that is
    /// always zero, and no `g_max`.
    pub fn to_array(&self, legacy_layout: bool) -> [f64; 4] {
        if legacy_layout {
            [self.gamma_ref, 0.0, self.s, self.beta]
        } else {
            [self.gamma_ref, self.s, self.beta, self.g_max]
        }
    }

    /// Rebuild parameters from a 4-element ordered array.
    ///
    /// Inverse of [`to_array`](Self::to_array). Rejects any slice whose
    /// length is not exactly 4. With `legacy_layout`, the placeholder slot is
    /// ignored and `g_max` is implicitly 1.0.
    pub fn from_array(array: &[f64], legacy_layout: bool) -> Result<Self> {
        if array.len() != 4 {
            return Err(anyhow!(
                "MKZ parameter array must have exactly 4 elements, got {}",
                array.len()
            ));
        }
        if legacy_layout {
            Self::new(array[0], array[2], array[3], 1.0)
        } else {
            Self::new(array[0], array[1], array[2], array[3])
        }
    }
}

/// The MKZ backbone curve for a fixed parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MkzCurve {
    pub params: MkzParams,
}

impl MkzCurve {
    /// Creates a new curve from validated parameters.
    pub fn new(params: MkzParams) -> Self {
        Self { params }
    }

    /// Shear stress at a single strain level.
    pub fn stress_at(&self, strain: f64) -> f64 {
        let p = &self.params;
        p.g_max * strain / (1.0 + p.beta * (strain.abs() / p.gamma_ref).powf(p.s))
    }

    /// Shear stress at each strain level, same length as the input.
    pub fn stress(&self, strain: &[f64]) -> Vec<f64> {
        strain.iter().map(|&g| self.stress_at(g)).collect()
    }
}

/// Elementwise MKZ shear stress for a strain array (unit "1").
///
/// Convenience wrapper over [`MkzCurve::stress`] for callers that hold the
/// shape parameters as scalars. Extreme `beta`/`s` combinations can overflow
/// the denominator; the result degrades to zero stress rather than an error,
/// which the optimizer penalizes naturally.
pub fn shear_stress(strain: &[f64], gamma_ref: f64, s: f64, beta: f64, g_max: f64) -> Vec<f64> {
    strain
        .iter()
        .map(|&g| g_max * g / (1.0 + beta * (g.abs() / gamma_ref).powf(s)))
        .collect()
}
