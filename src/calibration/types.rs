use crate::calibration::config::OptimizationConfig;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One measured point of a strain-damping curve. Both columns use percent as
/// the unit, matching how laboratory curves are reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampingPoint {
    /// Shear strain in percent
    pub strain_pct: f64,
    /// Damping ratio in percent
    pub damping_pct: f64,
}

/// A measured damping curve: the two-column (strain %, damping %) input table
/// accepted by the fitting pipeline.
///
/// Construction validates the table up front (taxonomy: caller error, fail
/// fast before any search starts): at least two rows, all values finite and
/// non-negative. Strain values are expected to be increasing; the resampling
/// step assumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DampingCurve {
    points: Vec<DampingPoint>,
}

impl DampingCurve {
    /// Build a curve from percent-unit rows, rejecting malformed tables.
    pub fn from_percent(points: Vec<DampingPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(anyhow!(
                "damping curve needs at least 2 rows, got {}",
                points.len()
            ));
        }
        for (i, p) in points.iter().enumerate() {
            if !p.strain_pct.is_finite() || !p.damping_pct.is_finite() {
                return Err(anyhow!(
                    "damping curve row {} contains a non-finite value ({}, {})",
                    i,
                    p.strain_pct,
                    p.damping_pct
                ));
            }
            if p.strain_pct < 0.0 || p.damping_pct < 0.0 {
                return Err(anyhow!(
                    "damping curve row {} contains a negative value ({}, {})",
                    i,
                    p.strain_pct,
                    p.damping_pct
                ));
            }
        }
        Ok(Self { points })
    }

    /// Convenience constructor from `(strain %, damping %)` pairs.
    pub fn from_percent_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::from_percent(
            pairs
                .iter()
                .map(|&(strain_pct, damping_pct)| DampingPoint {
                    strain_pct,
                    damping_pct,
                })
                .collect(),
        )
    }

    pub fn points(&self) -> &[DampingPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Bounded global minimizer over a real parameter vector.
///
/// Both optimizer backends implement this trait; callers select one through
/// [`OptimizationConfig::backend`](crate::calibration::config::OptimizationConfig),
/// not by type-checking. The objective must be pure and `Sync` so a
/// generation's evaluations can be fanned out across workers.
pub trait GlobalOptimizer: Send + Sync {
    /// Short backend name for logging and result labeling.
    fn name(&self) -> &'static str;

    /// Minimize `objective` over the box given by `bounds`, one `(min, max)`
    /// pair per dimension. Runs for the configured generation budget and
    /// returns `(best_objective, best_vector)`: the best candidate found,
    /// regardless of convergence quality.
    fn minimize(
        &self,
        objective: &(dyn Fn(&[f64]) -> f64 + Sync),
        bounds: &[(f64, f64)],
        config: &OptimizationConfig,
    ) -> (f64, Vec<f64>);
}

/// Outcome of a damping-curve fit.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Best-fit MKZ parameters (`g_max` is always 1.0, see the pipeline docs)
    pub params: crate::models::mkz::mkz_model::MkzParams,
    /// Final mean absolute damping error (unit "1"), lower is better
    pub misfit: f64,
    /// Name of the backend that produced the result
    pub backend: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_validation() {
        assert!(DampingCurve::from_percent_pairs(&[(1e-4, 1.0), (1e-3, 2.0)]).is_ok());

        // Too short
        assert!(DampingCurve::from_percent_pairs(&[(1e-4, 1.0)]).is_err());
        // Negative damping
        assert!(DampingCurve::from_percent_pairs(&[(1e-4, -1.0), (1e-3, 2.0)]).is_err());
        // Negative strain
        assert!(DampingCurve::from_percent_pairs(&[(-1e-4, 1.0), (1e-3, 2.0)]).is_err());
        // Non-finite value
        assert!(DampingCurve::from_percent_pairs(&[(1e-4, f64::NAN), (1e-3, 2.0)]).is_err());
    }
}
