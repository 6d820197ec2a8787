use crate::calibration::config::OptimizationConfig;
use crate::calibration::optimizers::select_backend;
use crate::calibration::types::{DampingCurve, FitOutcome, GlobalOptimizer};
use crate::models::mkz::mkz_calibrator::{DampingMisfit, N_FREE_PARAMS};
use crate::models::mkz::mkz_model::MkzParams;
use crate::models::utils::{interp_clamped, logspace};
use anyhow::{anyhow, Result};

/// Number of points in the dense resampled strain grid. A denser grid than
/// typical laboratory curves keeps the damping integral accurate and makes
/// the misfit cost independent of the input sampling.
const N_RESAMPLE: usize = 122;
/// log10 limits of the dense strain grid (unit "1").
const RESAMPLE_LO_POWER: f64 = -6.0;
const RESAMPLE_HI_POWER: f64 = -1.0;

/// Preprocess a measured percent-unit damping curve into the misfit target.
///
/// Steps, in order (the order matters):
/// 1. subtract the first-row damping from the whole damping column; the
///    model fits *excess* damping above the small-strain reference;
/// 2. convert both columns from percent to unit "1";
/// 3. resample the damping column onto 122 log-spaced strains in
///    [1e-6, 1e-1] with clamped linear interpolation.
///
/// Input validation (two columns, non-negative, finite) already happened in
/// the [`DampingCurve`] constructor.
pub fn preprocess_damping_curve(curve: &DampingCurve) -> Result<DampingMisfit> {
    let points = curve.points();
    let init_damping = points[0].damping_pct; // small-strain damping

    let strain_unit: Vec<f64> = points.iter().map(|p| p.strain_pct / 100.0).collect();
    let damping_unit: Vec<f64> = points
        .iter()
        .map(|p| (p.damping_pct - init_damping) / 100.0)
        .collect();

    let strain_dense = logspace(RESAMPLE_LO_POWER, RESAMPLE_HI_POWER, N_RESAMPLE);
    let damping_dense = interp_clamped(&strain_dense, &strain_unit, &damping_unit);

    DampingMisfit::new(strain_dense, damping_dense)
}

/// Fit MKZ parameters to one measured damping curve using the backend named
/// in the configuration.
///
/// The three shape parameters are searched as log10 powers inside
/// `[lower_bound_power, upper_bound_power]`; `g_max` is not searched (it
/// cancels out of the damping metric) and comes back as 1.0; override it
/// with [`MkzParams::with_g_max`] when a physical modulus is known.
///
/// Optimizer non-convergence is not an error: the best candidate found is
/// returned and the caller judges quality via [`FitOutcome::misfit`].
pub fn fit_damping_curve(curve: &DampingCurve, config: &OptimizationConfig) -> Result<FitOutcome> {
    let backend = select_backend(config.backend);
    fit_damping_curve_with(curve, backend.as_ref(), config)
}

/// Like [`fit_damping_curve`], with an explicit backend. This is the seam
/// for callers that carry their own [`GlobalOptimizer`] implementation.
pub fn fit_damping_curve_with(
    curve: &DampingCurve,
    backend: &dyn GlobalOptimizer,
    config: &OptimizationConfig,
) -> Result<FitOutcome> {
    let (lo, hi) = config.bound_powers();
    if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
        return Err(anyhow!(
            "invalid bound powers: lower ({}) must be below upper ({})",
            lo,
            hi
        ));
    }

    let misfit = preprocess_damping_curve(curve)?;
    let bounds = vec![(lo, hi); N_FREE_PARAMS];
    let objective = |x: &[f64]| misfit.evaluate(x);

    let (best_obj, best_log) = backend.minimize(&objective, &bounds, config);

    let params = MkzParams::new(
        10f64.powf(best_log[0]),
        10f64.powf(best_log[1]),
        10f64.powf(best_log[2]),
        1.0,
    )?;

    Ok(FitOutcome {
        params,
        misfit: best_obj,
        backend: backend.name(),
    })
}

/// Evaluate the exact loss that [`fit_damping_curve`] minimizes, for a fixed
/// parameter set. Lets callers measure fit quality without re-running the
/// search. `g_max` does not influence the value.
pub fn evaluate_damping_fit(curve: &DampingCurve, params: &MkzParams) -> Result<f64> {
    params.validate()?;
    let misfit = preprocess_damping_curve(curve)?;
    Ok(misfit.evaluate(&[
        params.gamma_ref.log10(),
        params.s.log10(),
        params.beta.log10(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape_and_baseline() {
        let curve = DampingCurve::from_percent_pairs(&[
            (1e-4, 1.2),
            (1e-3, 1.8),
            (1e-2, 4.0),
            (1e-1, 9.5),
            (1.0, 16.0),
        ])
        .unwrap();

        let misfit = preprocess_damping_curve(&curve).unwrap();
        assert_eq!(misfit.strain().len(), 122);
        assert_eq!(misfit.damping().len(), 122);

        // Dense grid spans [1e-6, 1e-1] in unit "1".
        assert!((misfit.strain()[0] - 1e-6).abs() < 1e-18);
        assert!((misfit.strain()[121] - 1e-1).abs() < 1e-12);

        // The baseline offset makes the small-strain end start at zero
        // (queries left of the first measured strain clamp to it).
        assert_eq!(misfit.damping()[0], 0.0);

        // The largest dense strain (0.1 unit = 10%) lies beyond the last
        // measured point (1% strain), so it clamps to the final excess value.
        let last = *misfit.damping().last().unwrap();
        assert!((last - (16.0 - 1.2) / 100.0).abs() < 1e-15);
    }

    #[test]
    fn test_bound_power_validation() {
        let curve = DampingCurve::from_percent_pairs(&[(1e-3, 1.0), (1e-1, 5.0)]).unwrap();
        let config = OptimizationConfig {
            lower_bound_power: 4.0,
            upper_bound_power: -4.0,
            ..OptimizationConfig::minimal()
        };
        assert!(fit_damping_curve(&curve, &config).is_err());
    }
}
