pub mod mkz;

/// Shared numerical routines used by the calibration pipeline and the models
pub mod utils {
    use std::f64::consts::PI;

    /// Hysteretic damping ratio implied by a backbone stress-strain curve.
    ///
    /// Applies the Masing rule: the damping ratio at strain amplitude `gamma`
    /// is `2/pi * (2 * A / (tau * gamma) - 1)`, where `A` is the area under
    /// the backbone curve from the origin up to `gamma`. The backbone is
    /// assumed to pass through the origin (true for any secant-modulus model),
    /// so the integration starts from an implied (0, 0) point.
    ///
    /// `strain` and `stress` must have the same length; strain values are in
    /// unit "1" and should be increasing. `g_max` only normalizes the stress
    /// column for numerical conditioning; it cancels out of the area ratio.
    ///
    /// Returns one damping ratio (unit "1") per strain level. Degenerate
    /// levels where `tau * gamma == 0` yield zero damping.
    pub fn damping_from_stress_strain(strain: &[f64], stress: &[f64], g_max: f64) -> Vec<f64> {
        debug_assert_eq!(
            strain.len(),
            stress.len(),
            "strain and stress arrays must have the same length"
        );

        let n = strain.len();
        let mut damping = vec![0.0; n];

        // Cumulative trapezoidal area under the backbone, starting at (0, 0).
        let mut area = 0.0;
        let mut prev_gamma = 0.0;
        let mut prev_tau = 0.0;

        for i in 0..n {
            let gamma = strain[i];
            let tau = stress[i] / g_max;
            area += 0.5 * (tau + prev_tau) * (gamma - prev_gamma);

            let stored = gamma * tau;
            damping[i] = if stored > 0.0 {
                2.0 / PI * (2.0 * area / stored - 1.0)
            } else if stored == 0.0 {
                0.0
            } else {
                f64::NAN // non-physical backbone point; surfaces as a bad misfit
            };

            prev_gamma = gamma;
            prev_tau = tau;
        }

        damping
    }

    /// Mean absolute error between two same-length arrays.
    ///
    /// The caller is responsible for resampling both series onto a common
    /// grid first; mismatched lengths are a programmer error.
    pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "mean_absolute_error requires same-length arrays"
        );
        if y_true.is_empty() {
            return 0.0;
        }
        let sum: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        sum / y_true.len() as f64
    }

    /// `num` points spaced evenly on a log10 scale between `10^start_power`
    /// and `10^stop_power`, endpoints included.
    pub fn logspace(start_power: f64, stop_power: f64, num: usize) -> Vec<f64> {
        if num == 0 {
            return Vec::new();
        }
        if num == 1 {
            return vec![10f64.powf(start_power)];
        }
        let step = (stop_power - start_power) / (num - 1) as f64;
        (0..num)
            .map(|i| 10f64.powf(start_power + i as f64 * step))
            .collect()
    }

    /// Piecewise-linear interpolation of `(xp, fp)` at the points `x_new`,
    /// clamping to the end values outside the sampled range.
    ///
    /// `xp` must be sorted ascending. Queries left of `xp[0]` return `fp[0]`,
    /// queries right of the last point return the last value.
    pub fn interp_clamped(x_new: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
        debug_assert_eq!(xp.len(), fp.len());
        debug_assert!(!xp.is_empty());

        x_new
            .iter()
            .map(|&x| {
                if x <= xp[0] {
                    return fp[0];
                }
                let last = xp.len() - 1;
                if x >= xp[last] {
                    return fp[last];
                }
                let idx = xp.partition_point(|&v| v < x);
                let (x0, x1) = (xp[idx - 1], xp[idx]);
                let (y0, y1) = (fp[idx - 1], fp[idx]);
                if x1 == x0 {
                    return y0;
                }
                let t = (x - x0) / (x1 - x0);
                y0 + t * (y1 - y0)
            })
            .collect()
    }
}
