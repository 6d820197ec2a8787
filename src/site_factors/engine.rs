//! Site factor query engine
//!
//! Pure, state-machine-free lookups over a fixed [`SiteFactorGrid`]: bracket
//! the query on each irregular axis, gather the surrounding grid cell, and
//! multilinearly interpolate one value per frequency. Queries outside the
//! calibrated range are answered anyway via boundary-clamped brackets;
//! [`range_check`] reports which calibration limits were crossed.

use crate::site_factors::grid::{FactorTable, SiteFactorGrid};
use crate::site_factors::types::{FrequencySpectrum, PhaseMethod, RangeFlag};
use anyhow::{anyhow, Result};

/// Calibrated Vs30 interval (m/s).
pub const VS30_CALIBRATION_RANGE: (f64, f64) = (175.0, 950.0);
/// Calibrated z1000 interval (m).
pub const Z1000_CALIBRATION_RANGE: (f64, f64) = (8.0, 900.0);
/// Calibrated PGA interval (g).
pub const PGA_CALIBRATION_RANGE: (f64, f64) = (0.001, 1.5);

/// Maximum calibrated sediment depth for stiff sites, as a step function of
/// Vs30: `(vs30_lo_exclusive, vs30_hi_inclusive, z1000_max)`. Profiles above
/// the step were not part of the calibration set.
const VS30_Z1000_LADDER: [(f64, f64, f64); 8] = [
    (400.0, 450.0, 750.0),
    (450.0, 550.0, 600.0),
    (550.0, 600.0, 450.0),
    (600.0, 650.0, 300.0),
    (650.0, 750.0, 150.0),
    (750.0, 800.0, 75.0),
    (800.0, 850.0, 36.0),
    (850.0, 950.0, 16.0),
];

/// Report which calibration limits a site descriptor triple crosses.
///
/// Used to warn callers that a lookup is extrapolated, never to block it.
/// The exact boundary outcomes (endpoints unflagged, anything strictly
/// outside flagged) follow the published calibration tables.
pub fn range_check(vs30: f64, z1000: f64, pga: f64) -> Vec<RangeFlag> {
    let mut flags = Vec::new();

    if vs30 < VS30_CALIBRATION_RANGE.0 || vs30 > VS30_CALIBRATION_RANGE.1 {
        flags.push(RangeFlag::Vs30OutOfRange);
    }
    if z1000 < Z1000_CALIBRATION_RANGE.0 || z1000 > Z1000_CALIBRATION_RANGE.1 {
        flags.push(RangeFlag::Z1000OutOfRange);
    }
    if pga < PGA_CALIBRATION_RANGE.0 || pga > PGA_CALIBRATION_RANGE.1 {
        flags.push(RangeFlag::PgaOutOfRange);
    }
    if VS30_Z1000_LADDER
        .iter()
        .any(|&(lo, hi, z_max)| vs30 > lo && vs30 <= hi && z1000 > z_max)
    {
        flags.push(RangeFlag::Vs30Z1000Combination);
    }

    flags
}

/// Locate the pair of adjacent axis indices bracketing `value`.
///
/// `axis` must be sorted ascending with at least two entries. A value equal
/// to an interior grid point `axis[i]` returns `[i - 1, i]` (the lower
/// bracket is preferred). Values at or beyond either end clamp to the first
/// or last index pair (the extrapolation bracket) rather than erroring.
pub fn search_sorted(value: f64, axis: &[f64]) -> [usize; 2] {
    debug_assert!(axis.len() >= 2, "axis needs at least two grid values");
    let i = axis.partition_point(|&v| v < value);
    if i == 0 {
        [0, 1]
    } else if i >= axis.len() {
        [axis.len() - 2, axis.len() - 1]
    } else {
        [i - 1, i]
    }
}

fn axis_weight(query: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        0.0
    } else {
        (query - lo) / (hi - lo)
    }
}

/// Trilinear combination of 8 product-ordered corner values with the three
/// fractional weights. Weights outside [0, 1] extrapolate linearly.
fn trilinear_from_weights(values: &[f64; 8], tx: f64, ty: f64, tz: f64) -> f64 {
    // Corner order: index = ix*4 + iy*2 + iz. Collapse z, then y, then x.
    let c00 = values[0] * (1.0 - tz) + values[1] * tz;
    let c01 = values[2] * (1.0 - tz) + values[3] * tz;
    let c10 = values[4] * (1.0 - tz) + values[5] * tz;
    let c11 = values[6] * (1.0 - tz) + values[7] * tz;

    let c0 = c00 * (1.0 - ty) + c01 * ty;
    let c1 = c10 * (1.0 - ty) + c11 * ty;

    c0 * (1.0 - tx) + c1 * tx
}

/// Trilinear interpolation over one grid cell.
///
/// `vertices` are the 8 cell corners in product order, x varying slowest and
/// z fastest: `(x0,y0,z0), (x0,y0,z1), (x0,y1,z0), ... (x1,y1,z1)`, with
/// `values` in the same order. Matches a reference regular-grid trilinear
/// interpolator exactly for any valid cuboid; rejects vertex sets that do
/// not form one.
pub fn trilinear_interpolate(
    vertices: &[[f64; 3]],
    values: &[f64],
    point: [f64; 3],
) -> Result<f64> {
    if vertices.len() != 8 || values.len() != 8 {
        return Err(anyhow!(
            "trilinear interpolation needs exactly 8 vertices and 8 values, got {} and {}",
            vertices.len(),
            values.len()
        ));
    }

    let x = [vertices[0][0], vertices[4][0]];
    let y = [vertices[0][1], vertices[2][1]];
    let z = [vertices[0][2], vertices[1][2]];

    for (idx, vertex) in vertices.iter().enumerate() {
        let expected = [x[idx >> 2], y[(idx >> 1) & 1], z[idx & 1]];
        if *vertex != expected {
            return Err(anyhow!(
                "vertex {} ({:?}) does not follow product order over a cuboid (expected {:?})",
                idx,
                vertex,
                expected
            ));
        }
    }

    let tx = axis_weight(point[0], x[0], x[1]);
    let ty = axis_weight(point[1], y[0], y[1]);
    let tz = axis_weight(point[2], z[0], z[1]);

    let mut corner_values = [0.0; 8];
    corner_values.copy_from_slice(values);
    Ok(trilinear_from_weights(&corner_values, tx, ty, tz))
}

/// Query engine for one site over a fixed factor grid.
///
/// Holds the site descriptor triple `(Vs30, z1000, PGA)` and borrows the
/// read-only grid; every lookup is a pure function of the two.
#[derive(Debug, Clone)]
pub struct SiteFactors<'a> {
    grid: &'a SiteFactorGrid,
    vs30: f64,
    z1000: f64,
    pga: f64,
}

impl<'a> SiteFactors<'a> {
    /// Bind a site descriptor triple to a grid. Each descriptor must be a
    /// positive finite scalar; out-of-calibration values are allowed (see
    /// [`range_check`]).
    pub fn new(grid: &'a SiteFactorGrid, vs30: f64, z1000: f64, pga: f64) -> Result<Self> {
        for (name, value) in [("Vs30", vs30), ("z1000", z1000), ("PGA", pga)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(anyhow!(
                    "site descriptor {} must be a positive finite scalar, got {}",
                    name,
                    value
                ));
            }
        }
        Ok(Self {
            grid,
            vs30,
            z1000,
            pga,
        })
    }

    /// Applicability flags for this site triple (empty when fully inside the
    /// calibrated range).
    pub fn range_flags(&self) -> Vec<RangeFlag> {
        range_check(self.vs30, self.z1000, self.pga)
    }

    /// Bracketing index pairs on the Vs30, z1000 and PGA axes, in that order.
    pub fn find_neighbors(&self) -> [[usize; 2]; 3] {
        [
            search_sorted(self.vs30, self.grid.vs30_axis()),
            search_sorted(self.z1000, self.grid.z1000_axis()),
            search_sorted(self.pga, self.grid.pga_axis()),
        ]
    }

    /// Amplification spectrum for this site. `fourier` selects the
    /// Fourier-amplitude tables; otherwise the response-spectrum tables are
    /// used.
    pub fn get_amplification(&self, fourier: bool) -> FrequencySpectrum {
        self.interpolate_table(self.grid.amplification_table(fourier))
    }

    /// Phase-shift spectrum for this site under the chosen phase model.
    pub fn get_phase_shift(&self, method: PhaseMethod) -> FrequencySpectrum {
        self.interpolate_table(self.grid.phase_table(method))
    }

    /// Interpolate one table at the site triple for every frequency on the
    /// grid's frequency axis.
    fn interpolate_table(&self, table: &FactorTable) -> FrequencySpectrum {
        let [vs30_bracket, z1000_bracket, pga_bracket] = self.find_neighbors();

        let vs30_axis = self.grid.vs30_axis();
        let z1000_axis = self.grid.z1000_axis();
        let pga_axis = self.grid.pga_axis();

        let tx = axis_weight(
            self.vs30,
            vs30_axis[vs30_bracket[0]],
            vs30_axis[vs30_bracket[1]],
        );
        let ty = axis_weight(
            self.z1000,
            z1000_axis[z1000_bracket[0]],
            z1000_axis[z1000_bracket[1]],
        );
        let tz = axis_weight(
            self.pga,
            pga_axis[pga_bracket[0]],
            pga_axis[pga_bracket[1]],
        );

        let points = self
            .grid
            .freq_axis()
            .iter()
            .enumerate()
            .map(|(l, &freq)| {
                let mut corner_values = [0.0; 8];
                let mut idx = 0;
                for &i in &vs30_bracket {
                    for &j in &z1000_bracket {
                        for &k in &pga_bracket {
                            corner_values[idx] = table.value_at(i, j, k, l);
                            idx += 1;
                        }
                    }
                }
                (freq, trilinear_from_weights(&corner_values, tx, ty, tz))
            })
            .collect();

        FrequencySpectrum::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site_factors::grid::{
        standard_pga_axis, standard_vs30_axis, standard_z1000_axis, FactorTable,
    };

    fn flags(codes: &[u8]) -> Vec<RangeFlag> {
        codes
            .iter()
            .map(|&c| match c {
                1 => RangeFlag::Vs30OutOfRange,
                2 => RangeFlag::Z1000OutOfRange,
                3 => RangeFlag::PgaOutOfRange,
                4 => RangeFlag::Vs30Z1000Combination,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_range_check_axis_limits() {
        assert_eq!(range_check(174.0, 300.0, 0.6), flags(&[1]));
        assert_eq!(range_check(951.0, 300.0, 0.6), flags(&[1]));
        assert_eq!(range_check(300.0, 7.0, 0.6), flags(&[2]));
        assert_eq!(range_check(300.0, 901.0, 0.6), flags(&[2]));
        assert_eq!(range_check(300.0, 600.0, 0.0009), flags(&[3]));
        assert_eq!(range_check(300.0, 600.0, 1.501), flags(&[3]));
        assert_eq!(range_check(300.0, 900.0, 0.5), flags(&[]));
        assert_eq!(range_check(400.0, 900.0, 0.5), flags(&[]));
    }

    #[test]
    fn test_range_check_vs30_z1000_ladder() {
        // Each calibrated corner of the ladder, with its two just-outside
        // neighbors.
        let cases: [(f64, f64); 7] = [
            (450.0, 750.0),
            (550.0, 600.0),
            (600.0, 450.0),
            (650.0, 300.0),
            (750.0, 150.0),
            (800.0, 75.0),
            (850.0, 36.0),
        ];
        for &(vs30, z1000) in &cases {
            assert_eq!(range_check(vs30, z1000, 0.5), flags(&[]), "at ({vs30}, {z1000})");
            assert_eq!(
                range_check(vs30 + 1.0, z1000, 0.5),
                flags(&[4]),
                "right of ({vs30}, {z1000})"
            );
            assert_eq!(
                range_check(vs30, z1000 + 1.0, 0.5),
                flags(&[4]),
                "above ({vs30}, {z1000})"
            );
        }
    }

    #[test]
    fn test_search_sorted_documented_cases() {
        let z1000_axis = standard_z1000_axis();
        assert_eq!(search_sorted(24.0, &z1000_axis), [1, 2]);
        assert_eq!(search_sorted(25.0, &z1000_axis), [2, 3]);
        assert_eq!(search_sorted(60.0, &z1000_axis), [3, 4]);
        assert_eq!(search_sorted(150.0, &z1000_axis), [4, 5]);
        assert_eq!(search_sorted(8.0, &z1000_axis), [0, 1]);
        assert_eq!(search_sorted(900.0, &z1000_axis), [9, 10]);
    }

    #[test]
    fn test_search_sorted_clamps_out_of_range() {
        let z1000_axis = standard_z1000_axis();
        assert_eq!(search_sorted(1.0, &z1000_axis), [0, 1]);
        assert_eq!(search_sorted(5000.0, &z1000_axis), [9, 10]);
    }

    #[test]
    fn test_trilinear_matches_reference() {
        // f(x, y, z) = x + y + z sampled at the corners of a box; trilinear
        // interpolation reproduces it exactly at any interior point.
        let x = [1.0, 2.0];
        let y = [10.0, 20.0];
        let z = [100.0, 200.0];

        let mut vertices = Vec::new();
        let mut values = Vec::new();
        for &xi in &x {
            for &yi in &y {
                for &zi in &z {
                    vertices.push([xi, yi, zi]);
                    values.push(xi + yi + zi);
                }
            }
        }

        let point = [1.5, 15.0, 150.0];
        let answer = trilinear_interpolate(&vertices, &values, point).unwrap();
        assert!((answer - 166.5).abs() < 1e-12);
    }

    #[test]
    fn test_trilinear_rejects_malformed_cells() {
        let vertices = vec![[0.0, 0.0, 0.0]; 7];
        let values = vec![0.0; 7];
        assert!(trilinear_interpolate(&vertices, &values, [0.0, 0.0, 0.0]).is_err());

        // 8 vertices that are not a product-ordered cuboid.
        let mut bad = vec![[0.0, 0.0, 0.0]; 8];
        bad[7] = [3.0, 3.0, 3.0];
        assert!(trilinear_interpolate(&bad, &vec![0.0; 8], [0.0, 0.0, 0.0]).is_err());
    }

    fn linear_grid() -> SiteFactorGrid {
        // Factor value depends linearly on the axis coordinates, so trilinear
        // lookups must reproduce it exactly everywhere inside the grid.
        let vs30 = standard_vs30_axis();
        let z1000 = standard_z1000_axis();
        let pga = standard_pga_axis();
        let freqs = vec![0.1, 1.0, 10.0];
        let dims = (vs30.len(), z1000.len(), pga.len(), freqs.len());

        let linear = |i: usize, j: usize, k: usize, l: usize| {
            vs30[i] * 1e-3 + z1000[j] * 1e-3 + pga[k] + freqs[l]
        };
        SiteFactorGrid::new(
            vs30.clone(),
            z1000.clone(),
            pga.clone(),
            freqs.clone(),
            FactorTable::from_fn(dims, linear).unwrap(),
            FactorTable::from_fn(dims, |i, j, k, l| 2.0 * linear(i, j, k, l)).unwrap(),
            FactorTable::from_fn(dims, |i, j, k, l| -linear(i, j, k, l)).unwrap(),
            FactorTable::from_fn(dims, |i, j, k, l| 0.5 * linear(i, j, k, l)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_find_neighbors_documented_cases() {
        let grid = linear_grid();

        let sf = SiteFactors::new(&grid, 190.0, 60.0, 0.85).unwrap();
        assert_eq!(sf.find_neighbors(), [[0, 1], [3, 4], [7, 8]]);

        let sf = SiteFactors::new(&grid, 175.0, 900.0, 0.05).unwrap();
        assert_eq!(sf.find_neighbors(), [[0, 1], [9, 10], [0, 1]]);

        let sf = SiteFactors::new(&grid, 950.0, 120.0, 0.01).unwrap();
        assert_eq!(sf.find_neighbors(), [[15, 16], [4, 5], [0, 1]]);
    }

    #[test]
    fn test_amplification_reproduces_linear_field() {
        let grid = linear_grid();
        let (vs30, z1000, pga) = (265.0, 128.0, 0.012);
        let sf = SiteFactors::new(&grid, vs30, z1000, pga).unwrap();

        let expected = |freq: f64| vs30 * 1e-3 + z1000 * 1e-3 + pga + freq;

        let amp = sf.get_amplification(true);
        assert_eq!(amp.len(), 3);
        for &(freq, value) in amp.points() {
            assert!((value - expected(freq)).abs() < 1e-12);
        }

        // The response-spectrum table is a distinct asset.
        let rs = sf.get_amplification(false);
        for &(freq, value) in rs.points() {
            assert!((value - 2.0 * expected(freq)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_phase_shift_method_selects_table() {
        let grid = linear_grid();
        let sf = SiteFactors::new(&grid, 365.0, 247.0, 0.75).unwrap();
        let expected = |freq: f64| 365.0 * 1e-3 + 247.0 * 1e-3 + 0.75 + freq;

        let hh = sf.get_phase_shift(PhaseMethod::EqHh);
        for &(freq, value) in hh.points() {
            assert!((value + expected(freq)).abs() < 1e-12);
        }
        let kz = sf.get_phase_shift(PhaseMethod::EqKz);
        for &(freq, value) in kz.points() {
            assert!((value - 0.5 * expected(freq)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_out_of_range_query_still_answers() {
        let grid = linear_grid();
        // Far outside every calibrated axis; the lookup extrapolates from the
        // boundary cell instead of failing, and the flags say so.
        let sf = SiteFactors::new(&grid, 1200.0, 2000.0, 3.0).unwrap();
        assert_eq!(
            sf.range_flags(),
            vec![
                RangeFlag::Vs30OutOfRange,
                RangeFlag::Z1000OutOfRange,
                RangeFlag::PgaOutOfRange,
            ]
        );

        let amp = sf.get_amplification(true);
        assert_eq!(amp.len(), 3);
        for &(freq, value) in amp.points() {
            // The linear field extrapolates exactly as well.
            let expected = 1.2 + 2.0 + 3.0 + freq;
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_positive_descriptors() {
        let grid = linear_grid();
        assert!(SiteFactors::new(&grid, 0.0, 100.0, 0.5).is_err());
        assert!(SiteFactors::new(&grid, 300.0, -5.0, 0.5).is_err());
        assert!(SiteFactors::new(&grid, 300.0, 100.0, f64::NAN).is_err());
    }
}
