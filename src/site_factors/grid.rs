//! Site factor lookup grid
//!
//! The precomputed factor tables are an external data asset: they are loaded
//! once at process start and read-only afterwards. Each table is stored as a
//! flat arena-style array indexed by integer positions on the four axes
//! (Vs30, z1000, PGA, frequency), so the interpolation step stays a pure
//! function over eight scalars and three weights.

use crate::site_factors::types::PhaseMethod;
use anyhow::{anyhow, Result};
use serde::Deserialize;

/// One table of precomputed factor values over the full
/// `(Vs30, z1000, PGA, frequency)` grid, stored flat in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    n_vs30: usize,
    n_z1000: usize,
    n_pga: usize,
    n_freq: usize,
    values: Vec<f64>,
}

/// One record of a CSV table asset: grid indices plus the factor value.
#[derive(Debug, Deserialize)]
struct FactorRecord {
    vs30_index: usize,
    z1000_index: usize,
    pga_index: usize,
    freq_index: usize,
    value: f64,
}

impl FactorTable {
    /// Build a table from row-major flat values. The length must equal the
    /// product of the four axis sizes.
    pub fn new(dims: (usize, usize, usize, usize), values: Vec<f64>) -> Result<Self> {
        let (n_vs30, n_z1000, n_pga, n_freq) = dims;
        let expected = n_vs30 * n_z1000 * n_pga * n_freq;
        if expected == 0 {
            return Err(anyhow!("factor table axes must all be non-empty"));
        }
        if values.len() != expected {
            return Err(anyhow!(
                "factor table needs {} values for dims {:?}, got {}",
                expected,
                dims,
                values.len()
            ));
        }
        Ok(Self {
            n_vs30,
            n_z1000,
            n_pga,
            n_freq,
            values,
        })
    }

    /// Build a table by sampling a function of the four grid indices.
    /// Mostly useful for tests and demos with synthetic factor fields.
    pub fn from_fn(
        dims: (usize, usize, usize, usize),
        mut f: impl FnMut(usize, usize, usize, usize) -> f64,
    ) -> Result<Self> {
        let (n_vs30, n_z1000, n_pga, n_freq) = dims;
        let mut values = Vec::with_capacity(n_vs30 * n_z1000 * n_pga * n_freq);
        for i in 0..n_vs30 {
            for j in 0..n_z1000 {
                for k in 0..n_pga {
                    for l in 0..n_freq {
                        values.push(f(i, j, k, l));
                    }
                }
            }
        }
        Self::new(dims, values)
    }

    /// Load a table from CSV records with the header
    /// `vs30_index,z1000_index,pga_index,freq_index,value`. Every grid cell
    /// must appear exactly once.
    pub fn from_csv_reader<R: std::io::Read>(
        reader: R,
        dims: (usize, usize, usize, usize),
    ) -> Result<Self> {
        let (n_vs30, n_z1000, n_pga, n_freq) = dims;
        let total = n_vs30 * n_z1000 * n_pga * n_freq;
        if total == 0 {
            return Err(anyhow!("factor table axes must all be non-empty"));
        }

        let mut values = vec![f64::NAN; total];
        let mut filled = vec![false; total];
        let mut n_filled = 0usize;

        let mut csv_reader = csv::Reader::from_reader(reader);
        for record in csv_reader.deserialize() {
            let rec: FactorRecord = record?;
            if rec.vs30_index >= n_vs30
                || rec.z1000_index >= n_z1000
                || rec.pga_index >= n_pga
                || rec.freq_index >= n_freq
            {
                return Err(anyhow!(
                    "factor record index ({}, {}, {}, {}) outside grid dims {:?}",
                    rec.vs30_index,
                    rec.z1000_index,
                    rec.pga_index,
                    rec.freq_index,
                    dims
                ));
            }
            let idx = ((rec.vs30_index * n_z1000 + rec.z1000_index) * n_pga + rec.pga_index)
                * n_freq
                + rec.freq_index;
            if filled[idx] {
                return Err(anyhow!(
                    "duplicate factor record for indices ({}, {}, {}, {})",
                    rec.vs30_index,
                    rec.z1000_index,
                    rec.pga_index,
                    rec.freq_index
                ));
            }
            values[idx] = rec.value;
            filled[idx] = true;
            n_filled += 1;
        }

        if n_filled != total {
            return Err(anyhow!(
                "factor table incomplete: {} of {} grid cells filled",
                n_filled,
                total
            ));
        }
        Self::new(dims, values)
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.n_vs30, self.n_z1000, self.n_pga, self.n_freq)
    }

    /// Value at the given axis indices. Indices must be in range.
    pub fn value_at(&self, i_vs30: usize, i_z1000: usize, i_pga: usize, i_freq: usize) -> f64 {
        debug_assert!(
            i_vs30 < self.n_vs30
                && i_z1000 < self.n_z1000
                && i_pga < self.n_pga
                && i_freq < self.n_freq
        );
        let idx = ((i_vs30 * self.n_z1000 + i_z1000) * self.n_pga + i_pga) * self.n_freq + i_freq;
        self.values[idx]
    }
}

/// The full read-only site factor lookup grid: the three irregular site
/// descriptor axes, the frequency axis, and one [`FactorTable`] per output
/// variant.
#[derive(Debug, Clone)]
pub struct SiteFactorGrid {
    vs30_axis: Vec<f64>,
    z1000_axis: Vec<f64>,
    pga_axis: Vec<f64>,
    freq_axis: Vec<f64>,
    amp_fourier: FactorTable,
    amp_response: FactorTable,
    phase_eq_hh: FactorTable,
    phase_eq_kz: FactorTable,
}

fn check_axis(name: &str, axis: &[f64]) -> Result<()> {
    if axis.len() < 2 {
        return Err(anyhow!("{} axis needs at least 2 values", name));
    }
    for w in axis.windows(2) {
        if !(w[0] < w[1]) {
            return Err(anyhow!("{} axis must be strictly increasing", name));
        }
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(anyhow!("{} axis contains a non-finite value", name));
    }
    Ok(())
}

impl SiteFactorGrid {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vs30_axis: Vec<f64>,
        z1000_axis: Vec<f64>,
        pga_axis: Vec<f64>,
        freq_axis: Vec<f64>,
        amp_fourier: FactorTable,
        amp_response: FactorTable,
        phase_eq_hh: FactorTable,
        phase_eq_kz: FactorTable,
    ) -> Result<Self> {
        check_axis("Vs30", &vs30_axis)?;
        check_axis("z1000", &z1000_axis)?;
        check_axis("PGA", &pga_axis)?;
        check_axis("frequency", &freq_axis)?;

        let dims = (
            vs30_axis.len(),
            z1000_axis.len(),
            pga_axis.len(),
            freq_axis.len(),
        );
        for (name, table) in [
            ("Fourier amplification", &amp_fourier),
            ("response-spectrum amplification", &amp_response),
            ("eq_hh phase", &phase_eq_hh),
            ("eq_kz phase", &phase_eq_kz),
        ] {
            if table.dims() != dims {
                return Err(anyhow!(
                    "{} table dims {:?} do not match axis dims {:?}",
                    name,
                    table.dims(),
                    dims
                ));
            }
        }

        Ok(Self {
            vs30_axis,
            z1000_axis,
            pga_axis,
            freq_axis,
            amp_fourier,
            amp_response,
            phase_eq_hh,
            phase_eq_kz,
        })
    }

    pub fn vs30_axis(&self) -> &[f64] {
        &self.vs30_axis
    }

    pub fn z1000_axis(&self) -> &[f64] {
        &self.z1000_axis
    }

    pub fn pga_axis(&self) -> &[f64] {
        &self.pga_axis
    }

    pub fn freq_axis(&self) -> &[f64] {
        &self.freq_axis
    }

    /// Amplification table for the chosen spectrum kind: Fourier amplitude
    /// when `fourier` is true, response spectrum otherwise.
    pub(crate) fn amplification_table(&self, fourier: bool) -> &FactorTable {
        if fourier {
            &self.amp_fourier
        } else {
            &self.amp_response
        }
    }

    pub(crate) fn phase_table(&self, method: PhaseMethod) -> &FactorTable {
        match method {
            PhaseMethod::EqHh => &self.phase_eq_hh,
            PhaseMethod::EqKz => &self.phase_eq_kz,
        }
    }
}

/// The published Vs30 calibration axis (m/s), 17 values.
pub fn standard_vs30_axis() -> Vec<f64> {
    vec![
        175.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 550.0, 600.0, 650.0, 700.0,
        750.0, 800.0, 850.0, 900.0, 950.0,
    ]
}

/// The published z1000 calibration axis (m), 11 values.
pub fn standard_z1000_axis() -> Vec<f64> {
    vec![
        8.0, 16.0, 24.0, 36.0, 75.0, 150.0, 300.0, 450.0, 600.0, 750.0, 900.0,
    ]
}

/// The published PGA calibration axis (g), 11 values.
pub fn standard_pga_axis() -> Vec<f64> {
    vec![0.001, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.75, 1.0, 1.25, 1.5]
}
