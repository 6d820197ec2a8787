use serde::{Deserialize, Serialize};

/// Documented out-of-calibration-range conditions for a site descriptor
/// triple. Flags are advisory: queries outside the calibrated range still
/// produce an answer (boundary-clamped extrapolation), the flags only tell
/// the caller to treat it as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeFlag {
    /// Vs30 outside [175, 950] m/s (code 1)
    Vs30OutOfRange,
    /// z1000 outside [8, 900] m (code 2)
    Z1000OutOfRange,
    /// PGA outside [0.001, 1.5] g (code 3)
    PgaOutOfRange,
    /// Vs30/z1000 combination outside the calibrated set of stiff-site
    /// profiles (code 4)
    Vs30Z1000Combination,
}

impl RangeFlag {
    /// Numeric code used in the historical calibration reports.
    pub fn code(self) -> u8 {
        match self {
            RangeFlag::Vs30OutOfRange => 1,
            RangeFlag::Z1000OutOfRange => 2,
            RangeFlag::PgaOutOfRange => 3,
            RangeFlag::Vs30Z1000Combination => 4,
        }
    }
}

/// Precomputed phase-shift model variant to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMethod {
    /// Phase derived from the harmonic-to-harmonic transfer function
    EqHh,
    /// Phase derived from the Kausel-Zilotti formulation
    EqKz,
}

/// An ordered sequence of `(frequency, value)` pairs. Produced once per site
/// factor query and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySpectrum {
    points: Vec<(f64, f64)>,
}

impl FrequencySpectrum {
    pub(crate) fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// The `(frequency, value)` pairs, in frequency order.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Frequencies only, in order.
    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|&(f, _)| f).collect()
    }

    /// Values only, in frequency order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
