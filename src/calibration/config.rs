use anyhow::{Context, Result};
use serde::Deserialize;

/// Crossover probability for the genetic backend. Fixed; tuning it buys
/// little for this problem.
pub const CROSSOVER_PROB: f64 = 0.8;

/// Mutation probability for the genetic backend. Fixed, like
/// [`CROSSOVER_PROB`].
pub const MUTATION_PROB: f64 = 0.8;

/// Which global optimizer backend runs the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerBackend {
    /// Continuous differential-evolution search (rand/1/bin)
    DifferentialEvolution,
    /// Genetic algorithm with simulated binary crossover and polynomial
    /// mutation (crowding degree `eta`)
    Genetic,
}

/// Main configuration struct for the damping-curve fit.
///
/// All fields have serde defaults, so a partial TOML table deserializes into
/// a fully usable configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationConfig {
    /// Optimizer backend to run
    #[serde(default = "default_backend")]
    pub backend: OptimizerBackend,

    /// Number of individuals per generation
    #[serde(default = "default_pop_size")]
    pub pop_size: usize,

    /// Number of generations the search lasts
    #[serde(default = "default_n_gen")]
    pub n_gen: usize,

    /// 10-based power of the lower bound shared by all searched parameters
    #[serde(default = "default_lower_bound_power")]
    pub lower_bound_power: f64,

    /// 10-based power of the upper bound shared by all searched parameters
    #[serde(default = "default_upper_bound_power")]
    pub upper_bound_power: f64,

    /// Crowding degree of the genetic operators. High eta produces children
    /// close to their parents; low eta explores more aggressively.
    #[serde(default = "default_eta")]
    pub eta: f64,

    /// Seed for the pseudo-random source; fixes the search path exactly
    #[serde(default)]
    pub seed: u64,

    /// Fan one generation's objective evaluations across worker threads
    #[serde(default)]
    pub parallel: bool,

    /// Verbosity level (0=silent, 1=per-generation loss statistics)
    #[serde(default)]
    pub verbosity: u8,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            pop_size: default_pop_size(),
            n_gen: default_n_gen(),
            lower_bound_power: default_lower_bound_power(),
            upper_bound_power: default_upper_bound_power(),
            eta: default_eta(),
            seed: 0,
            parallel: false,
            verbosity: 0,
        }
    }
}

impl OptimizationConfig {
    /// Fast configuration for development and testing.
    pub fn fast() -> Self {
        Self {
            pop_size: 100,
            n_gen: 40,
            ..Self::default()
        }
    }

    /// High-effort configuration for final production fits.
    pub fn thorough() -> Self {
        Self {
            pop_size: 1200,
            n_gen: 200,
            ..Self::default()
        }
    }

    /// Minimal configuration for quick validation and unit tests.
    pub fn minimal() -> Self {
        Self {
            pop_size: 30,
            n_gen: 15,
            ..Self::default()
        }
    }

    /// Parse a configuration from a TOML document. Missing keys fall back to
    /// the field defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse optimization config TOML")
    }

    /// The `(lower, upper)` log10 bound pair shared by every searched
    /// parameter.
    pub fn bound_powers(&self) -> (f64, f64) {
        (self.lower_bound_power, self.upper_bound_power)
    }
}

fn default_backend() -> OptimizerBackend {
    OptimizerBackend::DifferentialEvolution
}

fn default_pop_size() -> usize {
    800
}

fn default_n_gen() -> usize {
    100
}

fn default_lower_bound_power() -> f64 {
    -4.0
}

fn default_upper_bound_power() -> f64 {
    6.0
}

fn default_eta() -> f64 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizationConfig::default();
        assert_eq!(config.backend, OptimizerBackend::DifferentialEvolution);
        assert_eq!(config.pop_size, 800);
        assert_eq!(config.n_gen, 100);
        assert_eq!(config.bound_powers(), (-4.0, 6.0));
        assert!(!config.parallel);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = OptimizationConfig::from_toml_str(
            r#"
            backend = "genetic"
            pop_size = 250
            seed = 42
            parallel = true
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, OptimizerBackend::Genetic);
        assert_eq!(config.pop_size, 250);
        assert_eq!(config.seed, 42);
        assert!(config.parallel);
        // Unspecified keys keep their defaults.
        assert_eq!(config.n_gen, 100);
        assert_eq!(config.eta, 0.1);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(OptimizationConfig::from_toml_str("pop_size = \"many\"").is_err());
        assert!(OptimizationConfig::from_toml_str("backend = \"annealing\"").is_err());
    }
}
