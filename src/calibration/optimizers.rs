//! Global optimizer backends
//!
//! Two interchangeable population-based minimizers over a bounded real
//! vector space, both behind the [`GlobalOptimizer`] trait: a classic
//! differential evolution (rand/1/bin) and a genetic algorithm with
//! simulated binary crossover and polynomial mutation.
//!
//! Reproducibility contract: every random draw happens on the coordinating
//! thread, in a fixed order, *before* a generation is evaluated. Evaluation
//! itself is a pure map (optionally fanned out with rayon, order-preserving),
//! so a fixed seed produces bit-identical results whether or not parallel
//! evaluation is enabled.

use crate::calibration::config::{OptimizationConfig, CROSSOVER_PROB, MUTATION_PROB};
use crate::calibration::types::GlobalOptimizer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Differential weight (F) for the DE mutant vector.
const DE_WEIGHT: f64 = 0.8;
/// Binomial crossover rate (CR) for DE.
const DE_CROSSOVER: f64 = 0.9;
/// Tournament size for GA parent selection.
const TOURNAMENT_SIZE: usize = 3;

/// Evaluate every candidate of one generation, optionally across workers.
/// The objective is pure, so evaluation order never affects the result.
fn evaluate_population(
    objective: &(dyn Fn(&[f64]) -> f64 + Sync),
    population: &[Vec<f64>],
    parallel: bool,
) -> Vec<f64> {
    if parallel {
        population.par_iter().map(|x| objective(x)).collect()
    } else {
        population.iter().map(|x| objective(x)).collect()
    }
}

/// NaN-safe strict comparison: a non-finite candidate loses against any
/// finite one and never beats anything.
fn better(a: f64, b: f64) -> bool {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a < b,
        (true, false) => true,
        _ => false,
    }
}

fn random_vector(rng: &mut StdRng, bounds: &[(f64, f64)]) -> Vec<f64> {
    bounds
        .iter()
        .map(|&(lo, hi)| lo + rng.gen::<f64>() * (hi - lo))
        .collect()
}

fn best_of(fitness: &[f64]) -> usize {
    let mut best = 0;
    for i in 1..fitness.len() {
        if better(fitness[i], fitness[best]) {
            best = i;
        }
    }
    best
}

fn log_generation(name: &str, gen: usize, fitness: &[f64]) {
    let best = fitness[best_of(fitness)];
    let finite: Vec<f64> = fitness.iter().copied().filter(|f| f.is_finite()).collect();
    let mean = if finite.is_empty() {
        f64::NAN
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };
    println!("[{}] gen {:>4}: min = {:.6e}, mean = {:.6e}", name, gen, best, mean);
}

/// Construct the backend selected by the configuration.
pub fn select_backend(
    backend: crate::calibration::config::OptimizerBackend,
) -> Box<dyn GlobalOptimizer> {
    use crate::calibration::config::OptimizerBackend;
    match backend {
        OptimizerBackend::DifferentialEvolution => Box::new(DifferentialEvolution),
        OptimizerBackend::Genetic => Box::new(GeneticAlgorithm),
    }
}

// ================================================================================================
// Differential evolution
// ================================================================================================

/// Continuous global minimizer in the differential-evolution family
/// (rand/1/bin strategy, bound clamping).
pub struct DifferentialEvolution;

impl DifferentialEvolution {
    fn pick_three_distinct(rng: &mut StdRng, np: usize, exclude: usize) -> (usize, usize, usize) {
        let mut draw = |taken: &[usize]| loop {
            let r = rng.gen_range(0..np);
            if r != exclude && !taken.contains(&r) {
                return r;
            }
        };
        let r1 = draw(&[]);
        let r2 = draw(&[r1]);
        let r3 = draw(&[r1, r2]);
        (r1, r2, r3)
    }
}

impl GlobalOptimizer for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential_evolution"
    }

    fn minimize(
        &self,
        objective: &(dyn Fn(&[f64]) -> f64 + Sync),
        bounds: &[(f64, f64)],
        config: &OptimizationConfig,
    ) -> (f64, Vec<f64>) {
        let dim = bounds.len();
        let np = config.pop_size.max(4); // rand/1 needs three distinct partners
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut population: Vec<Vec<f64>> =
            (0..np).map(|_| random_vector(&mut rng, bounds)).collect();
        let mut fitness = evaluate_population(objective, &population, config.parallel);

        for gen in 0..config.n_gen {
            // All trial vectors are drawn up front; evaluation follows as one
            // pure batch (map-then-barrier).
            let mut trials = Vec::with_capacity(np);
            for i in 0..np {
                let (r1, r2, r3) = Self::pick_three_distinct(&mut rng, np, i);
                let j_rand = rng.gen_range(0..dim);
                let mut trial = population[i].clone();
                for j in 0..dim {
                    if j == j_rand || rng.gen::<f64>() < DE_CROSSOVER {
                        let v = population[r1][j]
                            + DE_WEIGHT * (population[r2][j] - population[r3][j]);
                        trial[j] = v.clamp(bounds[j].0, bounds[j].1);
                    }
                }
                trials.push(trial);
            }

            let trial_fitness = evaluate_population(objective, &trials, config.parallel);
            for i in 0..np {
                if better(trial_fitness[i], fitness[i]) {
                    population[i] = std::mem::take(&mut trials[i]);
                    fitness[i] = trial_fitness[i];
                }
            }

            if config.verbosity > 0 {
                log_generation(self.name(), gen, &fitness);
            }
        }

        let best = best_of(&fitness);
        (fitness[best], population[best].clone())
    }
}

// ================================================================================================
// Genetic algorithm
// ================================================================================================

/// Population-based genetic algorithm: tournament selection, bounded
/// simulated binary crossover and bounded polynomial mutation, both governed
/// by the crowding degree `eta`, with elitist best tracking.
pub struct GeneticAlgorithm;

impl GeneticAlgorithm {
    /// Bounded simulated binary crossover on one parent pair, in place.
    fn sbx_crossover(
        a: &mut [f64],
        b: &mut [f64],
        bounds: &[(f64, f64)],
        eta: f64,
        rng: &mut StdRng,
    ) {
        for j in 0..a.len() {
            if rng.gen::<f64>() > 0.5 {
                continue;
            }
            if (a[j] - b[j]).abs() <= 1e-14 {
                continue;
            }
            let (xl, xu) = bounds[j];
            let x1 = a[j].min(b[j]);
            let x2 = a[j].max(b[j]);
            let u = rng.gen::<f64>();
            let exp = 1.0 / (eta + 1.0);

            let spread = |beta: f64| -> f64 {
                let alpha = 2.0 - beta.powf(-(eta + 1.0));
                if u <= 1.0 / alpha {
                    (u * alpha).powf(exp)
                } else {
                    (1.0 / (2.0 - u * alpha)).powf(exp)
                }
            };

            let beta_lo = 1.0 + 2.0 * (x1 - xl) / (x2 - x1);
            let c1 = 0.5 * (x1 + x2 - spread(beta_lo) * (x2 - x1));
            let beta_hi = 1.0 + 2.0 * (xu - x2) / (x2 - x1);
            let c2 = 0.5 * (x1 + x2 + spread(beta_hi) * (x2 - x1));

            let c1 = c1.clamp(xl, xu);
            let c2 = c2.clamp(xl, xu);
            if rng.gen::<f64>() <= 0.5 {
                a[j] = c2;
                b[j] = c1;
            } else {
                a[j] = c1;
                b[j] = c2;
            }
        }
    }

    /// Bounded polynomial mutation, in place, with per-gene probability
    /// `indpb`.
    fn polynomial_mutation(
        x: &mut [f64],
        bounds: &[(f64, f64)],
        eta: f64,
        indpb: f64,
        rng: &mut StdRng,
    ) {
        for j in 0..x.len() {
            if rng.gen::<f64>() > indpb {
                continue;
            }
            let (xl, xu) = bounds[j];
            if xu <= xl {
                continue;
            }
            let delta_1 = (x[j] - xl) / (xu - xl);
            let delta_2 = (xu - x[j]) / (xu - xl);
            let u = rng.gen::<f64>();
            let mut_pow = 1.0 / (eta + 1.0);

            let delta_q = if u < 0.5 {
                let xy = 1.0 - delta_1;
                let val = 2.0 * u + (1.0 - 2.0 * u) * xy.powf(eta + 1.0);
                val.powf(mut_pow) - 1.0
            } else {
                let xy = 1.0 - delta_2;
                let val = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * xy.powf(eta + 1.0);
                1.0 - val.powf(mut_pow)
            };

            x[j] = (x[j] + delta_q * (xu - xl)).clamp(xl, xu);
        }
    }
}

impl GlobalOptimizer for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn minimize(
        &self,
        objective: &(dyn Fn(&[f64]) -> f64 + Sync),
        bounds: &[(f64, f64)],
        config: &OptimizationConfig,
    ) -> (f64, Vec<f64>) {
        let dim = bounds.len();
        let np = config.pop_size.max(4);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut population: Vec<Vec<f64>> =
            (0..np).map(|_| random_vector(&mut rng, bounds)).collect();
        let mut fitness = evaluate_population(objective, &population, config.parallel);

        let mut best_idx = best_of(&fitness);
        let mut best_fit = fitness[best_idx];
        let mut best_vec = population[best_idx].clone();

        for gen in 0..config.n_gen {
            // Tournament selection onto a full offspring pool.
            let mut offspring: Vec<Vec<f64>> = (0..np)
                .map(|_| {
                    let mut winner = rng.gen_range(0..np);
                    for _ in 1..TOURNAMENT_SIZE {
                        let challenger = rng.gen_range(0..np);
                        if better(fitness[challenger], fitness[winner]) {
                            winner = challenger;
                        }
                    }
                    population[winner].clone()
                })
                .collect();

            // Variation: pairwise crossover, then mutation.
            for pair in offspring.chunks_mut(2) {
                if let [a, b] = pair {
                    if rng.gen::<f64>() <= CROSSOVER_PROB {
                        Self::sbx_crossover(a, b, bounds, config.eta, &mut rng);
                    }
                }
            }
            let indpb = 1.0 / dim as f64;
            for individual in offspring.iter_mut() {
                if rng.gen::<f64>() <= MUTATION_PROB {
                    Self::polynomial_mutation(individual, bounds, config.eta, indpb, &mut rng);
                }
            }

            fitness = evaluate_population(objective, &offspring, config.parallel);
            population = offspring;

            best_idx = best_of(&fitness);
            if better(fitness[best_idx], best_fit) {
                best_fit = fitness[best_idx];
                best_vec = population[best_idx].clone();
            }

            if config.verbosity > 0 {
                log_generation(self.name(), gen, &fitness);
            }
        }

        (best_fit, best_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::config::OptimizerBackend;

    fn sphere(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn test_config(backend: OptimizerBackend) -> OptimizationConfig {
        OptimizationConfig {
            backend,
            pop_size: 60,
            n_gen: 80,
            lower_bound_power: -4.0,
            upper_bound_power: 6.0,
            eta: 0.1,
            seed: 7,
            parallel: false,
            verbosity: 0,
        }
    }

    #[test]
    fn test_de_minimizes_sphere() {
        let config = test_config(OptimizerBackend::DifferentialEvolution);
        let bounds = [(-4.0, 6.0); 3];
        let (obj, x) = DifferentialEvolution.minimize(&sphere, &bounds, &config);
        assert!(obj < 1e-3, "DE best objective too large: {}", obj);
        assert_eq!(x.len(), 3);
    }

    #[test]
    fn test_ga_minimizes_sphere() {
        let config = test_config(OptimizerBackend::Genetic);
        let bounds = [(-4.0, 6.0); 3];
        let (obj, x) = GeneticAlgorithm.minimize(&sphere, &bounds, &config);
        assert!(obj < 0.5, "GA best objective too large: {}", obj);
        assert_eq!(x.len(), 3);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = test_config(OptimizerBackend::DifferentialEvolution);
        let bounds = [(-4.0, 6.0); 3];
        let (obj_a, x_a) = DifferentialEvolution.minimize(&sphere, &bounds, &config);
        let (obj_b, x_b) = DifferentialEvolution.minimize(&sphere, &bounds, &config);
        assert_eq!(obj_a, obj_b);
        assert_eq!(x_a, x_b);
    }

    #[test]
    fn test_parallel_flag_does_not_change_result() {
        // The objective is pure and all randomness is drawn before each
        // evaluation batch, so parallel evaluation must be bit-identical.
        for backend in [
            OptimizerBackend::DifferentialEvolution,
            OptimizerBackend::Genetic,
        ] {
            let serial_cfg = test_config(backend);
            let parallel_cfg = OptimizationConfig {
                parallel: true,
                ..serial_cfg.clone()
            };
            let bounds = [(-4.0, 6.0); 3];
            let opt = select_backend(backend);
            let (obj_s, x_s) = opt.minimize(&sphere, &bounds, &serial_cfg);
            let (obj_p, x_p) = opt.minimize(&sphere, &bounds, &parallel_cfg);
            assert_eq!(obj_s, obj_p);
            assert_eq!(x_s, x_p);
        }
    }

    #[test]
    fn test_non_finite_objective_never_wins() {
        // A region of the space returns NaN; the optimizer must still return
        // a finite best candidate.
        let nan_hole = |x: &[f64]| {
            if x[0] > 0.0 {
                f64::NAN
            } else {
                x.iter().map(|v| v * v).sum::<f64>() + 1.0
            }
        };
        let config = OptimizationConfig {
            pop_size: 40,
            n_gen: 30,
            ..test_config(OptimizerBackend::DifferentialEvolution)
        };
        let bounds = [(-4.0, 6.0); 2];
        let (obj, _) = DifferentialEvolution.minimize(&nan_hole, &bounds, &config);
        assert!(obj.is_finite());
    }
}
