//! # Evaluation
//!
//! Fitness evaluation is the only embarrassingly parallel part of a
//! generation. The [`Evaluator`] owns the worker pool (when parallelism is
//! greater than one) and the policy applied to genomes whose objective fails.
//!
//! Evaluation is a barrier: [`Evaluator::evaluate`] returns only once every
//! individual it was handed carries a comparable fitness value.

use std::fmt;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::error::{GeneticError, Result};
use crate::genome::Genome;
use crate::individual::Individual;

/// What to do with an individual whose `evaluate` failed or returned NaN.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EvaluationPolicy {
    /// Assign `+inf`, the worst possible fitness under minimization.
    #[default]
    Worst,
    /// Assign the given fitness.
    Substitute(f64),
    /// Assign `+inf` and keep the individual out of parent selection.
    Exclude,
}

impl EvaluationPolicy {
    /// The fitness recorded for a failed individual.
    pub fn substitute_fitness(&self) -> f64 {
        match self {
            EvaluationPolicy::Substitute(value) => *value,
            EvaluationPolicy::Worst | EvaluationPolicy::Exclude => f64::INFINITY,
        }
    }

    pub fn excludes_failures(&self) -> bool {
        matches!(self, EvaluationPolicy::Exclude)
    }
}

/// A failed evaluation, kept for diagnosis.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationFailure {
    /// Id of the individual that failed.
    pub individual: u64,
    /// Population the individual belonged to when it was evaluated.
    pub population: usize,
    pub message: String,
}

impl fmt::Display for EvaluationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "individual {:016x} in population {}: {}",
            self.individual, self.population, self.message
        )
    }
}

/// Evaluates individuals, sequentially or on a dedicated rayon pool.
pub struct Evaluator {
    pool: Option<ThreadPool>,
    policy: EvaluationPolicy,
}

impl Evaluator {
    /// Creates an evaluator with `parallelism` workers.
    ///
    /// With a parallelism of one no pool is built and evaluation happens on the
    /// calling thread.
    pub fn new(parallelism: usize, policy: EvaluationPolicy) -> Result<Self> {
        if parallelism == 0 {
            return Err(GeneticError::Configuration(
                "Parallelism must be at least 1".to_string(),
            ));
        }

        let pool = if parallelism > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(parallelism)
                .thread_name(|i| format!("gaopt-worker-{}", i))
                .build()
                .map_err(|e| {
                    GeneticError::Configuration(format!("Failed to build worker pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { pool, policy })
    }

    /// A single-threaded evaluator.
    pub fn sequential(policy: EvaluationPolicy) -> Self {
        Self { pool: None, policy }
    }

    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    /// Number of workers evaluating concurrently.
    pub fn parallelism(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    /// Runs `op` on the worker pool, or inline without one.
    pub(crate) fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Evaluates every unevaluated individual in `individuals`.
    ///
    /// Individuals are updated in place, so their order is preserved whatever
    /// the worker count. Returns the failures of this pass in slice order.
    pub fn evaluate<G: Genome>(
        &self,
        individuals: &mut [Individual<G>],
        population: usize,
    ) -> Vec<EvaluationFailure> {
        let policy = self.policy;
        let failures: Vec<EvaluationFailure> = if self.pool.is_some() {
            self.install(|| {
                individuals
                    .par_iter_mut()
                    .filter_map(|individual| evaluate_one(individual, policy, population))
                    .collect()
            })
        } else {
            individuals
                .iter_mut()
                .filter_map(|individual| evaluate_one(individual, policy, population))
                .collect()
        };

        for failure in &failures {
            warn!(
                individual = failure.individual,
                population = failure.population,
                "evaluation failed: {}",
                failure.message
            );
        }

        failures
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("parallelism", &self.parallelism())
            .field("policy", &self.policy)
            .finish()
    }
}

fn evaluate_one<G: Genome>(
    individual: &mut Individual<G>,
    policy: EvaluationPolicy,
    population: usize,
) -> Option<EvaluationFailure> {
    if individual.is_evaluated() {
        return None;
    }
    individual
        .evaluate(policy)
        .err()
        .map(|err| EvaluationFailure {
            individual: individual.id(),
            population,
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomNumberGenerator;

    #[derive(Clone, Debug)]
    struct Value(f64);

    impl Genome for Value {
        fn evaluate(&self) -> Result<f64> {
            if self.0 < 0.0 {
                return Err(GeneticError::Evaluation("negative".to_string()));
            }
            Ok(self.0)
        }

        fn mutate(&mut self, _rng: &mut RandomNumberGenerator) {}

        fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
    }

    fn individuals(values: &[f64]) -> Vec<Individual<Value>> {
        let mut rng = RandomNumberGenerator::from_seed(5);
        values
            .iter()
            .map(|&v| Individual::new(Value(v), &mut rng))
            .collect()
    }

    #[test]
    fn test_zero_parallelism_is_rejected() {
        let result = Evaluator::new(0, EvaluationPolicy::Worst);
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_sequential_and_pooled_agree() {
        let values = [3.0, -1.0, 2.0, 0.5, -4.0, 9.0];

        let mut seq = individuals(&values);
        let seq_failures = Evaluator::sequential(EvaluationPolicy::Worst).evaluate(&mut seq, 0);

        let mut par = individuals(&values);
        let par_failures = Evaluator::new(3, EvaluationPolicy::Worst)
            .unwrap()
            .evaluate(&mut par, 0);

        let seq_fitness: Vec<f64> = seq.iter().map(|i| i.fitness()).collect();
        let par_fitness: Vec<f64> = par.iter().map(|i| i.fitness()).collect();
        assert_eq!(seq_fitness, par_fitness);
        assert_eq!(seq_failures, par_failures);
        assert_eq!(seq_failures.len(), 2);
        assert!(seq.iter().all(|i| i.is_evaluated()));
    }

    #[test]
    fn test_substitute_policy() {
        let mut inds = individuals(&[-1.0, 1.0]);
        let failures =
            Evaluator::sequential(EvaluationPolicy::Substitute(1e6)).evaluate(&mut inds, 2);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].population, 2);
        assert_eq!(inds[0].fitness(), 1e6);
        assert_eq!(inds[1].fitness(), 1.0);
    }

    #[test]
    fn test_already_evaluated_individuals_are_skipped() {
        let mut inds = individuals(&[-1.0]);
        let evaluator = Evaluator::sequential(EvaluationPolicy::Worst);

        assert_eq!(evaluator.evaluate(&mut inds, 0).len(), 1);
        assert!(evaluator.evaluate(&mut inds, 0).is_empty());
    }

    #[test]
    fn test_parallelism_reporting() {
        assert_eq!(Evaluator::sequential(EvaluationPolicy::Worst).parallelism(), 1);
        assert_eq!(
            Evaluator::new(2, EvaluationPolicy::Worst)
                .unwrap()
                .parallelism(),
            2
        );
    }
}
