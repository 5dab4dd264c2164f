//! # EvolutionOptions
//!
//! The `EvolutionOptions` struct holds the plain-data configuration of a run:
//! population layout, stop limits, variation rates, replacement model,
//! hall-of-fame size, worker count, seed and evaluation-failure policy.
//!
//! ## Example
//!
//! ```rust
//! use gaopt::breeding::Replacement;
//! use gaopt::evolution::options::EvolutionOptions;
//!
//! // Defaults: 2 populations of 50, 50 generations, mutation 0.5, crossover 0.7
//! let default_options = EvolutionOptions::default();
//! assert!(default_options.validate().is_ok());
//!
//! let options = EvolutionOptions::builder()
//!     .population_count(1)
//!     .population_size(20)
//!     .generation_limit(100)
//!     .mutation_rate(0.1)
//!     .replacement(Replacement::Generational { elites: 1 })
//!     .seed(42)
//!     .build();
//!
//! assert_eq!(options.get_population_size(), 20);
//! assert_eq!(options.get_seed(), Some(42));
//! ```
//!
//! ## Defaults
//!
//! | option                | default                         |
//! |-----------------------|---------------------------------|
//! | `population_count`    | 2                               |
//! | `population_size`     | 50                              |
//! | `generation_limit`    | 50                              |
//! | `time_limit`          | none                            |
//! | `mutation_rate`       | 0.5                             |
//! | `crossover_rate`      | 0.7                             |
//! | `replacement`         | `Generational { elites: 0 }`    |
//! | `hof_size`            | 1                               |
//! | `parallelism`         | available hardware parallelism  |
//! | `seed`                | none (entropy)                  |
//! | `evaluation_policy`   | `Worst`                         |
//! | `migration_frequency` | 0 (never)                       |

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::breeding::Replacement;
use crate::error::{GeneticError, Result};
use crate::evaluation::EvaluationPolicy;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOptions {
    population_count: usize,
    population_size: usize,
    generation_limit: usize,
    time_limit: Option<Duration>,
    mutation_rate: f64,
    crossover_rate: f64,
    replacement: Replacement,
    hof_size: usize,
    /// Number of worker threads used for evaluation and variation
    parallelism: usize,
    seed: Option<u64>,
    evaluation_policy: EvaluationPolicy,
    /// Migrate every this many generations; 0 disables migration
    migration_frequency: usize,
}

impl EvolutionOptions {
    /// Returns a builder for creating an `EvolutionOptions` instance.
    ///
    /// This provides a more flexible way to configure evolution options
    /// with a fluent interface. Unset fields keep their defaults.
    pub fn builder() -> EvolutionOptionsBuilder {
        EvolutionOptionsBuilder::default()
    }

    /// Checks every field for consistency.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for zero sizes or limits, rates outside
    /// `[0, 1]`, a zero hall-of-fame size or worker count, or a replacement
    /// model that does not fit the population size.
    pub fn validate(&self) -> Result<()> {
        if self.population_count == 0 {
            return Err(GeneticError::Configuration(
                "Population count cannot be zero".to_string(),
            ));
        }
        if self.population_size == 0 {
            return Err(GeneticError::Configuration(
                "Population size cannot be zero".to_string(),
            ));
        }
        if self.generation_limit == 0 {
            return Err(GeneticError::Configuration(
                "Generation limit cannot be zero".to_string(),
            ));
        }
        if matches!(self.time_limit, Some(limit) if limit.is_zero()) {
            return Err(GeneticError::Configuration(
                "Time limit cannot be zero".to_string(),
            ));
        }
        for (name, rate) in [
            ("Mutation rate", self.mutation_rate),
            ("Crossover rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(GeneticError::Configuration(format!(
                    "{} must be in [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.hof_size == 0 {
            return Err(GeneticError::Configuration(
                "Hall of fame size cannot be zero".to_string(),
            ));
        }
        if self.parallelism == 0 {
            return Err(GeneticError::Configuration(
                "Parallelism must be at least 1".to_string(),
            ));
        }
        if let EvaluationPolicy::Substitute(value) = self.evaluation_policy {
            if value.is_nan() {
                return Err(GeneticError::Configuration(
                    "Substitute fitness cannot be NaN".to_string(),
                ));
            }
        }
        self.replacement.validate(self.population_size)
    }

    pub fn get_population_count(&self) -> usize {
        self.population_count
    }

    pub fn get_population_size(&self) -> usize {
        self.population_size
    }

    pub fn get_generation_limit(&self) -> usize {
        self.generation_limit
    }

    pub fn get_time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn get_mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    pub fn get_crossover_rate(&self) -> f64 {
        self.crossover_rate
    }

    pub fn get_replacement(&self) -> Replacement {
        self.replacement
    }

    pub fn get_hof_size(&self) -> usize {
        self.hof_size
    }

    pub fn get_parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn get_evaluation_policy(&self) -> EvaluationPolicy {
        self.evaluation_policy
    }

    pub fn get_migration_frequency(&self) -> usize {
        self.migration_frequency
    }

    pub fn set_population_count(&mut self, population_count: usize) {
        self.population_count = population_count;
    }

    pub fn set_population_size(&mut self, population_size: usize) {
        self.population_size = population_size;
    }

    pub fn set_generation_limit(&mut self, generation_limit: usize) {
        self.generation_limit = generation_limit;
    }

    pub fn set_time_limit(&mut self, time_limit: Option<Duration>) {
        self.time_limit = time_limit;
    }

    pub fn set_mutation_rate(&mut self, mutation_rate: f64) {
        self.mutation_rate = mutation_rate;
    }

    pub fn set_crossover_rate(&mut self, crossover_rate: f64) {
        self.crossover_rate = crossover_rate;
    }

    pub fn set_replacement(&mut self, replacement: Replacement) {
        self.replacement = replacement;
    }

    pub fn set_hof_size(&mut self, hof_size: usize) {
        self.hof_size = hof_size;
    }

    pub fn set_parallelism(&mut self, parallelism: usize) {
        self.parallelism = parallelism;
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    pub fn set_evaluation_policy(&mut self, evaluation_policy: EvaluationPolicy) {
        self.evaluation_policy = evaluation_policy;
    }

    pub fn set_migration_frequency(&mut self, migration_frequency: usize) {
        self.migration_frequency = migration_frequency;
    }
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        Self {
            population_count: 2,
            population_size: 50,
            generation_limit: 50,
            time_limit: None,
            mutation_rate: 0.5,
            crossover_rate: 0.7,
            replacement: Replacement::default(),
            hof_size: 1,
            parallelism: default_parallelism(),
            seed: None,
            evaluation_policy: EvaluationPolicy::default(),
            migration_frequency: 0,
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Builder for `EvolutionOptions`.
///
/// Provides a fluent interface for constructing `EvolutionOptions` instances.
#[derive(Debug, Clone, Default)]
pub struct EvolutionOptionsBuilder {
    options: EvolutionOptions,
}

impl EvolutionOptionsBuilder {
    pub fn population_count(mut self, population_count: usize) -> Self {
        self.options.population_count = population_count;
        self
    }

    pub fn population_size(mut self, population_size: usize) -> Self {
        self.options.population_size = population_size;
        self
    }

    pub fn generation_limit(mut self, generation_limit: usize) -> Self {
        self.options.generation_limit = generation_limit;
        self
    }

    pub fn time_limit(mut self, time_limit: Duration) -> Self {
        self.options.time_limit = Some(time_limit);
        self
    }

    pub fn mutation_rate(mut self, mutation_rate: f64) -> Self {
        self.options.mutation_rate = mutation_rate;
        self
    }

    pub fn crossover_rate(mut self, crossover_rate: f64) -> Self {
        self.options.crossover_rate = crossover_rate;
        self
    }

    pub fn replacement(mut self, replacement: Replacement) -> Self {
        self.options.replacement = replacement;
        self
    }

    pub fn hof_size(mut self, hof_size: usize) -> Self {
        self.options.hof_size = hof_size;
        self
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.options.parallelism = parallelism;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    pub fn evaluation_policy(mut self, evaluation_policy: EvaluationPolicy) -> Self {
        self.options.evaluation_policy = evaluation_policy;
        self
    }

    pub fn migration_frequency(mut self, migration_frequency: usize) -> Self {
        self.options.migration_frequency = migration_frequency;
        self
    }

    /// Builds the options. Validation happens when the engine initializes.
    pub fn build(self) -> EvolutionOptions {
        self.options
    }
}
