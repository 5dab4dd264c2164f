//! Read-only views of a run handed to callbacks and stop predicates.

use std::time::Duration;

use crate::evaluation::EvaluationFailure;
use crate::genome::Genome;
use crate::individual::Individual;
use crate::population::{Population, PopulationStats};

/// The state of a run at a generation boundary.
#[derive(Debug)]
pub struct Snapshot<'a, G: Genome> {
    /// Completed generations; 0 right after initialization.
    pub generation: usize,
    /// Wall-clock time since initialization.
    pub age: Duration,
    /// Best individual ever seen.
    pub best: Option<&'a Individual<G>>,
    pub hall_of_fame: &'a [Individual<G>],
    pub populations: &'a [Population<G>],
    /// Evaluation failures recorded during the last generation.
    pub failures: &'a [EvaluationFailure],
}

impl<G: Genome> Snapshot<'_, G> {
    /// Fitness of the best individual ever seen.
    pub fn best_fitness(&self) -> Option<f64> {
        self.best.map(|b| b.fitness())
    }

    /// A plain-data summary, independent of the genome type.
    pub fn report(&self) -> GenerationReport {
        GenerationReport {
            generation: self.generation,
            age: self.age,
            best_fitness: self.best_fitness(),
            hall_of_fame: self.hall_of_fame.iter().map(|i| i.fitness()).collect(),
            populations: self.populations.iter().filter_map(|p| p.stats()).collect(),
            failures: self.failures.to_vec(),
        }
    }
}

/// Summary of one generation, suitable for progress logs.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub age: Duration,
    pub best_fitness: Option<f64>,
    /// Hall-of-fame fitness values, best first.
    pub hall_of_fame: Vec<f64>,
    /// Fitness statistics per population.
    pub populations: Vec<PopulationStats>,
    pub failures: Vec<EvaluationFailure>,
}
