//! # Breeding
//!
//! One generation of a single population (or species): parents are selected,
//! varied into offspring, the offspring are evaluated, and a [`Replacement`]
//! model decides who makes up the next generation.

mod variation;

pub use variation::VariationRates;

use tracing::trace;

use crate::error::{GeneticError, Result};
use crate::evaluation::{EvaluationFailure, Evaluator};
use crate::genome::Genome;
use crate::population::Population;
use crate::selection::SelectionStrategy;

/// How offspring replace the current generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Replacement {
    /// Keep the `elites` best individuals and fill the rest with offspring.
    Generational { elites: usize },
    /// Produce `offspring` children; they take the places of the worst
    /// individuals.
    SteadyState { offspring: usize },
    /// Produce `offspring` children, pool them with the parents and keep the
    /// best individuals up to the original size.
    DownToSize { offspring: usize },
    /// Every individual is mutated once, without selection or crossover.
    /// With `strict`, a mutant only takes its parent's place when it is
    /// fitter; otherwise it always does.
    MutationOnly { strict: bool },
}

impl Default for Replacement {
    fn default() -> Self {
        Replacement::Generational { elites: 0 }
    }
}

impl Replacement {
    /// Checks the model against the configured population size.
    pub fn validate(&self, population_size: usize) -> Result<()> {
        match *self {
            Replacement::Generational { elites } if elites >= population_size => {
                Err(GeneticError::Configuration(format!(
                    "Elite count ({}) must be smaller than the population size ({})",
                    elites, population_size
                )))
            }
            Replacement::SteadyState { offspring }
                if offspring == 0 || offspring > population_size =>
            {
                Err(GeneticError::Configuration(format!(
                    "Steady-state offspring count must be in 1..={}, got {}",
                    population_size, offspring
                )))
            }
            Replacement::DownToSize { offspring } if offspring == 0 => Err(
                GeneticError::Configuration("Down-to-size offspring count must be at least 1".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Number of offspring to produce for a group of `size` individuals.
    pub fn offspring_count(&self, size: usize) -> usize {
        match *self {
            Replacement::Generational { elites } => size.saturating_sub(elites),
            Replacement::SteadyState { offspring } => offspring.min(size),
            Replacement::DownToSize { offspring } => offspring,
            Replacement::MutationOnly { .. } => size,
        }
    }
}

/// Everything a generation step needs besides the population itself.
pub(crate) struct BreedingContext<'a> {
    pub selection: &'a dyn SelectionStrategy,
    pub replacement: Replacement,
    pub rates: VariationRates,
    pub evaluator: &'a Evaluator,
}

/// Replaces `population` with its next generation.
///
/// The population must be evaluated. On return it is evaluated and sorted
/// and has the same size as before. Evaluation failures among the offspring
/// are returned.
pub(crate) fn breed<G: Genome>(
    population: &mut Population<G>,
    ctx: &BreedingContext<'_>,
) -> Result<Vec<EvaluationFailure>> {
    if population.is_empty() {
        return Err(GeneticError::EmptyPopulation);
    }

    population.sort();
    let size = population.len();
    let count = ctx.replacement.offspring_count(size);
    if count == 0 {
        return Ok(Vec::new());
    }

    let id = population.id();
    let (individuals, rng) = population.parts_mut();
    let failures = match ctx.replacement {
        Replacement::MutationOnly { strict } => {
            let mut mutants = variation::mutate_each(individuals, ctx.evaluator, rng);
            let failures = ctx.evaluator.evaluate(&mut mutants, id);
            for (current, mutant) in individuals.iter_mut().zip(mutants) {
                if !strict || mutant.cmp_fitness(current).is_lt() {
                    *current = mutant;
                }
            }
            failures
        }
        Replacement::Generational { .. }
        | Replacement::SteadyState { .. }
        | Replacement::DownToSize { .. } => {
            let mut offspring = variation::produce_offspring(
                individuals,
                count,
                ctx.selection,
                ctx.rates,
                ctx.evaluator.policy(),
                ctx.evaluator,
                rng,
            )?;
            let failures = ctx.evaluator.evaluate(&mut offspring, id);
            if !matches!(ctx.replacement, Replacement::DownToSize { .. }) {
                individuals.truncate(size - count);
            }
            individuals.extend(offspring);
            failures
        }
    };

    population.sort();
    population.individuals_mut().truncate(size);

    trace!(
        population = id,
        species = ?population.species(),
        offspring = count,
        failures = failures.len(),
        "bred generation"
    );

    Ok(failures)
}
