use std::fmt::Debug;

use crate::error::Result;
use crate::rng::RandomNumberGenerator;

/// Trait for parent selection strategies.
///
/// A strategy looks only at fitness values (lower is better) and returns the
/// positions of the chosen parents in the order they were drawn. Working on
/// positions keeps strategies independent of the genome type and object safe,
/// so the engine can hold any of them behind an `Arc<dyn SelectionStrategy>`.
///
/// # Examples
///
/// ```
/// use gaopt::rng::RandomNumberGenerator;
/// use gaopt::selection::{SelectionStrategy, TournamentSelection};
///
/// let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
/// let mut rng = RandomNumberGenerator::from_seed(42);
///
/// let selection = TournamentSelection::default();
/// let parents = selection.select(&fitness, 4, &mut rng).unwrap();
///
/// assert_eq!(parents.len(), 4);
/// assert!(parents.iter().all(|&i| i < fitness.len()));
/// ```
pub trait SelectionStrategy: Debug + Send + Sync {
    /// Selects `num_to_select` positions from `fitness`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `fitness` is empty (`EmptyPopulation`)
    /// - the strategy cannot draw enough individuals from a population this
    ///   small without sampling with replacement, and replacement is disabled
    ///   (`Operator`)
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>>;

    /// Checks the strategy against the population size before a run starts.
    ///
    /// The default accepts every size.
    fn validate(&self, _population_size: usize) -> Result<()> {
        Ok(())
    }

    /// Whether `select` can draw `num_to_select` positions from a group of
    /// `population_size` without failing.
    ///
    /// Breeding asks this for every species and for the eligible part of a
    /// population, which can both be smaller than the configured size.
    fn supports(&self, population_size: usize, _num_to_select: usize) -> bool {
        population_size > 0
    }
}
