//! # Speciation
//!
//! A speciator partitions one population into disjoint, non-empty species
//! that breed separately for one generation and are merged back afterwards.
//! Keeping dissimilar individuals apart protects niches that would otherwise
//! be crowded out by the current best region of the search space.
//!
//! Two strategies are provided:
//!
//! - [`KMedoids`] clusters individuals with a caller-supplied distance metric.
//! - [`FitnessInterval`] cuts the fitness ranking into contiguous bands.

pub mod fitness_interval;
pub mod kmedoids;

pub use fitness_interval::FitnessInterval;
pub use kmedoids::KMedoids;

use std::fmt::Debug;

use crate::error::Result;
use crate::genome::Genome;
use crate::individual::Individual;
use crate::population::Population;
use crate::rng::RandomNumberGenerator;

/// Trait for speciation strategies.
pub trait Speciator<G: Genome>: Debug + Send + Sync {
    /// Checks the strategy against the population size before a run starts.
    fn validate(&self, population_size: usize) -> Result<()>;

    /// Groups positions of `individuals` into species.
    ///
    /// The groups must be non-empty, pairwise disjoint and cover every
    /// position exactly once.
    fn partition(
        &self,
        individuals: &[Individual<G>],
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<Vec<usize>>>;

    /// Splits `population` into species, leaving it empty until the species
    /// are merged back with [`Population::merge`].
    fn apply(&self, population: &mut Population<G>) -> Result<Vec<Population<G>>> {
        let groups = {
            let (individuals, rng) = population.parts_mut();
            self.partition(individuals, rng)?
        };
        Ok(population.split(&groups))
    }
}
