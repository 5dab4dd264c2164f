//! # Migration
//!
//! Migration exchanges individuals between the populations of a multi-population
//! run so that good genetic material found in one island can spread to the
//! others. The engine calls the configured [`Migrator`] every
//! `migration_frequency` generations, after breeding.

use std::fmt::Debug;

use rand::seq::index;
use tracing::trace;

use crate::error::{GeneticError, Result};
use crate::genome::Genome;
use crate::population::Population;
use crate::rng::RandomNumberGenerator;

/// Trait for migration strategies.
pub trait Migrator<G: Genome>: Debug + Send + Sync {
    /// Checks the strategy against the population size before a run starts.
    fn validate(&self, _population_size: usize) -> Result<()> {
        Ok(())
    }

    /// Moves individuals between `populations` in place.
    ///
    /// Population sizes must be unchanged afterwards.
    fn migrate(
        &self,
        populations: &mut [Population<G>],
        rng: &mut RandomNumberGenerator,
    ) -> Result<()>;
}

/// Ring migration.
///
/// For every pair of consecutive populations `(i, i + 1)`, `migrants`
/// distinct positions are drawn and the individuals at those positions are
/// swapped between the two populations. Pairs are visited in order, so
/// migrants can travel several hops in one call.
///
/// The ring is open: the last population is not linked back to the first.
/// Members of the last population only reach the first one through the
/// populations in between, over several migrations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RingMigration {
    migrants: usize,
}

impl RingMigration {
    /// # Errors
    ///
    /// Returns a `Configuration` error if `migrants` is 0.
    pub fn new(migrants: usize) -> Result<Self> {
        if migrants == 0 {
            return Err(GeneticError::Configuration(
                "Ring migration needs at least one migrant".to_string(),
            ));
        }
        Ok(Self { migrants })
    }

    pub fn migrants(&self) -> usize {
        self.migrants
    }
}

impl<G: Genome> Migrator<G> for RingMigration {
    fn validate(&self, population_size: usize) -> Result<()> {
        if self.migrants > population_size {
            return Err(GeneticError::Configuration(format!(
                "Migrant count ({}) exceeds the population size ({})",
                self.migrants, population_size
            )));
        }
        Ok(())
    }

    fn migrate(
        &self,
        populations: &mut [Population<G>],
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        for i in 1..populations.len() {
            let (left, right) = populations.split_at_mut(i);
            let from = &mut left[i - 1];
            let to = &mut right[0];

            let shared = from.len().min(to.len());
            if self.migrants > shared {
                return Err(GeneticError::Operator(format!(
                    "Cannot move {} migrants between populations of {} and {}",
                    self.migrants,
                    from.len(),
                    to.len()
                )));
            }

            for k in index::sample(rng, shared, self.migrants) {
                std::mem::swap(
                    &mut from.individuals_mut()[k],
                    &mut to.individuals_mut()[k],
                );
            }

            trace!(
                from = from.id(),
                to = to.id(),
                migrants = self.migrants,
                "migrated individuals"
            );
        }

        for population in populations.iter_mut() {
            population.sort();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{EvaluationPolicy, Evaluator};
    use crate::individual::Individual;
    use std::collections::HashSet;

    #[derive(Clone, Debug)]
    struct Tag(f64);

    impl Genome for Tag {
        fn evaluate(&self) -> Result<f64> {
            Ok(self.0)
        }

        fn mutate(&mut self, _rng: &mut RandomNumberGenerator) {}

        fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
    }

    fn populations(count: usize, size: usize) -> Vec<Population<Tag>> {
        let mut rng = RandomNumberGenerator::from_seed(17);
        let evaluator = Evaluator::sequential(EvaluationPolicy::Worst);
        (0..count)
            .map(|p| {
                let individuals = (0..size)
                    .map(|i| Individual::new(Tag((p * 100 + i) as f64), &mut rng))
                    .collect();
                let mut population = Population::from_individuals(p, individuals, rng.fork());
                population.evaluate_all(&evaluator);
                population
            })
            .collect()
    }

    #[test]
    fn test_ring_migration_swaps_individuals() {
        let mut pops = populations(3, 5);
        let all_before: HashSet<u64> = pops
            .iter()
            .flat_map(|p| p.individuals().iter().map(|i| i.id()))
            .collect();
        let mut rng = RandomNumberGenerator::from_seed(1);

        let migration = RingMigration::new(2).unwrap();
        Migrator::<Tag>::migrate(&migration, &mut pops, &mut rng).unwrap();

        assert!(pops.iter().all(|p| p.len() == 5));
        assert!(pops.iter().all(|p| p.is_sorted()));

        let all_after: HashSet<u64> = pops
            .iter()
            .flat_map(|p| p.individuals().iter().map(|i| i.id()))
            .collect();
        assert_eq!(all_before, all_after);

        // The first population received members from the second
        assert!(pops[0].individuals().iter().any(|i| i.fitness() >= 100.0));
    }

    #[test]
    fn test_ring_is_not_closed() {
        let mut pops = populations(3, 4);
        let mut rng = RandomNumberGenerator::from_seed(3);

        // Moving whole populations makes every hop visible
        let migration = RingMigration::new(4).unwrap();
        Migrator::<Tag>::migrate(&migration, &mut pops, &mut rng).unwrap();

        let origins = |p: &Population<Tag>| {
            p.fitness()
                .iter()
                .map(|f| (*f / 100.0) as usize)
                .collect::<HashSet<usize>>()
        };
        assert_eq!(origins(&pops[0]), HashSet::from([1]));
        assert_eq!(origins(&pops[1]), HashSet::from([2]));
        assert_eq!(origins(&pops[2]), HashSet::from([0]));
    }

    #[test]
    fn test_single_population_is_untouched() {
        let mut pops = populations(1, 4);
        let before = pops[0].fitness();
        let mut rng = RandomNumberGenerator::from_seed(2);

        let migration = RingMigration::new(2).unwrap();
        Migrator::<Tag>::migrate(&migration, &mut pops, &mut rng).unwrap();

        assert_eq!(pops[0].fitness(), before);
    }

    #[test]
    fn test_validation() {
        assert!(RingMigration::new(0).is_err());
        let migration = RingMigration::new(5).unwrap();
        assert!(Migrator::<Tag>::validate(&migration, 4).is_err());
        assert!(Migrator::<Tag>::validate(&migration, 5).is_ok());
    }

    #[test]
    fn test_too_many_migrants_for_populations() {
        let mut pops = populations(2, 3);
        let mut rng = RandomNumberGenerator::from_seed(3);

        let migration = RingMigration::new(4).unwrap();
        let result = Migrator::<Tag>::migrate(&migration, &mut pops, &mut rng);
        assert!(matches!(result, Err(GeneticError::Operator(_))));
    }
}
