//! Pairwise variation: selected parents are cloned, crossed over and mutated
//! into offspring.
//!
//! Every parent pair is driven by its own stream forked from the population
//! stream before any work starts, so the offspring do not depend on how many
//! workers process the pairs.

use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::evaluation::{EvaluationPolicy, Evaluator};
use crate::genome::Genome;
use crate::individual::Individual;
use crate::rng::RandomNumberGenerator;
use crate::selection::{SelectionStrategy, TournamentSelection};

/// Probabilities applied to every parent pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariationRates {
    pub crossover_rate: f64,
    pub mutation_rate: f64,
}

/// Produces `count` offspring from `parents`.
///
/// Parents are picked by `selection` among the individuals `policy` allows;
/// when none is eligible the whole slice is used. If the strategy cannot
/// draw `count` parents from that many candidates, tournaments of 3 with
/// replacement are used instead. An odd `count` completes its last pair with
/// one uniform draw. Offspring are returned in pair order and are not
/// evaluated; untouched clones keep their parent's cached fitness.
pub(crate) fn produce_offspring<G: Genome>(
    parents: &[Individual<G>],
    count: usize,
    selection: &dyn SelectionStrategy,
    rates: VariationRates,
    policy: EvaluationPolicy,
    evaluator: &Evaluator,
    rng: &mut RandomNumberGenerator,
) -> Result<Vec<Individual<G>>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut eligible: Vec<usize> = (0..parents.len())
        .filter(|&i| parents[i].is_eligible(policy))
        .collect();
    if eligible.is_empty() {
        eligible = (0..parents.len()).collect();
    }

    let fitness: Vec<f64> = eligible.iter().map(|&i| parents[i].fitness()).collect();

    let fallback = TournamentSelection::default();
    let strategy: &dyn SelectionStrategy = if selection.supports(eligible.len(), count) {
        selection
    } else {
        debug!(
            candidates = eligible.len(),
            requested = count,
            ?selection,
            "strategy cannot serve this group, using tournaments with replacement"
        );
        &fallback
    };

    let mut picks = strategy.select(&fitness, count, rng)?;
    if picks.len() % 2 == 1 {
        picks.push(rng.gen_range(0..eligible.len()));
    }

    let pairs: Vec<(&Individual<G>, &Individual<G>, RandomNumberGenerator)> = picks
        .chunks_exact(2)
        .map(|pair| {
            (
                &parents[eligible[pair[0]]],
                &parents[eligible[pair[1]]],
                rng.fork(),
            )
        })
        .collect();

    let children: Vec<(Individual<G>, Individual<G>)> = if evaluator.parallelism() > 1 {
        evaluator.install(|| {
            pairs
                .into_par_iter()
                .map(|(a, b, pair_rng)| vary_pair(a, b, rates, pair_rng))
                .collect()
        })
    } else {
        pairs
            .into_iter()
            .map(|(a, b, pair_rng)| vary_pair(a, b, rates, pair_rng))
            .collect()
    };

    let mut offspring: Vec<Individual<G>> = children
        .into_iter()
        .flat_map(|(a, b)| [a, b])
        .collect();
    offspring.truncate(count);

    Ok(offspring)
}

/// Clones and mutates every individual once, keeping their order.
///
/// Each clone gets its own stream forked in order, like parent pairs do.
pub(crate) fn mutate_each<G: Genome>(
    individuals: &[Individual<G>],
    evaluator: &Evaluator,
    rng: &mut RandomNumberGenerator,
) -> Vec<Individual<G>> {
    let jobs: Vec<(&Individual<G>, RandomNumberGenerator)> =
        individuals.iter().map(|i| (i, rng.fork())).collect();

    let mutate = |(parent, mut job_rng): (&Individual<G>, RandomNumberGenerator)| {
        let mut child = parent.clone();
        child.mutate(&mut job_rng);
        child
    };

    if evaluator.parallelism() > 1 {
        evaluator.install(|| jobs.into_par_iter().map(mutate).collect())
    } else {
        jobs.into_iter().map(mutate).collect()
    }
}

/// One crossover draw, then one mutation draw per child.
fn vary_pair<G: Genome>(
    a: &Individual<G>,
    b: &Individual<G>,
    rates: VariationRates,
    mut rng: RandomNumberGenerator,
) -> (Individual<G>, Individual<G>) {
    let mut first = a.clone();
    let mut second = b.clone();

    if rng.chance(rates.crossover_rate) {
        first.crossover(&mut second, &mut rng);
    }
    if rng.chance(rates.mutation_rate) {
        first.mutate(&mut rng);
    }
    if rng.chance(rates.mutation_rate) {
        second.mutate(&mut rng);
    }

    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneticError;
    use crate::selection::{ElitistSelection, RandomSelection};

    #[derive(Clone, Debug, PartialEq)]
    struct Bits(Vec<u8>);

    impl Genome for Bits {
        fn evaluate(&self) -> Result<f64> {
            if self.0.is_empty() {
                return Err(GeneticError::Evaluation("empty".to_string()));
            }
            Ok(self.0.iter().map(|&b| b as f64).sum())
        }

        fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
            let i = rng.gen_range(0..self.0.len());
            self.0[i] ^= 1;
        }

        fn crossover(&mut self, other: &mut Self, rng: &mut RandomNumberGenerator) {
            crate::operators::crossover_gnx(&mut self.0, &mut other.0, 1, rng);
        }
    }

    fn parents(n: usize, seed: u64) -> Vec<Individual<Bits>> {
        let mut rng = RandomNumberGenerator::from_seed(seed);
        let mut parents: Vec<Individual<Bits>> = (0..n)
            .map(|_| {
                let genes = (0..16).map(|_| rng.gen_range(0..2)).collect();
                Individual::new(Bits(genes), &mut rng)
            })
            .collect();
        Evaluator::sequential(EvaluationPolicy::Worst).evaluate(&mut parents, 0);
        parents
    }

    fn genomes(offspring: &[Individual<Bits>]) -> Vec<Bits> {
        offspring.iter().map(|i| i.genome().clone()).collect()
    }

    const RATES: VariationRates = VariationRates {
        crossover_rate: 0.7,
        mutation_rate: 0.5,
    };

    #[test]
    fn test_offspring_count_and_shape() {
        let parents = parents(10, 1);
        let mut rng = RandomNumberGenerator::from_seed(2);
        let evaluator = Evaluator::sequential(EvaluationPolicy::Worst);

        let offspring = produce_offspring(
            &parents,
            7,
            &TournamentSelection::default(),
            RATES,
            EvaluationPolicy::Worst,
            &evaluator,
            &mut rng,
        )
        .unwrap();

        assert_eq!(offspring.len(), 7);
        assert!(offspring.iter().all(|i| i.genome().0.len() == 16));
    }

    #[test]
    fn test_worker_count_does_not_change_offspring() {
        let parents = parents(20, 3);
        let run = |evaluator: Evaluator| {
            let mut rng = RandomNumberGenerator::from_seed(4);
            produce_offspring(
                &parents,
                20,
                &TournamentSelection::default(),
                RATES,
                EvaluationPolicy::Worst,
                &evaluator,
                &mut rng,
            )
            .unwrap()
        };

        let sequential = run(Evaluator::sequential(EvaluationPolicy::Worst));
        let pooled = run(Evaluator::new(4, EvaluationPolicy::Worst).unwrap());

        assert_eq!(genomes(&sequential), genomes(&pooled));
        let ids = |v: &[Individual<Bits>]| v.iter().map(|i| i.id()).collect::<Vec<_>>();
        assert_eq!(ids(&sequential), ids(&pooled));
    }

    #[test]
    fn test_zero_rates_clone_parents() {
        let parents = parents(6, 5);
        let mut rng = RandomNumberGenerator::from_seed(6);
        let rates = VariationRates {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
        };

        let offspring = produce_offspring(
            &parents,
            6,
            &RandomSelection::default(),
            rates,
            EvaluationPolicy::Worst,
            &Evaluator::sequential(EvaluationPolicy::Worst),
            &mut rng,
        )
        .unwrap();

        for child in &offspring {
            assert!(child.is_evaluated());
            assert!(parents.iter().any(|p| p.id() == child.id()));
        }
    }

    #[test]
    fn test_full_rates_produce_fresh_individuals() {
        let parents = parents(6, 7);
        let mut rng = RandomNumberGenerator::from_seed(8);
        let rates = VariationRates {
            crossover_rate: 1.0,
            mutation_rate: 1.0,
        };

        let offspring = produce_offspring(
            &parents,
            6,
            &RandomSelection::default(),
            rates,
            EvaluationPolicy::Worst,
            &Evaluator::sequential(EvaluationPolicy::Worst),
            &mut rng,
        )
        .unwrap();

        assert!(offspring.iter().all(|c| !c.is_evaluated()));
        assert!(offspring
            .iter()
            .all(|c| parents.iter().all(|p| p.id() != c.id())));
    }

    #[test]
    fn test_excluded_failures_are_never_parents() {
        let mut rng = RandomNumberGenerator::from_seed(9);
        let mut parents = vec![
            Individual::new(Bits(Vec::new()), &mut rng),
            Individual::new(Bits(vec![1, 0, 1]), &mut rng),
            Individual::new(Bits(Vec::new()), &mut rng),
        ];
        let evaluator = Evaluator::sequential(EvaluationPolicy::Exclude);
        assert_eq!(evaluator.evaluate(&mut parents, 0).len(), 2);

        let rates = VariationRates {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
        };
        let offspring = produce_offspring(
            &parents,
            10,
            &RandomSelection::default(),
            rates,
            EvaluationPolicy::Exclude,
            &evaluator,
            &mut rng,
        )
        .unwrap();

        assert!(offspring.iter().all(|c| c.id() == parents[1].id()));
    }

    #[test]
    fn test_odd_count_with_distinct_strategies() {
        let parents = parents(5, 10);
        let evaluator = Evaluator::sequential(EvaluationPolicy::Worst);
        let strategies: [&dyn SelectionStrategy; 2] =
            [&ElitistSelection::default(), &RandomSelection::new(false)];

        for selection in strategies {
            let mut rng = RandomNumberGenerator::from_seed(11);
            let offspring = produce_offspring(
                &parents,
                5,
                selection,
                RATES,
                EvaluationPolicy::Worst,
                &evaluator,
                &mut rng,
            )
            .unwrap();

            assert_eq!(offspring.len(), 5);
        }
    }

    #[test]
    fn test_small_eligible_group_falls_back() {
        let mut rng = RandomNumberGenerator::from_seed(12);
        let mut parents: Vec<Individual<Bits>> = (0..6)
            .map(|i| {
                let genes = if i < 4 { Vec::new() } else { vec![1, 0, i as u8 % 2] };
                Individual::new(Bits(genes), &mut rng)
            })
            .collect();
        let evaluator = Evaluator::sequential(EvaluationPolicy::Exclude);
        assert_eq!(evaluator.evaluate(&mut parents, 0).len(), 4);

        let selection = TournamentSelection::new(3, false).unwrap();
        assert!(selection.validate(parents.len()).is_ok());
        let rates = VariationRates {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
        };

        let offspring = produce_offspring(
            &parents,
            6,
            &selection,
            rates,
            EvaluationPolicy::Exclude,
            &evaluator,
            &mut rng,
        )
        .unwrap();

        assert_eq!(offspring.len(), 6);
        let eligible = [parents[4].id(), parents[5].id()];
        assert!(offspring.iter().all(|c| eligible.contains(&c.id())));
    }
}
