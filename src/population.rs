//! # Population
//!
//! A `Population` is an ordered collection of individuals with its own random
//! stream. The engine may run several populations side by side (linked by
//! migration) and splits a population into species when speciation is on.
//!
//! Sorting is stable and ascending, so after [`Population::sort`] the best
//! individual is first and ties keep their previous order.

use crate::error::{GeneticError, OptionExt, Result};
use crate::evaluation::{EvaluationFailure, Evaluator};
use crate::genome::Genome;
use crate::individual::Individual;
use crate::rng::RandomNumberGenerator;

/// Aggregate fitness statistics of a population.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    pub size: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// An ordered collection of individuals.
#[derive(Debug, Clone)]
pub struct Population<G: Genome> {
    individuals: Vec<Individual<G>>,
    rng: RandomNumberGenerator,
    id: usize,
    species: Option<usize>,
}

impl<G: Genome> Population<G> {
    /// Builds `n` individuals from `constructor`.
    ///
    /// The population forks its own random stream from `rng` before creating
    /// any genome.
    pub fn generate<F>(
        id: usize,
        n: usize,
        constructor: F,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Self>
    where
        F: Fn(&mut RandomNumberGenerator) -> G,
    {
        if n == 0 {
            return Err(GeneticError::Configuration(
                "Population size cannot be zero".to_string(),
            ));
        }

        let mut own_rng = rng.fork();
        let individuals = (0..n)
            .map(|_| {
                let genome = constructor(&mut own_rng);
                Individual::new(genome, &mut own_rng)
            })
            .collect();

        Ok(Self {
            individuals,
            rng: own_rng,
            id,
            species: None,
        })
    }

    /// Wraps existing individuals.
    pub fn from_individuals(
        id: usize,
        individuals: Vec<Individual<G>>,
        rng: RandomNumberGenerator,
    ) -> Self {
        Self {
            individuals,
            rng,
            id,
            species: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The species index when this population is a speciation cluster.
    pub fn species(&self) -> Option<usize> {
        self.species
    }

    pub fn set_species(&mut self, species: Option<usize>) {
        self.species = species;
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual<G>] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut Vec<Individual<G>> {
        &mut self.individuals
    }

    pub fn into_individuals(self) -> Vec<Individual<G>> {
        self.individuals
    }

    pub fn rng_mut(&mut self) -> &mut RandomNumberGenerator {
        &mut self.rng
    }

    /// Replaces the members, keeping id, stream and species tag.
    pub fn replace_individuals(&mut self, individuals: Vec<Individual<G>>) {
        self.individuals = individuals;
    }

    /// Members and random stream, borrowed together.
    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<Individual<G>>, &mut RandomNumberGenerator) {
        (&mut self.individuals, &mut self.rng)
    }

    /// Moves the members into one sub-population per group of positions.
    ///
    /// Each sub-population keeps this population's id, is tagged with its
    /// species index and gets a stream forked from this one. Members not named
    /// by any group join the first sub-population.
    pub fn split(&mut self, groups: &[Vec<usize>]) -> Vec<Population<G>> {
        let mut slots: Vec<Option<Individual<G>>> =
            std::mem::take(&mut self.individuals).into_iter().map(Some).collect();

        let mut species: Vec<Population<G>> = groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let members = group
                    .iter()
                    .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
                    .collect();
                let mut part = Population::from_individuals(self.id, members, self.rng.fork());
                part.set_species(Some(index));
                part
            })
            .collect();

        let leftovers: Vec<Individual<G>> = slots.into_iter().flatten().collect();
        match species.first_mut() {
            Some(first) => first.individuals.extend(leftovers),
            None => self.individuals = leftovers,
        }

        species
    }

    /// Concatenates the members of `species` back into this population, in
    /// species order.
    pub fn merge(&mut self, species: Vec<Population<G>>) {
        for part in species {
            self.individuals.extend(part.individuals);
        }
    }

    /// Fitness of every member, in order.
    pub fn fitness(&self) -> Vec<f64> {
        self.individuals.iter().map(|i| i.fitness()).collect()
    }

    /// Evaluates every unevaluated member.
    pub fn evaluate_all(&mut self, evaluator: &Evaluator) -> Vec<EvaluationFailure> {
        evaluator.evaluate(&mut self.individuals, self.id)
    }

    /// Stable ascending sort by fitness.
    pub fn sort(&mut self) {
        self.individuals.sort_by(|a, b| a.cmp_fitness(b));
    }

    pub fn is_sorted(&self) -> bool {
        self.individuals
            .windows(2)
            .all(|w| w[0].cmp_fitness(&w[1]).is_le())
    }

    /// The first member; the best one once sorted.
    pub fn best(&self) -> Result<&Individual<G>> {
        self.individuals
            .first()
            .ok_or_else_genetic(|| GeneticError::EmptyPopulation)
    }

    /// The last member; the worst one once sorted.
    pub fn worst(&self) -> Result<&Individual<G>> {
        self.individuals
            .last()
            .ok_or_else_genetic(|| GeneticError::EmptyPopulation)
    }

    /// Fitness statistics over evaluated members.
    ///
    /// Returns `None` when nothing has been evaluated yet.
    pub fn stats(&self) -> Option<PopulationStats> {
        let values: Vec<f64> = self
            .individuals
            .iter()
            .filter(|i| i.is_evaluated())
            .map(|i| i.fitness())
            .collect();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let (mean, std_dev) = if finite.len() == values.len() {
            let mean = finite.iter().sum::<f64>() / n;
            let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        } else {
            (f64::INFINITY, f64::NAN)
        };

        Some(PopulationStats {
            size: values.len(),
            min,
            max,
            mean,
            std_dev,
        })
    }
}
