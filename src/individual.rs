//! # Individual
//!
//! An `Individual` wraps a genome together with its memoized fitness. The
//! cache is invalidated whenever the genome changes through this type, so a
//! stale fitness can never be observed.
//!
//! Every individual carries an id drawn from the random stream that created
//! or last changed it. Clones share the id of their source, which lets the
//! hall of fame recognise an elite it has already archived.

use std::cmp::Ordering;

use rand::RngCore;

use crate::error::{GeneticError, Result};
use crate::evaluation::EvaluationPolicy;
use crate::genome::Genome;
use crate::rng::RandomNumberGenerator;

/// A genome with its cached fitness.
#[derive(Debug, Clone)]
pub struct Individual<G: Genome> {
    genome: G,
    fitness: f64,
    evaluated: bool,
    failure: Option<String>,
    id: u64,
}

impl<G: Genome> Individual<G> {
    /// Wraps `genome` into an unevaluated individual with a fresh id.
    pub fn new(genome: G, rng: &mut RandomNumberGenerator) -> Self {
        Self {
            genome,
            fitness: f64::INFINITY,
            evaluated: false,
            failure: None,
            id: rng.next_u64(),
        }
    }

    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Mutable access to the genome. Invalidates the cached fitness.
    pub fn genome_mut(&mut self) -> &mut G {
        self.invalidate();
        &mut self.genome
    }

    pub fn into_genome(self) -> G {
        self.genome
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The cached fitness, `+inf` while unevaluated.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// The message of the last failed evaluation, if the cached fitness is a
    /// substitute.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Evaluates the genome unless a fitness is already cached.
    ///
    /// On failure the policy's substitute fitness is cached, the individual
    /// counts as evaluated, and the error is returned for bookkeeping.
    pub fn evaluate(&mut self, policy: EvaluationPolicy) -> Result<f64> {
        if self.evaluated {
            return Ok(self.fitness);
        }

        let outcome = self.genome.evaluate().and_then(|fitness| {
            if fitness.is_nan() {
                Err(GeneticError::InvalidNumericValue(
                    "objective returned NaN".to_string(),
                ))
            } else {
                Ok(fitness)
            }
        });

        self.evaluated = true;
        match outcome {
            Ok(fitness) => {
                self.fitness = fitness;
                self.failure = None;
                Ok(fitness)
            }
            Err(err) => {
                self.fitness = policy.substitute_fitness();
                self.failure = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Forgets the cached fitness.
    pub fn invalidate(&mut self) {
        self.evaluated = false;
        self.fitness = f64::INFINITY;
        self.failure = None;
    }

    /// Mutates the genome and gives the individual a new identity.
    pub fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        self.genome.mutate(rng);
        self.invalidate();
        self.id = rng.next_u64();
    }

    /// Crosses both genomes over in place; both individuals become offspring.
    pub fn crossover(&mut self, other: &mut Self, rng: &mut RandomNumberGenerator) {
        self.genome.crossover(&mut other.genome, rng);
        self.invalidate();
        other.invalidate();
        self.id = rng.next_u64();
        other.id = rng.next_u64();
    }

    /// Whether parent selection may pick this individual under `policy`.
    pub fn is_eligible(&self, policy: EvaluationPolicy) -> bool {
        !(policy.excludes_failures() && self.failure.is_some())
    }

    /// Ranking order: ascending fitness, non-comparable values last.
    pub fn cmp_fitness(&self, other: &Self) -> Ordering {
        compare_fitness(self.fitness, other.fitness)
    }
}

/// Total order on fitness values used everywhere in the engine.
///
/// Lower is better; NaN sorts after every number.
pub fn compare_fitness(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| match (a.is_nan(), b.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    })
}
