//! Differential evolution.
//!
//! Every generation each agent builds a trial point from three other agents
//! `a`, `b`, `c`: coordinate `i` becomes `a[i] + F * (b[i] - c[i])` with
//! probability `crossover_rate`, and one random coordinate always does. The
//! trial replaces the agent only when it is better.

use std::fmt;
use std::sync::{Arc, RwLock};

use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::breeding::Replacement;
use crate::error::{GeneticError, Result};
use crate::evolution::{EvolutionOptions, GaBuilder};
use crate::genome::Genome;
use crate::minimizers::{check_domain, checked, read, write, Minimum, Objective};
use crate::operators::init_uniform_f64;
use crate::rng::RandomNumberGenerator;

/// Differential evolution minimizer.
///
/// ```rust
/// use gaopt::minimizers::DiffEvo;
///
/// let de = DiffEvo::new(20, 50, -2.0, 2.0, 0.9, 0.5).unwrap().with_seed(3);
/// let minimum = de.minimize(|x| (x[0] - 1.0).powi(2), 1).unwrap();
///
/// assert!((minimum.position[0] - 1.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEvo {
    agents: usize,
    steps: usize,
    min: f64,
    max: f64,
    crossover_rate: f64,
    differential_weight: f64,
    parallelism: usize,
    seed: Option<u64>,
}

impl Default for DiffEvo {
    /// 40 agents in `[-5, 5]` for 30 generations, crossover rate 0.5 and
    /// differential weight 0.2.
    fn default() -> Self {
        Self {
            agents: 40,
            steps: 30,
            min: -5.0,
            max: 5.0,
            crossover_rate: 0.5,
            differential_weight: 0.2,
            parallelism: 1,
            seed: None,
        }
    }
}

impl DiffEvo {
    /// Creates a minimizer with `agents` agents drawn uniformly in
    /// `[min, max]` and evolved for `steps` generations.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when there are fewer than 4 agents,
    /// the bounds are empty or not finite, `crossover_rate` is outside
    /// `[0, 1]` or `differential_weight` is not positive.
    pub fn new(
        agents: usize,
        steps: usize,
        min: f64,
        max: f64,
        crossover_rate: f64,
        differential_weight: f64,
    ) -> Result<Self> {
        if agents < 4 {
            return Err(GeneticError::Configuration(format!(
                "Differential evolution needs at least 4 agents, got {}",
                agents
            )));
        }
        check_domain(min, max, 1)?;
        if !(0.0..=1.0).contains(&crossover_rate) {
            return Err(GeneticError::Configuration(format!(
                "Crossover rate must be in [0, 1], got {}",
                crossover_rate
            )));
        }
        if !(differential_weight.is_finite() && differential_weight > 0.0) {
            return Err(GeneticError::Configuration(format!(
                "Differential weight must be positive, got {}",
                differential_weight
            )));
        }

        Ok(Self {
            agents,
            steps,
            min,
            max,
            crossover_rate,
            differential_weight,
            ..Self::default()
        })
    }

    /// Number of worker threads used to move and evaluate agents.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Minimizes `objective` over `dimensions` coordinates.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for zero dimensions or an invalid
    /// worker count.
    pub fn minimize<F>(&self, objective: F, dimensions: usize) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        check_domain(self.min, self.max, dimensions)?;

        let objective: Objective = Arc::new(objective);
        let shared = Arc::new(Donors {
            crossover_rate: self.crossover_rate,
            differential_weight: self.differential_weight,
            positions: RwLock::new(Vec::new()),
        });

        let mut options = EvolutionOptions::builder()
            .population_count(1)
            .population_size(self.agents)
            .generation_limit(self.steps)
            .replacement(Replacement::MutationOnly { strict: true })
            .hof_size(1)
            .parallelism(self.parallelism)
            .build();
        options.set_seed(self.seed);

        let (min, max) = (self.min, self.max);
        let constructor_shared = Arc::clone(&shared);
        let callback_shared = Arc::clone(&shared);

        let mut ga = GaBuilder::new()
            .with_options(options)
            .with_constructor(move |rng| Agent {
                x: init_uniform_f64(dimensions, min, max, rng),
                objective: Arc::clone(&objective),
                donors: Arc::clone(&constructor_shared),
            })
            .with_callback(move |snapshot| {
                let positions = snapshot
                    .populations
                    .iter()
                    .flat_map(|p| p.individuals())
                    .map(|i| i.genome().x.clone())
                    .collect();
                *write(&callback_shared.positions) = positions;
            })
            .build()?;

        let result = ga.minimize()?;
        debug!(
            generations = result.generations,
            best = result.best.fitness(),
            "differential evolution finished"
        );

        Ok(Minimum {
            position: result.best.genome().x.clone(),
            value: result.best.fitness(),
            generations: result.generations,
        })
    }
}

/// Agent positions as of the last generation boundary, plus the DE rates.
#[derive(Debug)]
struct Donors {
    crossover_rate: f64,
    differential_weight: f64,
    positions: RwLock<Vec<Vec<f64>>>,
}

#[derive(Clone)]
struct Agent {
    x: Vec<f64>,
    objective: Objective,
    donors: Arc<Donors>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent").field("x", &self.x).finish()
    }
}

impl Genome for Agent {
    fn evaluate(&self) -> Result<f64> {
        checked((self.objective)(&self.x))
    }

    fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        let positions = read(&self.donors.positions);
        let others: Vec<&Vec<f64>> = positions.iter().filter(|p| **p != self.x).collect();
        if others.len() < 3 || self.x.is_empty() {
            return;
        }

        let picks = index::sample(rng, others.len(), 3);
        let (a, b, c) = (others[picks.index(0)], others[picks.index(1)], others[picks.index(2)]);
        let weight = self.donors.differential_weight;
        let forced = rng.gen_range(0..self.x.len());

        for i in 0..self.x.len() {
            if i == forced || rng.chance(self.donors.crossover_rate) {
                self.x[i] = a[i] + weight * (b[i] - c[i]);
            }
        }
    }

    // Agents only move through mutation
    fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        assert!(DiffEvo::new(3, 10, -1.0, 1.0, 0.5, 0.5).is_err());
        assert!(DiffEvo::new(10, 10, 1.0, -1.0, 0.5, 0.5).is_err());
        assert!(DiffEvo::new(10, 10, -1.0, 1.0, 1.5, 0.5).is_err());
        assert!(DiffEvo::new(10, 10, -1.0, 1.0, 0.5, 0.0).is_err());
        assert!(DiffEvo::new(10, 10, -1.0, 1.0, 0.5, 0.5).is_ok());
    }

    #[test]
    fn test_zero_dimensions() {
        let result = DiffEvo::default().with_seed(1).minimize(sphere, 0);
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_trial_uses_three_other_agents() {
        let donors = Arc::new(Donors {
            crossover_rate: 1.0,
            differential_weight: 0.5,
            positions: RwLock::new(vec![
                vec![9.0, 9.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
            ]),
        });
        let mut agent = Agent {
            x: vec![9.0, 9.0],
            objective: Arc::new(sphere),
            donors,
        };
        let mut rng = RandomNumberGenerator::from_seed(2);

        agent.mutate(&mut rng);

        // a + F * (b - c) with identical donors lands on the donors
        assert_eq!(agent.x, vec![1.0, 1.0]);
    }

    #[test]
    fn test_too_few_donors_leaves_the_agent() {
        let donors = Arc::new(Donors {
            crossover_rate: 1.0,
            differential_weight: 0.5,
            positions: RwLock::new(vec![vec![0.0], vec![1.0]]),
        });
        let mut agent = Agent {
            x: vec![3.0],
            objective: Arc::new(sphere),
            donors,
        };
        let mut rng = RandomNumberGenerator::from_seed(3);

        agent.mutate(&mut rng);
        assert_eq!(agent.x, vec![3.0]);
    }

    #[test]
    fn test_seeded_runs_match_across_workers() {
        let de = DiffEvo::new(12, 15, -3.0, 3.0, 0.5, 0.5).unwrap().with_seed(5);

        let sequential = de.clone().minimize(sphere, 3).unwrap();
        let pooled = de.with_parallelism(4).minimize(sphere, 3).unwrap();

        assert_eq!(sequential, pooled);
        assert_eq!(sequential.generations, 15);
    }
}
