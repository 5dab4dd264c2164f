//! Standard particle swarm optimization.
//!
//! Each particle remembers the best point it has visited. Every generation
//! its velocity is pulled towards that point and towards the best point of
//! the whole swarm:
//!
//! `v = w * v + c * r1 * (personal - x) + c * r2 * (global - x)`
//!
//! where `r1` and `r2` are uniform in `[0, 1)` per coordinate. A particle that
//! leaves the bounds is put back on the boundary and its velocity on that
//! coordinate is halved and reversed. The fitness of a particle is the value
//! of its personal best, so the swarm is never replaced by worse points.

use std::fmt;
use std::sync::{Arc, RwLock};

use rand::Rng;
use tracing::debug;

use crate::breeding::Replacement;
use crate::error::{GeneticError, Result};
use crate::evolution::{EvolutionOptions, GaBuilder};
use crate::genome::Genome;
use crate::minimizers::{check_domain, checked, read, write, Minimum, Objective};
use crate::operators::init_uniform_f64;
use crate::rng::RandomNumberGenerator;

/// Inertia `1 / (2 ln 2)`.
const DEFAULT_INERTIA: f64 = 0.721_347_520_444_481_7;
/// Acceleration `0.5 + ln 2`.
const DEFAULT_ACCELERATION: f64 = 1.193_147_180_559_945_3;

/// Particle swarm minimizer.
///
/// ```rust
/// use gaopt::minimizers::Spso;
///
/// let swarm = Spso::new(20, 40, -10.0, 10.0, 0.7).unwrap().with_seed(8);
/// let minimum = swarm.minimize(|x| (x[0] + 3.0).abs(), 1).unwrap();
///
/// assert!((minimum.position[0] + 3.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spso {
    particles: usize,
    steps: usize,
    min: f64,
    max: f64,
    inertia: f64,
    acceleration: f64,
    parallelism: usize,
    seed: Option<u64>,
}

impl Default for Spso {
    /// 40 particles in `[-5, 5]` for 30 generations with the SPSO 2011
    /// coefficients.
    fn default() -> Self {
        Self {
            particles: 40,
            steps: 30,
            min: -5.0,
            max: 5.0,
            inertia: DEFAULT_INERTIA,
            acceleration: DEFAULT_ACCELERATION,
            parallelism: 1,
            seed: None,
        }
    }
}

impl Spso {
    /// Creates a swarm of `particles` particles drawn uniformly in
    /// `[min, max]` and moved for `steps` generations.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an empty swarm, empty or
    /// non-finite bounds, or an inertia outside `[0, 1)`.
    pub fn new(particles: usize, steps: usize, min: f64, max: f64, inertia: f64) -> Result<Self> {
        if particles == 0 {
            return Err(GeneticError::Configuration(
                "A swarm needs at least 1 particle".to_string(),
            ));
        }
        check_domain(min, max, 1)?;
        if !(0.0..1.0).contains(&inertia) {
            return Err(GeneticError::Configuration(format!(
                "Inertia must be in [0, 1), got {}",
                inertia
            )));
        }

        Ok(Self {
            particles,
            steps,
            min,
            max,
            inertia,
            ..Self::default()
        })
    }

    /// Weight of the pulls towards the personal and the global best.
    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Number of worker threads used to move particles.
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
        let swarm = Arc::new(Swarm {
            inertia: self.inertia,
            acceleration: self.acceleration,
            min: self.min,
            max: self.max,
            global_best: RwLock::new(Vec::new()),
        });

        let mut options = EvolutionOptions::builder()
            .population_count(1)
            .population_size(self.particles)
            .generation_limit(self.steps)
            .replacement(Replacement::MutationOnly { strict: false })
            .hof_size(1)
            .parallelism(self.parallelism)
            .build();
        options.set_seed(self.seed);

        let (min, max) = (self.min, self.max);
        let constructor_swarm = Arc::clone(&swarm);
        let callback_swarm = Arc::clone(&swarm);

        let mut ga = GaBuilder::new()
            .with_options(options)
            .with_constructor(move |rng| {
                let x = init_uniform_f64(dimensions, min, max, rng);
                let velocity = x
                    .iter()
                    .map(|&xi| rng.gen_range((min - xi)..=(max - xi)))
                    .collect();
                let best_y = objective(&x);
                Particle {
                    best_x: x.clone(),
                    best_y,
                    x,
                    velocity,
                    objective: Arc::clone(&objective),
                    swarm: Arc::clone(&constructor_swarm),
                }
            })
            .with_callback(move |snapshot| {
                if let Some(best) = snapshot.best {
                    *write(&callback_swarm.global_best) = best.genome().best_x.clone();
                }
            })
            .build()?;

        let result = ga.minimize()?;
        debug!(
            generations = result.generations,
            best = result.best.fitness(),
            "particle swarm finished"
        );

        Ok(Minimum {
            position: result.best.genome().best_x.clone(),
            value: result.best.fitness(),
            generations: result.generations,
        })
    }
}

/// Swarm-wide coefficients and the best point found so far.
#[derive(Debug)]
struct Swarm {
    inertia: f64,
    acceleration: f64,
    min: f64,
    max: f64,
    global_best: RwLock<Vec<f64>>,
}

#[derive(Clone)]
struct Particle {
    x: Vec<f64>,
    velocity: Vec<f64>,
    best_x: Vec<f64>,
    best_y: f64,
    objective: Objective,
    swarm: Arc<Swarm>,
}

impl fmt::Debug for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("x", &self.x)
            .field("best_x", &self.best_x)
            .field("best_y", &self.best_y)
            .finish()
    }
}

impl Genome for Particle {
    fn evaluate(&self) -> Result<f64> {
        checked(self.best_y)
    }

    fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        let swarm = Arc::clone(&self.swarm);
        let global_best = read(&swarm.global_best);
        let global = if global_best.len() == self.x.len() {
            global_best.as_slice()
        } else {
            self.best_x.as_slice()
        };

        for i in 0..self.x.len() {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            self.velocity[i] = swarm.inertia * self.velocity[i]
                + swarm.acceleration * r1 * (self.best_x[i] - self.x[i])
                + swarm.acceleration * r2 * (global[i] - self.x[i]);
            self.x[i] += self.velocity[i];

            if self.x[i] < swarm.min || self.x[i] > swarm.max {
                self.x[i] = self.x[i].clamp(swarm.min, swarm.max);
                self.velocity[i] *= -0.5;
            }
        }

        let y = (self.objective)(&self.x);
        // NaN never replaces a personal best
        if y < self.best_y || self.best_y.is_nan() {
            self.best_x.clone_from(&self.x);
            self.best_y = y;
        }
    }

    // Particles only move through mutation
    fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swarm(global_best: Vec<f64>) -> Arc<Swarm> {
        Arc::new(Swarm {
            inertia: DEFAULT_INERTIA,
            acceleration: DEFAULT_ACCELERATION,
            min: -1.0,
            max: 1.0,
            global_best: RwLock::new(global_best),
        })
    }

    fn particle(x: Vec<f64>, velocity: Vec<f64>, swarm: Arc<Swarm>) -> Particle {
        let objective: Objective = Arc::new(|x: &[f64]| x.iter().map(|v| v * v).sum::<f64>());
        Particle {
            best_x: x.clone(),
            best_y: objective(&x),
            x,
            velocity,
            objective,
            swarm,
        }
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        assert!(Spso::new(0, 10, -1.0, 1.0, 0.5).is_err());
        assert!(Spso::new(10, 10, 1.0, 1.0, 0.5).is_err());
        assert!(Spso::new(10, 10, -1.0, 1.0, 1.0).is_err());
        assert!(Spso::new(10, 10, -1.0, 1.0, 0.5).is_ok());
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let mut p = particle(vec![0.9, -0.9], vec![5.0, -5.0], swarm(vec![0.0, 0.0]));
        let mut rng = RandomNumberGenerator::from_seed(4);

        for _ in 0..20 {
            p.mutate(&mut rng);
            assert!(p.x.iter().all(|x| (-1.0..=1.0).contains(x)));
        }
    }

    #[test]
    fn test_personal_best_never_gets_worse() {
        let mut p = particle(vec![0.5, 0.5], vec![0.3, -0.2], swarm(vec![0.1, 0.1]));
        let mut rng = RandomNumberGenerator::from_seed(5);

        let mut previous = p.evaluate().unwrap();
        for _ in 0..30 {
            p.mutate(&mut rng);
            let current = p.evaluate().unwrap();
            assert!(current <= previous);
            assert_eq!(current, p.best_x.iter().map(|v| v * v).sum::<f64>());
            previous = current;
        }
    }

    #[test]
    fn test_seeded_runs_match_across_workers() {
        let objective = |x: &[f64]| x.iter().map(|v| (v - 0.5).powi(2)).sum::<f64>();
        let spso = Spso::new(10, 12, -2.0, 2.0, 0.7).unwrap().with_seed(6);

        let sequential = spso.clone().minimize(objective, 2).unwrap();
        let pooled = spso.with_parallelism(3).minimize(objective, 2).unwrap();

        assert_eq!(sequential, pooled);
        assert_eq!(sequential.generations, 12);
    }
}
