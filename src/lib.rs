//! # gaopt
//!
//! A generic, population-based evolutionary optimizer. Implement
//! [`Genome`](genome::Genome) for a problem type, hand a constructor to
//! [`GaBuilder`](evolution::GaBuilder) and call `minimize`.
//!
//! Lower fitness is better. Runs with a fixed seed are reproducible for any
//! worker count.

pub mod breeding;
pub mod caching;
pub mod error;
pub mod evaluation;
pub mod evolution;
pub mod genome;
pub mod hall_of_fame;
pub mod individual;
pub mod migration;
pub mod minimizers;
pub mod operators;
pub mod population;
pub mod rng;
pub mod selection;
pub mod speciation;

// Re-export commonly used types for convenience
pub use error::{GeneticError, OptionExt, Result};
pub use evaluation::EvaluationPolicy;
pub use evolution::{EvolutionOptions, Ga, GaBuilder, GaResult, StopReason};
pub use genome::{Genome, PairCrossover, Paired};
pub use individual::Individual;
pub use minimizers::{DiffEvo, Minimum, Spso};
