//! # Genome Trait
//!
//! The `Genome` trait is the capability set a payload must provide to be
//! optimized: evaluate, mutate, crossover and (through `Clone`) a deep copy.
//! The engine never looks inside a genome.
//!
//! ## Conventions
//!
//! - `evaluate` is a pure function of the genome. Lower is better; maximize by
//!   negating the objective. Randomness, if any, must be derived from the genome
//!   itself.
//! - `mutate` and `crossover` change the genome in place and must keep it valid
//!   for the problem (a permutation stays a permutation).
//! - `crossover` receives both parents mutably and may rewrite both.
//!
//! Payloads whose crossover naturally builds two new genomes implement
//! [`PairCrossover`] instead and are wrapped in [`Paired`], which adapts them to
//! the in-place convention.
//!
//! ## Example
//!
//! ```rust
//! use gaopt::error::Result;
//! use gaopt::genome::Genome;
//! use gaopt::operators::{crossover_gnx, mutate_permute};
//! use gaopt::rng::RandomNumberGenerator;
//!
//! #[derive(Clone, Debug)]
//! struct Digits(Vec<u8>);
//!
//! impl Genome for Digits {
//!     fn evaluate(&self) -> Result<f64> {
//!         Ok(self.0.iter().filter(|&&d| d == 0).count() as f64)
//!     }
//!
//!     fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
//!         mutate_permute(&mut self.0, 3, rng);
//!     }
//!
//!     fn crossover(&mut self, other: &mut Self, rng: &mut RandomNumberGenerator) {
//!         crossover_gnx(&mut self.0, &mut other.0, 2, rng);
//!     }
//! }
//! ```

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::rng::RandomNumberGenerator;

/// Trait for types that can be optimized by the engine.
///
/// Types implementing this trait must also implement `Clone`, `Debug`, `Send`
/// and `Sync` so that individuals can be archived, logged and evaluated in
/// parallel. `Clone` must be a deep copy: mutating a clone never affects the
/// original.
pub trait Genome: Clone + Debug + Send + Sync {
    /// Computes the fitness of this genome. Lower values are better.
    ///
    /// Returning an error marks the individual as failed for this evaluation;
    /// the engine substitutes a fitness according to its evaluation policy and
    /// carries on with the generation.
    fn evaluate(&self) -> Result<f64>;

    /// Applies a random perturbation in place.
    fn mutate(&mut self, rng: &mut RandomNumberGenerator);

    /// Recombines `self` and `other` in place. Both parents have the same shape
    /// and both may be rewritten into offspring.
    fn crossover(&mut self, other: &mut Self, rng: &mut RandomNumberGenerator);
}

/// The "return two offspring" crossover convention.
///
/// Implement this instead of [`Genome`] when recombination naturally produces
/// fresh values, then optimize [`Paired<T>`].
pub trait PairCrossover: Clone + Debug + Send + Sync {
    /// Computes the fitness of this genome. Lower values are better.
    fn evaluate(&self) -> Result<f64>;

    /// Applies a random perturbation in place.
    fn mutate(&mut self, rng: &mut RandomNumberGenerator);

    /// Builds two offspring from `self` and `other`, leaving both untouched.
    fn offspring(&self, other: &Self, rng: &mut RandomNumberGenerator) -> (Self, Self);
}

/// Adapter turning a [`PairCrossover`] payload into a [`Genome`].
///
/// Crossover replaces both parents with the two returned offspring.
#[derive(Clone, Debug, PartialEq)]
pub struct Paired<T>(pub T);

impl<T> Paired<T> {
    /// Unwraps the adapted value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Paired<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Paired<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: PairCrossover> Genome for Paired<T> {
    fn evaluate(&self) -> Result<f64> {
        self.0.evaluate()
    }

    fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        self.0.mutate(rng);
    }

    fn crossover(&mut self, other: &mut Self, rng: &mut RandomNumberGenerator) {
        let (first, second) = self.0.offspring(&other.0, rng);
        self.0 = first;
        other.0 = second;
    }
}
