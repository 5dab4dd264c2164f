//! # Minimizers
//!
//! Ready-made continuous minimizers built on the GA engine. Each one wraps a
//! [`Ga`](crate::evolution::Ga) with a single population, a dedicated genome
//! and [`Replacement::MutationOnly`](crate::breeding::Replacement): the whole
//! population moves once per generation and the movement rule lives in the
//! genome's `mutate`.
//!
//! - [`DiffEvo`]: differential evolution (DE/rand/1/bin).
//! - [`Spso`]: standard particle swarm optimization with a global best.
//!
//! ```rust
//! use gaopt::minimizers::DiffEvo;
//!
//! let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
//! let minimum = DiffEvo::default().with_seed(1).minimize(sphere, 2).unwrap();
//!
//! assert_eq!(minimum.position.len(), 2);
//! assert!(minimum.value < 1.0);
//! ```

pub mod diff_evo;
pub mod spso;

pub use diff_evo::DiffEvo;
pub use spso::Spso;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{GeneticError, Result};

/// A real-valued objective shared by every genome of a run.
pub(crate) type Objective = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// The best point a minimizer found.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub position: Vec<f64>,
    pub value: f64,
    /// Completed generations.
    pub generations: usize,
}

/// NaN objective values are reported as evaluation failures.
pub(crate) fn checked(value: f64) -> Result<f64> {
    if value.is_nan() {
        return Err(GeneticError::Evaluation(
            "objective returned NaN".to_string(),
        ));
    }
    Ok(value)
}

/// Checks the bounds and dimensionality shared by every minimizer.
pub(crate) fn check_domain(min: f64, max: f64, dimensions: usize) -> Result<()> {
    if !(min.is_finite() && max.is_finite() && min < max) {
        return Err(GeneticError::Configuration(format!(
            "Search bounds must be finite with min < max, got [{}, {}]",
            min, max
        )));
    }
    if dimensions == 0 {
        return Err(GeneticError::Configuration(
            "Dimensions must be at least 1".to_string(),
        ));
    }
    Ok(())
}

// Positions are only written between generations; a panic elsewhere leaves
// them usable.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
