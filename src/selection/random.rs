use rand::seq::index;
use rand::Rng;

use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;
use crate::selection::check_input;
use crate::selection::selection_strategy::SelectionStrategy;

/// Uniform random selection, blind to fitness.
///
/// Useful as a baseline and for drift-only experiments.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSelection {
    replacement: bool,
}

impl RandomSelection {
    pub fn new(replacement: bool) -> Self {
        Self { replacement }
    }
}

impl Default for RandomSelection {
    fn default() -> Self {
        Self { replacement: true }
    }
}

impl SelectionStrategy for RandomSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_input(fitness)?;
        let n = fitness.len();

        if self.replacement {
            return Ok((0..num_to_select).map(|_| rng.gen_range(0..n)).collect());
        }

        if num_to_select > n {
            return Err(GeneticError::Operator(format!(
                "Cannot draw {} individuals without replacement from a population of {}",
                num_to_select, n
            )));
        }

        Ok(index::sample(rng, n, num_to_select).into_vec())
    }

    fn supports(&self, population_size: usize, num_to_select: usize) -> bool {
        population_size > 0 && (self.replacement || num_to_select <= population_size)
    }
}
