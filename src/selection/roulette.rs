use rand::Rng;

use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;
use crate::selection::check_input;
use crate::selection::selection_strategy::SelectionStrategy;

/// A selection strategy that selects individuals with a probability
/// proportional to how much better they are than the worst one.
///
/// Since lower fitness is better, each finite fitness `f` gets the weight
/// `max - f + offset`, where `max` is the largest finite fitness in the
/// population. With the default offset of zero the worst individual can
/// never be picked; a positive offset gives it a small chance. Non-finite
/// fitness values get a weight of zero.
///
/// When every weight is zero (for example a fully converged population) the
/// wheel degenerates to uniform selection.
///
/// # Examples
///
/// ```
/// use gaopt::rng::RandomNumberGenerator;
/// use gaopt::selection::{RouletteWheelSelection, SelectionStrategy};
///
/// let fitness = vec![1.0, 2.0, 3.0];
/// let mut rng = RandomNumberGenerator::from_seed(42);
///
/// let selected = RouletteWheelSelection::new()
///     .select(&fitness, 50, &mut rng)
///     .unwrap();
///
/// // The worst individual has a weight of zero.
/// assert!(!selected.contains(&2));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouletteWheelSelection {
    offset: f64,
}

impl RouletteWheelSelection {
    /// Creates a new RouletteWheelSelection strategy with no offset.
    pub fn new() -> Self {
        Self { offset: 0.0 }
    }

    /// Adds `offset` to every finite weight.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if `offset` is negative or not finite.
    pub fn with_offset(mut self, offset: f64) -> Result<Self> {
        if !offset.is_finite() || offset < 0.0 {
            return Err(GeneticError::Configuration(
                "Roulette offset must be a finite, non-negative number".to_string(),
            ));
        }
        self.offset = offset;
        Ok(self)
    }

    /// Cumulative selection probabilities, or `None` when every weight is zero.
    fn calculate_probabilities(&self, fitness: &[f64]) -> Option<Vec<f64>> {
        let max_fitness = fitness
            .iter()
            .copied()
            .filter(|f| f.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);

        let weights: Vec<f64> = fitness
            .iter()
            .map(|&f| {
                if f.is_finite() {
                    max_fitness - f + self.offset
                } else {
                    0.0
                }
            })
            .collect();

        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return None;
        }

        let mut cumulative = 0.0;
        let mut probs: Vec<f64> = weights
            .iter()
            .map(|w| {
                cumulative += w;
                cumulative / sum
            })
            .collect();

        // Guard against rounding leaving the last bucket short of 1.0
        if let Some(last) = probs.last_mut() {
            *last = 1.0;
        }

        Some(probs)
    }

    /// Spins the wheel once.
    fn select_individual(cumulative_probs: &[f64], rng: &mut RandomNumberGenerator) -> usize {
        let r: f64 = rng.gen();
        let idx = cumulative_probs.partition_point(|&p| p <= r);
        idx.min(cumulative_probs.len() - 1)
    }
}

impl SelectionStrategy for RouletteWheelSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_input(fitness)?;

        let selected = match self.calculate_probabilities(fitness) {
            Some(probs) => (0..num_to_select)
                .map(|_| Self::select_individual(&probs, rng))
                .collect(),
            None => (0..num_to_select)
                .map(|_| rng.gen_range(0..fitness.len()))
                .collect(),
        };

        Ok(selected)
    }
}
