use rand::Rng;

use crate::error::{GeneticError, Result};
use crate::individual::compare_fitness;
use crate::rng::RandomNumberGenerator;
use crate::selection::check_input;
use crate::selection::selection_strategy::SelectionStrategy;

/// A selection strategy that selects individuals based on their rank in the population.
///
/// Rank-based selection assigns a selection probability to each individual based on its
/// rank in the population, rather than its absolute fitness value. This helps prevent
/// premature convergence when there are a few individuals with much better fitness than
/// the rest of the population, and it handles negative fitness values.
///
/// Linear ranking is used: with `N` individuals ranked from worst (0) to best
/// (`N - 1`) and pressure `s`, rank `r` is picked with probability
/// `(2 - s) / N + 2 r (s - 1) / (N (N - 1))`.
///
/// # Examples
///
/// ```
/// use gaopt::rng::RandomNumberGenerator;
/// use gaopt::selection::{RankBasedSelection, SelectionStrategy};
///
/// let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
/// let mut rng = RandomNumberGenerator::from_seed(42);
///
/// let selection = RankBasedSelection::new(2.0).unwrap();
/// let selected = selection.select(&fitness, 3, &mut rng).unwrap();
///
/// assert_eq!(selected.len(), 3);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RankBasedSelection {
    /// Higher values increase selection pressure.
    selection_pressure: f64,
}

impl RankBasedSelection {
    /// Creates a new RankBasedSelection strategy.
    ///
    /// * At 1.0, all individuals have equal selection probability
    /// * At 2.0, selection pressure is at its maximum and the worst
    ///   individual is never picked
    ///
    /// # Errors
    ///
    /// Returns a `GeneticError::Configuration` error if `selection_pressure` is not in the range [1.0, 2.0].
    pub fn new(selection_pressure: f64) -> Result<Self> {
        if !(1.0..=2.0).contains(&selection_pressure) {
            return Err(GeneticError::Configuration(
                "Selection pressure must be in the range [1.0, 2.0]".to_string(),
            ));
        }

        Ok(Self { selection_pressure })
    }

    pub fn selection_pressure(&self) -> f64 {
        self.selection_pressure
    }

    /// Cumulative probabilities indexed by population position.
    fn calculate_probabilities(&self, fitness: &[f64]) -> Vec<f64> {
        let n = fitness.len();
        if n == 1 {
            return vec![1.0];
        }

        // Worst first, so the best individual ends up with the highest rank
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| compare_fitness(fitness[b], fitness[a]).then(b.cmp(&a)));

        let s = self.selection_pressure;
        let nf = n as f64;
        let mut probs = vec![0.0; n];
        for (rank, &idx) in order.iter().enumerate() {
            probs[idx] = (2.0 - s) / nf + 2.0 * rank as f64 * (s - 1.0) / (nf * (nf - 1.0));
        }

        let mut cumulative = 0.0;
        for p in probs.iter_mut() {
            cumulative += *p;
            *p = cumulative;
        }
        if let Some(last) = probs.last_mut() {
            *last = 1.0;
        }

        probs
    }
}

impl Default for RankBasedSelection {
    /// A balanced pressure of 1.5.
    fn default() -> Self {
        Self {
            selection_pressure: 1.5,
        }
    }
}

impl SelectionStrategy for RankBasedSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_input(fitness)?;

        let cumulative = self.calculate_probabilities(fitness);
        let last = cumulative.len() - 1;

        Ok((0..num_to_select)
            .map(|_| {
                let r: f64 = rng.gen();
                cumulative.partition_point(|&p| p <= r).min(last)
            })
            .collect())
    }
}
