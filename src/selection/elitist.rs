use crate::error::{GeneticError, Result};
use crate::individual::compare_fitness;
use crate::rng::RandomNumberGenerator;
use crate::selection::check_input;
use crate::selection::selection_strategy::SelectionStrategy;

/// A selection strategy that selects the best individuals based on fitness.
///
/// This strategy ranks positions by fitness (lowest first, ties by position)
/// and returns the top N. It ignores the random stream entirely.
///
/// # Examples
///
/// ```
/// use gaopt::rng::RandomNumberGenerator;
/// use gaopt::selection::{ElitistSelection, SelectionStrategy};
///
/// let fitness = vec![0.5, 0.8, 0.3];
/// let mut rng = RandomNumberGenerator::from_seed(0);
///
/// let selection = ElitistSelection::default();
/// let selected = selection.select(&fitness, 2, &mut rng).unwrap();
///
/// assert_eq!(selected, vec![2, 0]);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElitistSelection {
    /// Whether the ranking may be cycled through when more individuals are
    /// requested than exist.
    allow_duplicates: bool,
}

impl ElitistSelection {
    pub fn new(allow_duplicates: bool) -> Self {
        Self { allow_duplicates }
    }

    pub fn with_duplicates() -> Self {
        Self {
            allow_duplicates: true,
        }
    }
}

impl SelectionStrategy for ElitistSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        _rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_input(fitness)?;

        if num_to_select > fitness.len() && !self.allow_duplicates {
            return Err(GeneticError::Operator(format!(
                "Cannot select {} distinct individuals from a population of {}",
                num_to_select,
                fitness.len()
            )));
        }

        let mut ranking: Vec<usize> = (0..fitness.len()).collect();
        ranking.sort_by(|&a, &b| compare_fitness(fitness[a], fitness[b]));

        Ok(ranking.iter().copied().cycle().take(num_to_select).collect())
    }

    fn supports(&self, population_size: usize, num_to_select: usize) -> bool {
        population_size > 0 && (self.allow_duplicates || num_to_select <= population_size)
    }
}
