use rand::seq::index;
use rand::Rng;

use crate::error::{GeneticError, Result};
use crate::individual::compare_fitness;
use crate::rng::RandomNumberGenerator;
use crate::selection::check_input;
use crate::selection::selection_strategy::SelectionStrategy;

/// A selection strategy that selects individuals through tournament selection.
///
/// Each pick draws `tournament_size` distinct contestants uniformly at random
/// and keeps the one with the lowest fitness. Ties go to the contestant with
/// the lowest position, so the outcome depends only on the random stream and
/// the population order.
///
/// Tournament selection needs no fitness normalization, which makes it safe
/// for negative or unbounded objectives. It is the engine default.
///
/// - Smaller tournament sizes lead to more exploration (more random selection)
/// - Larger tournament sizes lead to more exploitation (more focus on the best individuals)
///
/// When the tournament is larger than the population, contestants are drawn
/// with replacement if `replacement` is enabled; otherwise selection fails
/// with an `Operator` error.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentSelection {
    tournament_size: usize,
    replacement: bool,
}

impl TournamentSelection {
    /// Creates a new TournamentSelection strategy with the specified tournament size.
    ///
    /// # Errors
    ///
    /// Returns an error if `tournament_size` is 0.
    pub fn new(tournament_size: usize, replacement: bool) -> Result<Self> {
        if tournament_size < 1 {
            return Err(GeneticError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            tournament_size,
            replacement,
        })
    }

    pub fn with_tournament_size(mut self, tournament_size: usize) -> Result<Self> {
        if tournament_size < 1 {
            return Err(GeneticError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        self.tournament_size = tournament_size;
        Ok(self)
    }

    /// Forbids drawing contestants with replacement.
    pub fn without_replacement(mut self) -> Self {
        self.replacement = false;
        self
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    /// Runs a single tournament and returns the position of the winner.
    fn run_tournament(&self, fitness: &[f64], rng: &mut RandomNumberGenerator) -> Result<usize> {
        let population_size = fitness.len();

        let contestants: Vec<usize> = if self.tournament_size <= population_size {
            index::sample(rng, population_size, self.tournament_size).into_vec()
        } else if self.replacement {
            (0..self.tournament_size)
                .map(|_| rng.gen_range(0..population_size))
                .collect()
        } else {
            return Err(GeneticError::Operator(format!(
                "Tournament size ({}) exceeds population size ({}) and replacement is disabled",
                self.tournament_size, population_size
            )));
        };

        let mut winner = contestants[0];
        for &idx in &contestants[1..] {
            let order = compare_fitness(fitness[idx], fitness[winner]);
            if order.is_lt() || (order.is_eq() && idx < winner) {
                winner = idx;
            }
        }

        Ok(winner)
    }
}

impl Default for TournamentSelection {
    /// Tournaments of 3 with replacement.
    fn default() -> Self {
        Self {
            tournament_size: 3,
            replacement: true,
        }
    }
}

impl SelectionStrategy for TournamentSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_input(fitness)?;

        (0..num_to_select)
            .map(|_| self.run_tournament(fitness, rng))
            .collect()
    }

    fn validate(&self, population_size: usize) -> Result<()> {
        if !self.replacement && self.tournament_size > population_size {
            return Err(GeneticError::Operator(format!(
                "Tournament size ({}) exceeds population size ({}) and replacement is disabled",
                self.tournament_size, population_size
            )));
        }
        Ok(())
    }

    fn supports(&self, population_size: usize, _num_to_select: usize) -> bool {
        population_size > 0 && (self.replacement || self.tournament_size <= population_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_selection() {
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
        let mut rng = RandomNumberGenerator::from_seed(42);

        let selection = TournamentSelection::default();
        let selected = selection.select(&fitness, 3, &mut rng).unwrap();

        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|&i| i < fitness.len()));
    }

    #[test]
    fn test_full_tournament_always_picks_best() {
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
        let mut rng = RandomNumberGenerator::from_seed(1);

        // Every contestant takes part, so the minimum always wins
        let selection = TournamentSelection::new(5, false).unwrap();
        let selected = selection.select(&fitness, 10, &mut rng).unwrap();

        assert!(selected.iter().all(|&i| i == 4));
    }

    #[test]
    fn test_tournament_never_picks_worst_with_distinct_contestants() {
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
        let mut rng = RandomNumberGenerator::from_seed(2);

        let selection = TournamentSelection::new(2, false).unwrap();
        let selected = selection.select(&fitness, 200, &mut rng).unwrap();

        assert!(!selected.contains(&3));
    }

    #[test]
    fn test_ties_go_to_lowest_position() {
        let fitness = vec![1.0, 1.0, 1.0];
        let mut rng = RandomNumberGenerator::from_seed(3);

        let selection = TournamentSelection::new(3, false).unwrap();
        let selected = selection.select(&fitness, 5, &mut rng).unwrap();

        assert_eq!(selected, vec![0; 5]);
    }

    #[test]
    fn test_oversized_tournament_with_replacement() {
        let fitness = vec![0.5, 0.8];
        let mut rng = RandomNumberGenerator::from_seed(4);

        let selection = TournamentSelection::new(10, true).unwrap();
        let selected = selection.select(&fitness, 3, &mut rng).unwrap();

        assert_eq!(selected.len(), 3);
        assert!(selection.validate(2).is_ok());
    }

    #[test]
    fn test_oversized_tournament_without_replacement() {
        let fitness = vec![0.5, 0.8];
        let mut rng = RandomNumberGenerator::from_seed(5);

        let selection = TournamentSelection::new(10, false).unwrap();

        assert!(matches!(
            selection.select(&fitness, 1, &mut rng),
            Err(GeneticError::Operator(_))
        ));
        assert!(matches!(
            selection.validate(2),
            Err(GeneticError::Operator(_))
        ));
        assert!(!selection.supports(2, 1));
        assert!(selection.supports(10, 40));
        assert!(TournamentSelection::new(10, true).unwrap().supports(2, 40));
    }

    #[test]
    fn test_seeded_selection_is_deterministic() {
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1, 0.7, 0.2];
        let selection = TournamentSelection::default();

        let mut rng1 = RandomNumberGenerator::from_seed(6);
        let mut rng2 = RandomNumberGenerator::from_seed(6);

        assert_eq!(
            selection.select(&fitness, 20, &mut rng1).unwrap(),
            selection.select(&fitness, 20, &mut rng2).unwrap()
        );
    }

    #[test]
    fn test_tournament_selection_empty_population() {
        let mut rng = RandomNumberGenerator::from_seed(7);
        let result = TournamentSelection::default().select(&[], 3, &mut rng);

        assert_eq!(result, Err(GeneticError::EmptyPopulation));
    }

    #[test]
    fn test_tournament_selection_invalid_size() {
        // Tournament size must be at least 1
        assert!(TournamentSelection::default().with_tournament_size(0).is_err());
        assert!(TournamentSelection::new(0, true).is_err());
    }
}
