pub mod elitist;
pub mod random;
pub mod rank;
pub mod roulette;
pub mod selection_strategy;
pub mod tournament;

pub use elitist::ElitistSelection;
pub use random::RandomSelection;
pub use rank::RankBasedSelection;
pub use roulette::RouletteWheelSelection;
pub use selection_strategy::SelectionStrategy;
pub use tournament::TournamentSelection;

use crate::error::{GeneticError, Result};

/// Shared input checks for every strategy.
pub(crate) fn check_input(fitness: &[f64]) -> Result<()> {
    if fitness.is_empty() {
        return Err(GeneticError::EmptyPopulation);
    }
    Ok(())
}
