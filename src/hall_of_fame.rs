//! # Hall of Fame
//!
//! The hall of fame archives the best individuals ever seen during a run,
//! independently of what survives in the populations. It holds clones, so
//! later variation never alters an archived entry.

use crate::genome::Genome;
use crate::individual::Individual;

/// Bounded, ascending archive of the best individuals seen so far.
///
/// Entries are unique by individual id, so an elite that survives many
/// generations takes a single slot.
#[derive(Debug, Clone)]
pub struct HallOfFame<G: Genome> {
    capacity: usize,
    entries: Vec<Individual<G>>,
}

impl<G: Genome> HallOfFame<G> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Archived individuals, best first.
    pub fn entries(&self) -> &[Individual<G>] {
        &self.entries
    }

    /// The best individual ever archived.
    pub fn best(&self) -> Option<&Individual<G>> {
        self.entries.first()
    }

    /// Offers evaluated `candidates` to the archive.
    ///
    /// A candidate enters when the archive has room or when it is strictly
    /// better than the current worst entry. Returns `true` if the archive
    /// changed.
    pub fn update(&mut self, candidates: &[Individual<G>]) -> bool {
        let mut changed = false;

        for candidate in candidates.iter().filter(|c| c.is_evaluated()) {
            if self.capacity == 0 || self.entries.iter().any(|e| e.id() == candidate.id()) {
                continue;
            }

            if self.entries.len() == self.capacity {
                match self.entries.last() {
                    Some(worst) if candidate.cmp_fitness(worst).is_lt() => {
                        self.entries.pop();
                    }
                    _ => continue,
                }
            }

            // Insert after entries of equal fitness so older entries win ties
            let at = self
                .entries
                .partition_point(|e| e.cmp_fitness(candidate).is_le());
            self.entries.insert(at, candidate.clone());
            changed = true;
        }

        changed
    }

    pub fn into_entries(self) -> Vec<Individual<G>> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::evaluation::{EvaluationPolicy, Evaluator};
    use crate::rng::RandomNumberGenerator;

    #[derive(Clone, Debug)]
    struct Value(f64);

    impl Genome for Value {
        fn evaluate(&self) -> Result<f64> {
            Ok(self.0)
        }

        fn mutate(&mut self, _rng: &mut RandomNumberGenerator) {}

        fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
    }

    fn evaluated(values: &[f64], seed: u64) -> Vec<Individual<Value>> {
        let mut rng = RandomNumberGenerator::from_seed(seed);
        let mut individuals: Vec<Individual<Value>> = values
            .iter()
            .map(|&v| Individual::new(Value(v), &mut rng))
            .collect();
        Evaluator::sequential(EvaluationPolicy::Worst).evaluate(&mut individuals, 0);
        individuals
    }

    fn fitness(hof: &HallOfFame<Value>) -> Vec<f64> {
        hof.entries().iter().map(|e| e.fitness()).collect()
    }

    #[test]
    fn test_keeps_the_best_sorted() {
        let mut hof = HallOfFame::new(3);
        assert!(hof.update(&evaluated(&[5.0, 3.0, 8.0, 1.0], 1)));

        assert_eq!(fitness(&hof), vec![1.0, 3.0, 5.0]);
        assert_eq!(hof.best().unwrap().fitness(), 1.0);
    }

    #[test]
    fn test_worse_candidates_are_rejected() {
        let mut hof = HallOfFame::new(2);
        hof.update(&evaluated(&[1.0, 2.0], 2));

        assert!(!hof.update(&evaluated(&[3.0, 2.0], 3)));
        assert_eq!(fitness(&hof), vec![1.0, 2.0]);
    }

    #[test]
    fn test_same_individual_is_archived_once() {
        let mut hof = HallOfFame::new(3);
        let individuals = evaluated(&[1.0], 4);

        hof.update(&individuals);
        hof.update(&individuals);
        hof.update(&[individuals[0].clone()]);

        assert_eq!(hof.len(), 1);
    }

    #[test]
    fn test_unevaluated_candidates_are_ignored() {
        let mut rng = RandomNumberGenerator::from_seed(5);
        let mut hof = HallOfFame::new(2);

        assert!(!hof.update(&[Individual::new(Value(0.0), &mut rng)]));
        assert!(hof.is_empty());
    }

    #[test]
    fn test_best_never_gets_worse() {
        let mut hof = HallOfFame::new(1);
        let mut previous = f64::INFINITY;

        for (seed, batch) in [[4.0, 6.0], [7.0, 2.0], [3.0, 9.0], [2.5, 2.0]].iter().enumerate() {
            hof.update(&evaluated(batch, seed as u64 + 10));
            let best = hof.best().unwrap().fitness();
            assert!(best <= previous);
            previous = best;
        }
        assert_eq!(previous, 2.0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut hof = HallOfFame::new(0);
        assert!(!hof.update(&evaluated(&[1.0], 6)));
        assert!(hof.best().is_none());
    }
}
