use crate::error::{GeneticError, Result};
use crate::genome::Genome;
use crate::individual::{compare_fitness, Individual};
use crate::rng::RandomNumberGenerator;
use crate::speciation::Speciator;

/// Sorts individuals by fitness and cuts the ranking into `k` contiguous
/// species of near-equal size. Earlier species get the extra members when
/// the population does not divide evenly.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessInterval {
    k: usize,
}

impl FitnessInterval {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl<G: Genome> Speciator<G> for FitnessInterval {
    fn validate(&self, population_size: usize) -> Result<()> {
        if self.k == 0 {
            return Err(GeneticError::Configuration(
                "Number of species must be at least 1".to_string(),
            ));
        }
        if self.k > population_size {
            return Err(GeneticError::Configuration(format!(
                "Number of species ({}) exceeds the population size ({})",
                self.k, population_size
            )));
        }
        Ok(())
    }

    fn partition(
        &self,
        individuals: &[Individual<G>],
        _rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<Vec<usize>>> {
        let n = individuals.len();
        if self.k == 0 || self.k > n {
            return Err(GeneticError::Operator(format!(
                "Cannot split {} individuals into {} species",
                n, self.k
            )));
        }

        let mut ranking: Vec<usize> = (0..n).collect();
        ranking.sort_by(|&a, &b| {
            compare_fitness(individuals[a].fitness(), individuals[b].fitness())
        });

        let base = n / self.k;
        let extra = n % self.k;
        let mut groups = Vec::with_capacity(self.k);
        let mut start = 0;
        for species in 0..self.k {
            let len = base + usize::from(species < extra);
            groups.push(ranking[start..start + len].to_vec());
            start += len;
        }

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{EvaluationPolicy, Evaluator};

    #[derive(Clone, Debug)]
    struct Value(f64);

    impl Genome for Value {
        fn evaluate(&self) -> Result<f64> {
            Ok(self.0)
        }

        fn mutate(&mut self, _rng: &mut RandomNumberGenerator) {}

        fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
    }

    #[test]
    fn test_fitness_bands() {
        let mut rng = RandomNumberGenerator::from_seed(0);
        let mut individuals: Vec<Individual<Value>> = [7.0, 1.0, 5.0, 3.0, 2.0, 6.0, 4.0]
            .iter()
            .map(|&v| Individual::new(Value(v), &mut rng))
            .collect();
        Evaluator::sequential(EvaluationPolicy::Worst).evaluate(&mut individuals, 0);

        let groups = FitnessInterval::new(3)
            .partition(&individuals, &mut rng)
            .unwrap();

        let fitness = |g: &Vec<usize>| g.iter().map(|&i| individuals[i].fitness()).collect::<Vec<_>>();
        assert_eq!(groups.len(), 3);
        assert_eq!(fitness(&groups[0]), vec![1.0, 2.0, 3.0]);
        assert_eq!(fitness(&groups[1]), vec![4.0, 5.0]);
        assert_eq!(fitness(&groups[2]), vec![6.0, 7.0]);
    }

    #[test]
    fn test_validation() {
        assert!(Speciator::<Value>::validate(&FitnessInterval::new(0), 10).is_err());
        assert!(Speciator::<Value>::validate(&FitnessInterval::new(11), 10).is_err());
        assert!(Speciator::<Value>::validate(&FitnessInterval::new(10), 10).is_ok());
    }
}
