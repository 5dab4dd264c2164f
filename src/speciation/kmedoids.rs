//! K-medoids speciation.
//!
//! Clusters are built with the alternating (Voronoi iteration) variant of
//! k-medoids:
//!
//! 1. `k` distinct individuals are drawn at random as initial medoids.
//! 2. Every individual joins the cluster of its nearest medoid; ties go to
//!    the lowest cluster index and a medoid always stays in its own cluster.
//! 3. Each cluster elects as new medoid the member with the lowest total
//!    distance to the rest of the cluster; ties go to the lowest position.
//! 4. Steps 2 and 3 repeat until the medoids stop changing or the iteration
//!    limit is reached.
//!
//! Clusters smaller than the configured minimum are then dissolved into the
//! nearest remaining clusters and reseeded from members other clusters can
//! spare, so the result always holds exactly `k` clusters of at least the
//! minimum size.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::seq::index;
use tracing::trace;

use crate::error::{GeneticError, Result};
use crate::genome::Genome;
use crate::individual::{compare_fitness, Individual};
use crate::rng::RandomNumberGenerator;
use crate::speciation::Speciator;

/// Distance between two genomes. Must be symmetric and non-negative.
pub type Metric<G> = Arc<dyn Fn(&G, &G) -> f64 + Send + Sync>;

const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Partitions a population into `k` species around medoid individuals.
pub struct KMedoids<G: Genome> {
    k: usize,
    min_per_cluster: usize,
    max_iterations: usize,
    metric: Metric<G>,
}

impl<G: Genome> KMedoids<G> {
    /// Creates a speciator with `k` clusters of at least one member each and
    /// up to 50 refinement iterations.
    pub fn new<F>(k: usize, metric: F) -> Self
    where
        F: Fn(&G, &G) -> f64 + Send + Sync + 'static,
    {
        Self {
            k,
            min_per_cluster: 1,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            metric: Arc::new(metric),
        }
    }

    pub fn with_min_cluster_size(mut self, min_per_cluster: usize) -> Self {
        self.min_per_cluster = min_per_cluster;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn min_size(&self) -> usize {
        self.min_per_cluster.max(1)
    }

    /// Assigns every position to its nearest medoid.
    fn assign(&self, medoids: &[usize], distances: &mut DistanceCache<'_, G>) -> Vec<usize> {
        (0..distances.len())
            .map(|i| {
                if let Some(own) = medoids.iter().position(|&m| m == i) {
                    return own;
                }
                nearest(medoids.iter().copied().enumerate(), i, distances).unwrap_or(0)
            })
            .collect()
    }

    /// The member with the lowest total distance to the others.
    fn elect_medoid(members: &[usize], distances: &mut DistanceCache<'_, G>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &candidate in members {
            let cost: f64 = members
                .iter()
                .map(|&other| distances.get(candidate, other))
                .sum();
            match best {
                Some((_, best_cost)) if compare_fitness(cost, best_cost) != Ordering::Less => {}
                _ => best = Some((candidate, cost)),
            }
        }
        best.map(|(member, _)| member)
    }

    /// Dissolves and reseeds clusters until every cluster reaches the minimum.
    fn enforce_minimum(
        &self,
        clusters: &mut [Vec<usize>],
        medoids: &mut [usize],
        distances: &mut DistanceCache<'_, G>,
    ) -> Result<()> {
        let min = self.min_size();

        while let Some(c) = clusters.iter().position(|cluster| cluster.len() < min) {
            let orphans = std::mem::take(&mut clusters[c]);
            let others: Vec<(usize, usize)> = medoids
                .iter()
                .copied()
                .enumerate()
                .filter(|&(index, _)| index != c)
                .collect();
            for orphan in orphans {
                let target = nearest(others.iter().copied(), orphan, distances).ok_or_else(|| {
                    GeneticError::Operator("No cluster left to absorb members".to_string())
                })?;
                clusters[target].push(orphan);
            }

            // Reseed with the member lying farthest from its own medoid
            let mut seed: Option<(usize, usize, f64)> = None;
            for (d, cluster) in clusters.iter().enumerate() {
                if d == c || cluster.len() <= min {
                    continue;
                }
                for &member in cluster {
                    if member == medoids[d] {
                        continue;
                    }
                    let dist = distances.get(member, medoids[d]);
                    let better = match seed {
                        None => true,
                        Some((_, current, best)) => match compare_fitness(dist, best) {
                            Ordering::Greater => true,
                            Ordering::Equal => member < current,
                            Ordering::Less => false,
                        },
                    };
                    if better {
                        seed = Some((d, member, dist));
                    }
                }
            }
            let (donor, new_medoid, _) = seed.ok_or_else(|| {
                GeneticError::Operator(format!(
                    "Cannot reseed cluster {} with at least {} members",
                    c, min
                ))
            })?;
            clusters[donor].retain(|&m| m != new_medoid);
            clusters[c].push(new_medoid);
            medoids[c] = new_medoid;

            while clusters[c].len() < min {
                let mut pick: Option<(usize, usize, f64)> = None;
                for (d, cluster) in clusters.iter().enumerate() {
                    if d == c || cluster.len() <= min {
                        continue;
                    }
                    for &member in cluster {
                        if member == medoids[d] {
                            continue;
                        }
                        let dist = distances.get(member, new_medoid);
                        let better = match pick {
                            None => true,
                            Some((_, current, best)) => match compare_fitness(dist, best) {
                                Ordering::Less => true,
                                Ordering::Equal => member < current,
                                Ordering::Greater => false,
                            },
                        };
                        if better {
                            pick = Some((d, member, dist));
                        }
                    }
                }
                let (donor, member, _) = pick.ok_or_else(|| {
                    GeneticError::Operator(format!(
                        "Cannot fill cluster {} up to {} members",
                        c, min
                    ))
                })?;
                clusters[donor].retain(|&m| m != member);
                clusters[c].push(member);
            }

            trace!(cluster = c, medoid = new_medoid, "reseeded undersized cluster");
        }

        Ok(())
    }
}

/// The `(cluster, medoid)` entry closest to `point`; ties go to the first.
fn nearest<G, I>(medoids: I, point: usize, distances: &mut DistanceCache<'_, G>) -> Option<usize>
where
    G: Genome,
    I: Iterator<Item = (usize, usize)>,
{
    let mut best: Option<(usize, f64)> = None;
    for (cluster, medoid) in medoids {
        let dist = distances.get(point, medoid);
        match best {
            Some((_, best_dist)) if compare_fitness(dist, best_dist) != Ordering::Less => {}
            _ => best = Some((cluster, dist)),
        }
    }
    best.map(|(cluster, _)| cluster)
}

impl<G: Genome> Speciator<G> for KMedoids<G> {
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
        if self.k * self.min_size() > population_size {
            return Err(GeneticError::Configuration(format!(
                "{} species of at least {} members do not fit in a population of {}",
                self.k,
                self.min_size(),
                population_size
            )));
        }
        if self.max_iterations == 0 {
            return Err(GeneticError::Configuration(
                "K-medoids needs at least one iteration".to_string(),
            ));
        }
        Ok(())
    }

    fn partition(
        &self,
        individuals: &[Individual<G>],
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<Vec<usize>>> {
        self.validate(individuals.len()).map_err(|err| match err {
            GeneticError::Configuration(msg) => GeneticError::Operator(msg),
            other => other,
        })?;

        let mut distances = DistanceCache::new(individuals, self.metric.as_ref());
        let mut medoids = index::sample(rng, individuals.len(), self.k).into_vec();

        let mut iterations = 0;
        let mut assignment = self.assign(&medoids, &mut distances);
        while iterations < self.max_iterations {
            iterations += 1;

            let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.k];
            for (i, &cluster) in assignment.iter().enumerate() {
                members[cluster].push(i);
            }
            let elected: Vec<usize> = members
                .iter()
                .zip(&medoids)
                .map(|(cluster, &current)| {
                    Self::elect_medoid(cluster, &mut distances).unwrap_or(current)
                })
                .collect();

            if elected == medoids {
                break;
            }
            medoids = elected;
            assignment = self.assign(&medoids, &mut distances);
        }

        let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); self.k];
        for (i, &cluster) in assignment.iter().enumerate() {
            clusters[cluster].push(i);
        }

        self.enforce_minimum(&mut clusters, &mut medoids, &mut distances)?;
        for cluster in clusters.iter_mut() {
            cluster.sort_unstable();
        }

        trace!(
            k = self.k,
            iterations,
            sizes = ?clusters.iter().map(Vec::len).collect::<Vec<_>>(),
            "k-medoids speciation"
        );

        Ok(clusters)
    }
}

impl<G: Genome> Clone for KMedoids<G> {
    fn clone(&self) -> Self {
        Self {
            k: self.k,
            min_per_cluster: self.min_per_cluster,
            max_iterations: self.max_iterations,
            metric: Arc::clone(&self.metric),
        }
    }
}

impl<G: Genome> fmt::Debug for KMedoids<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KMedoids")
            .field("k", &self.k)
            .field("min_per_cluster", &self.min_per_cluster)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

/// Lazily filled symmetric distance table.
struct DistanceCache<'a, G: Genome> {
    individuals: &'a [Individual<G>],
    metric: &'a (dyn Fn(&G, &G) -> f64 + Send + Sync),
    values: HashMap<(usize, usize), f64>,
}

impl<'a, G: Genome> DistanceCache<'a, G> {
    fn new(
        individuals: &'a [Individual<G>],
        metric: &'a (dyn Fn(&G, &G) -> f64 + Send + Sync),
    ) -> Self {
        Self {
            individuals,
            metric,
            values: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.individuals.len()
    }

    fn get(&mut self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let key = if i < j { (i, j) } else { (j, i) };
        let individuals = self.individuals;
        let metric = self.metric;
        *self
            .values
            .entry(key)
            .or_insert_with(|| metric(individuals[key.0].genome(), individuals[key.1].genome()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[derive(Clone, Debug)]
    struct Point(f64);

    impl Genome for Point {
        fn evaluate(&self) -> Result<f64> {
            Ok(self.0.abs())
        }

        fn mutate(&mut self, _rng: &mut RandomNumberGenerator) {}

        fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
    }

    fn individuals(values: &[f64]) -> Vec<Individual<Point>> {
        let mut rng = RandomNumberGenerator::from_seed(0);
        values
            .iter()
            .map(|&v| Individual::new(Point(v), &mut rng))
            .collect()
    }

    fn metric() -> impl Fn(&Point, &Point) -> f64 + Send + Sync + 'static {
        |a: &Point, b: &Point| (a.0 - b.0).abs()
    }

    fn assert_partition(groups: &[Vec<usize>], n: usize, k: usize, min: usize) {
        assert_eq!(groups.len(), k);
        let mut seen = HashSet::new();
        for group in groups {
            assert!(group.len() >= min);
            for &i in group {
                assert!(seen.insert(i), "position {} appears twice", i);
            }
        }
        assert_eq!(seen.len(), n);
    }

    #[test]
    fn test_separated_clusters_are_found() {
        let values = [0.0, 0.1, 0.2, 10.0, 10.1, 10.2];
        let inds = individuals(&values);

        for seed in 0..20 {
            let mut rng = RandomNumberGenerator::from_seed(seed);
            let groups = KMedoids::new(2, metric())
                .partition(&inds, &mut rng)
                .unwrap();

            assert_partition(&groups, 6, 2, 1);
            let mut sorted = groups.clone();
            sorted.sort();
            assert_eq!(sorted, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        }
    }

    #[test]
    fn test_partition_property_on_many_seeds() {
        let values: Vec<f64> = (0..30).map(|i| ((i * 37) % 23) as f64).collect();
        let inds = individuals(&values);

        for seed in 0..10 {
            let mut rng = RandomNumberGenerator::from_seed(seed);
            let groups = KMedoids::new(4, metric())
                .with_min_cluster_size(5)
                .partition(&inds, &mut rng)
                .unwrap();

            assert_partition(&groups, 30, 4, 5);
        }
    }

    #[test]
    fn test_minimum_cluster_size_is_enforced() {
        // One far outlier would form a singleton cluster
        let values = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 100.0];
        let inds = individuals(&values);

        for seed in 0..20 {
            let mut rng = RandomNumberGenerator::from_seed(seed);
            let groups = KMedoids::new(3, metric())
                .with_min_cluster_size(3)
                .partition(&inds, &mut rng)
                .unwrap();

            assert_partition(&groups, 9, 3, 3);
        }
    }

    #[test]
    fn test_identical_genomes() {
        let inds = individuals(&[1.0; 6]);
        let mut rng = RandomNumberGenerator::from_seed(4);

        let groups = KMedoids::new(3, metric())
            .with_min_cluster_size(2)
            .partition(&inds, &mut rng)
            .unwrap();

        assert_partition(&groups, 6, 3, 2);
    }

    #[test]
    fn test_k_equal_to_population() {
        let inds = individuals(&[1.0, 2.0, 3.0]);
        let mut rng = RandomNumberGenerator::from_seed(5);

        let groups = KMedoids::new(3, metric()).partition(&inds, &mut rng).unwrap();

        assert_partition(&groups, 3, 3, 1);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn test_same_seed_same_partition() {
        let inds = individuals(&[0.3, 5.0, 1.2, 9.9, 4.4, 7.1, 2.2, 8.0]);
        let speciator = KMedoids::new(3, metric()).with_min_cluster_size(2);

        let mut rng1 = RandomNumberGenerator::from_seed(6);
        let mut rng2 = RandomNumberGenerator::from_seed(6);

        assert_eq!(
            speciator.partition(&inds, &mut rng1).unwrap(),
            speciator.partition(&inds, &mut rng2).unwrap()
        );
    }

    #[test]
    fn test_distances_are_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let speciator = KMedoids::new(2, move |a: &Point, b: &Point| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
            (a.0 - b.0).abs()
        });
        let inds = individuals(&[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        let mut rng = RandomNumberGenerator::from_seed(7);

        speciator.partition(&inds, &mut rng).unwrap();

        // At most one call per unordered pair
        assert!(calls.load(AtomicOrdering::SeqCst) <= 15);
    }

    #[test]
    fn test_configuration_errors() {
        let check = |speciator: KMedoids<Point>, size: usize| speciator.validate(size);

        assert!(check(KMedoids::new(0, metric()), 10).is_err());
        assert!(check(KMedoids::new(11, metric()), 10).is_err());
        assert!(check(KMedoids::new(4, metric()).with_min_cluster_size(3), 10).is_err());
        assert!(check(KMedoids::new(2, metric()).with_max_iterations(0), 10).is_err());
        assert!(check(KMedoids::new(2, metric()).with_min_cluster_size(5), 10).is_ok());
    }

    #[test]
    fn test_partition_of_too_small_population_is_operator_error() {
        let inds = individuals(&[1.0, 2.0]);
        let mut rng = RandomNumberGenerator::from_seed(8);

        let result = KMedoids::new(3, metric()).partition(&inds, &mut rng);
        assert!(matches!(result, Err(GeneticError::Operator(_))));
    }
}
