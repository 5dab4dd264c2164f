use rand::seq::SliceRandom;
use rand::Rng;

/// `n` floats drawn uniformly from `[lower, upper)`.
///
/// Returns `n` copies of `lower` when the range is empty.
pub fn init_uniform_f64<R>(n: usize, lower: f64, upper: f64, rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    if lower.is_nan() || upper.is_nan() || lower >= upper {
        return vec![lower; n];
    }
    (0..n).map(|_| rng.gen_range(lower..upper)).collect()
}

/// `n` values drawn uniformly, with replacement, from `corpus`.
///
/// Returns an empty vector when `corpus` is empty.
pub fn init_uniform_from<T, R>(n: usize, corpus: &[T], rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if corpus.is_empty() {
        return Vec::new();
    }
    (0..n)
        .map(|_| corpus[rng.gen_range(0..corpus.len())].clone())
        .collect()
}

/// A uniformly random permutation of `0..n`.
pub fn init_permutation<R>(n: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let mut values: Vec<usize> = (0..n).collect();
    values.shuffle(rng);
    values
}
