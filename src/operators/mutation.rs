use rand::Rng;
use rand_distr::StandardNormal;

/// Swaps `n` random pairs of positions.
///
/// Permutations stay permutations. Slices shorter than two are left alone.
pub fn mutate_permute<T, R>(genes: &mut [T], n: usize, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let len = genes.len();
    if len < 2 {
        return;
    }
    for _ in 0..n {
        let i = rng.gen_range(0..len);
        let j = rng.gen_range(0..len);
        genes.swap(i, j);
    }
}

/// Cuts a random segment out and reinserts it at a random position of what
/// remains.
///
/// The multiset of genes is unchanged, so permutations stay valid.
pub fn mutate_splice<T, R>(genes: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    let len = genes.len();
    if len < 2 {
        return;
    }

    let mut bounds = [rng.gen_range(0..=len), rng.gen_range(0..=len)];
    bounds.sort_unstable();
    let [start, end] = bounds;
    let width = end - start;
    let insert_at = rng.gen_range(0..=len - width);

    if insert_at < start {
        genes[insert_at..end].rotate_right(width);
    } else {
        genes[start..insert_at + width].rotate_left(width);
    }
}

/// Multiplicative Gaussian noise.
///
/// Each gene is perturbed with probability `rate` as `x += x * N(0, 1)`, so
/// the step size scales with the magnitude of the gene. A gene at exactly
/// zero stays there.
pub fn mutate_normal_f64<R>(genes: &mut [f64], rate: f64, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for gene in genes.iter_mut() {
        if rng.gen::<f64>() < rate {
            let noise: f64 = rng.sample(StandardNormal);
            *gene += *gene * noise;
        }
    }
}

/// Replaces `n` random positions with values drawn uniformly from `corpus`.
///
/// An empty corpus leaves the genes untouched.
pub fn mutate_uniform<T, R>(genes: &mut [T], corpus: &[T], n: usize, rng: &mut R)
where
    T: Clone,
    R: Rng + ?Sized,
{
    if genes.is_empty() || corpus.is_empty() {
        return;
    }
    for _ in 0..n {
        let i = rng.gen_range(0..genes.len());
        genes[i] = corpus[rng.gen_range(0..corpus.len())].clone();
    }
}
