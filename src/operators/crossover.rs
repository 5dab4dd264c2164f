use rand::seq::index;
use rand::Rng;

/// Generalized n-point crossover.
///
/// Draws `n_points` distinct cut points in `1..len` and swaps every other
/// segment between `a` and `b`, starting with the segment after the first
/// cut. With a single cut this is classic one-point crossover.
///
/// `n_points` is clamped to `len - 1`. Only the common prefix of the two
/// slices takes part when their lengths differ.
pub fn crossover_gnx<T, R>(a: &mut [T], b: &mut [T], n_points: usize, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let len = a.len().min(b.len());
    if len < 2 || n_points == 0 {
        return;
    }

    let n_points = n_points.min(len - 1);
    let mut cuts: Vec<usize> = index::sample(rng, len - 1, n_points)
        .into_iter()
        .map(|i| i + 1)
        .collect();
    cuts.sort_unstable();
    cuts.push(len);

    let mut swapping = false;
    let mut start = 0;
    for cut in cuts {
        if swapping {
            a[start..cut].swap_with_slice(&mut b[start..cut]);
        }
        swapping = !swapping;
        start = cut;
    }
}

/// Partially mapped crossover (PMX) for permutations.
///
/// A random segment is exchanged between the parents; values displaced by
/// the exchange are relocated by following the mapping the segment defines,
/// so both offspring stay permutations of the same values. Outside the
/// segment every offspring keeps as many of its own positions as possible.
///
/// Both slices must be permutations of the same set of values; otherwise
/// lengths are preserved but the result may contain repeats.
pub fn crossover_pmx<T, R>(a: &mut [T], b: &mut [T], rng: &mut R)
where
    T: Clone + PartialEq,
    R: Rng + ?Sized,
{
    let len = a.len();
    if len < 2 || b.len() != len {
        return;
    }

    let mut bounds = [rng.gen_range(0..len), rng.gen_range(0..len)];
    bounds.sort_unstable();
    let [start, end] = bounds;

    let child_a = pmx_child(b, a, start, end);
    let child_b = pmx_child(a, b, start, end);
    a.clone_from_slice(&child_a);
    b.clone_from_slice(&child_b);
}

/// Copies `template[start..=end]` into a child and fills the rest from
/// `donor`, relocating conflicts through the segment mapping.
fn pmx_child<T: Clone + PartialEq>(template: &[T], donor: &[T], start: usize, end: usize) -> Vec<T> {
    let len = template.len();
    let mut child: Vec<Option<T>> = vec![None; len];
    for i in start..=end {
        child[i] = Some(template[i].clone());
    }

    let in_segment = |value: &T| template[start..=end].contains(value);

    for i in start..=end {
        let value = &donor[i];
        if in_segment(value) {
            continue;
        }
        let mut pos = i;
        // A chain visits each segment position at most once on valid input
        for _ in 0..=len {
            let mapped = &template[pos];
            match donor.iter().position(|v| v == mapped) {
                Some(p) if (start..=end).contains(&p) => pos = p,
                Some(p) => {
                    child[p] = Some(value.clone());
                    break;
                }
                None => break,
            }
        }
    }

    child
        .into_iter()
        .zip(donor.iter())
        .map(|(slot, fallback)| slot.unwrap_or_else(|| fallback.clone()))
        .collect()
}

/// Per-gene random blend of two float vectors.
///
/// For every position a weight `p` is drawn uniformly from `[0, 1)` and the
/// genes become `p * a + (1 - p) * b` and `(1 - p) * a + p * b`. Offspring
/// therefore stay inside the box spanned by their parents.
pub fn crossover_uniform_f64<R>(a: &mut [f64], b: &mut [f64], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for (x, y) in a.iter_mut().zip(b.iter_mut()) {
        let p: f64 = rng.gen();
        let (nx, ny) = (p * *x + (1.0 - p) * *y, (1.0 - p) * *x + p * *y);
        *x = nx;
        *y = ny;
    }
}
