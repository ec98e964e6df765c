//! Random permutations drawn from a caller-supplied generator.
//!
//! Nothing here touches a global random state: every function takes the
//! generator explicitly, so results are reproducible from a seed.

use rand::{Rng, seq::SliceRandom};

/// A uniformly random permutation of `0..len`.
///
/// # Examples
///
/// ```
/// use moseq_stats::permutation::random_permutation;
/// use rand::SeedableRng as _;
///
/// let mut rng = rand_pcg::Pcg64::seed_from_u64(42);
/// let mut perm = random_permutation(5, &mut rng);
/// perm.sort_unstable();
/// assert_eq!(perm, vec![0, 1, 2, 3, 4]);
/// ```
pub fn random_permutation<R>(len: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let mut perm = (0..len).collect::<Vec<_>>();
    perm.shuffle(rng);
    perm
}

/// Rolls `shift` positions to the right: `out[i] = values[(i - shift) mod len]`.
///
/// # Examples
///
/// ```
/// use moseq_stats::permutation::roll;
///
/// assert_eq!(roll(&[1, 2, 3, 4], 1), vec![4, 1, 2, 3]);
/// ```
#[must_use]
pub fn roll<T>(values: &[T], shift: usize) -> Vec<T>
where
    T: Copy,
{
    let mut out = values.to_vec();
    if !out.is_empty() {
        out.rotate_right(shift % values.len());
    }
    out
}

/// Cyclically shifts the valid entries of `values` by a random offset.
///
/// Only positions where `valid` is `true` take part in the rotation; they are
/// rolled by a uniform shift in `0..count(valid)`. Invalid positions are set
/// to `fill`. Nothing is drawn from `rng` when there are no valid entries.
///
/// # Panics
///
/// Panics if `values` and `valid` have different lengths.
pub fn permute_cyclic<T, R>(values: &[T], valid: &[bool], fill: T, rng: &mut R) -> Vec<T>
where
    T: Copy,
    R: Rng + ?Sized,
{
    assert_eq!(values.len(), valid.len(), "values and mask must match");
    let picked = values
        .iter()
        .zip(valid)
        .filter(|(_, v)| **v)
        .map(|(x, _)| *x)
        .collect::<Vec<_>>();

    let mut out = vec![fill; values.len()];
    if picked.is_empty() {
        return out;
    }
    let shift = rng.random_range(0..picked.len());
    let rolled = roll(&picked, shift);
    let slots = valid.iter().enumerate().filter(|(_, v)| **v).map(|(i, _)| i);
    for (slot, value) in slots.zip(rolled) {
        out[slot] = value;
    }
    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_permute_cyclic_preserves_valid_multiset() {
        let mut rng = Pcg64::seed_from_u64(7);
        let values = [1, 2, 3, 4, 5, 6];
        let valid = [true, false, true, true, false, true];
        let out = permute_cyclic(&values, &valid, 0, &mut rng);
        assert_eq!(out[1], 0);
        assert_eq!(out[4], 0);
        let mut kept = [out[0], out[2], out[3], out[5]];
        kept.sort_unstable();
        assert_eq!(kept, [1, 3, 4, 6]);
    }

    #[test]
    fn test_permute_cyclic_is_a_rotation() {
        let mut rng = Pcg64::seed_from_u64(11);
        let values = (0..8).collect::<Vec<i32>>();
        let valid = [true; 8];
        let out = permute_cyclic(&values, &valid, -1, &mut rng);
        // consecutive elements stay consecutive modulo the length
        for w in out.windows(2) {
            assert_eq!((w[0] + 1) % 8, w[1]);
        }
    }

    #[test]
    fn test_permute_cyclic_all_invalid() {
        let mut rng = Pcg64::seed_from_u64(0);
        let out = permute_cyclic(&[true, true], &[false, false], false, &mut rng);
        assert_eq!(out, vec![false, false]);
    }

    #[test]
    fn test_same_seed_same_permutation() {
        let a = random_permutation(20, &mut Pcg64::seed_from_u64(3));
        let b = random_permutation(20, &mut Pcg64::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
