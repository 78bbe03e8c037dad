//! Weighted index sampling from unnormalised distributions

/// Sample an index from a nonnegative weight vector given a uniform draw
///
/// Normalises `weights` in place; a vector summing to zero is replaced by a
/// uniform one first. Returns the smallest index whose own weight is positive
/// and whose cumulative sum reaches `r`. Entries with zero weight are never
/// selected, even at `r = 0.0`. If floating-point slack leaves the cumulative
/// sum below `r` at the top end, the last positively-weighted index is
/// returned.
///
/// Deterministic for a given `(weights, r)` pair.
pub fn weighted_sample(weights: &mut [f64], r: f64) -> usize {
    let mut sum: f64 = weights.iter().sum();

    if sum == 0.0 {
        weights.fill(1.0);
        sum = weights.len() as f64;
    }

    for w in weights.iter_mut() {
        *w /= sum;
    }

    let mut cumulative = 0.0;
    let mut last_positive = 0;

    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if w > 0.0 {
            last_positive = i;
            if r <= cumulative {
                return i;
            }
        }
    }

    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_cumulative_boundaries() {
        let mut weights = [1.0, 1.0, 2.0];
        assert_eq!(weighted_sample(&mut weights, 0.0), 0);

        let mut weights = [1.0, 1.0, 2.0];
        assert_eq!(weighted_sample(&mut weights, 0.25), 0);

        let mut weights = [1.0, 1.0, 2.0];
        assert_eq!(weighted_sample(&mut weights, 0.3), 1);

        let mut weights = [1.0, 1.0, 2.0];
        assert_eq!(weighted_sample(&mut weights, 0.9), 2);
    }

    #[test]
    fn test_zero_sum_becomes_uniform() {
        let mut weights = [0.0, 0.0, 0.0, 0.0];
        assert_eq!(weighted_sample(&mut weights, 0.1), 0);

        let mut weights = [0.0, 0.0, 0.0, 0.0];
        assert_eq!(weighted_sample(&mut weights, 0.9), 3);
    }

    #[test]
    fn test_zero_weight_entries_skipped() {
        // A leading zero weight must not be selected even at r = 0
        let mut weights = [0.0, 1.0, 0.0, 2.0];
        assert_eq!(weighted_sample(&mut weights, 0.0), 1);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let mut weights = [0.0, 1.0, 0.0, 2.0];
            let picked = weighted_sample(&mut weights, rng.random::<f64>());
            assert!(picked == 1 || picked == 3);
        }
    }

    #[test]
    fn test_top_end_slack_returns_positive_index() {
        // r numerically above the final cumulative sum
        let mut weights = [1.0, 1.0, 0.0];
        let picked = weighted_sample(&mut weights, 1.0 - f64::EPSILON);
        assert!(picked < 2);
    }

    #[test]
    fn test_empirical_distribution_converges() {
        let mut rng = StdRng::seed_from_u64(1234);
        let expected = [0.1, 0.2, 0.3, 0.4];
        let mut counts = [0usize; 4];

        let draws = 100_000;
        for _ in 0..draws {
            let mut weights = [1.0, 2.0, 3.0, 4.0];
            counts[weighted_sample(&mut weights, rng.random::<f64>())] += 1;
        }

        for (count, target) in counts.iter().zip(expected.iter()) {
            let observed = *count as f64 / draws as f64;
            assert!(
                (observed - target).abs() < 0.01,
                "observed {observed} for target {target}"
            );
        }
    }
}
