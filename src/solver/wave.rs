//! Superposition state with incremental entropy bookkeeping
//!
//! Tracks which patterns remain possible at each cell, per-direction support
//! counters, and the per-cell weight sums the entropy heuristic is derived
//! from. Entropy uses base-10 logarithms throughout; only relative order
//! matters, but the base must not be mixed.

use bitvec::prelude::*;

use crate::solver::propagator::{Propagator, DIRECTION_COUNT, OPPOSITE};

/// Per-cell superposition and entropy bookkeeping
///
/// All tables are flat: possibility at `cell * T + t`, support counters at
/// `(cell * T + t) * 4 + d`. Once a pattern is retired at a cell it never
/// becomes possible again within the same run.
#[derive(Debug, Clone)]
pub struct Wave {
    possible: BitVec,
    compatible: Vec<i32>,
    sums_of_ones: Vec<usize>,
    sums_of_weights: Vec<f64>,
    sums_of_weight_log_weights: Vec<f64>,
    entropies: Vec<f64>,
    cells: usize,
    pattern_count: usize,
}

impl Wave {
    /// Allocate state for `cells` grid cells over `pattern_count` patterns
    pub fn new(cells: usize, pattern_count: usize) -> Self {
        Self {
            possible: bitvec![1; cells * pattern_count],
            compatible: vec![0; cells * pattern_count * DIRECTION_COUNT],
            sums_of_ones: vec![0; cells],
            sums_of_weights: vec![0.0; cells],
            sums_of_weight_log_weights: vec![0.0; cells],
            entropies: vec![0.0; cells],
            cells,
            pattern_count,
        }
    }

    /// Restore the fully-open superposition for a fresh run
    ///
    /// Support counters start at the size of the opposite-direction adjacency
    /// list: the number of neighbour patterns that could still justify each
    /// candidate.
    pub fn reset(
        &mut self,
        propagator: &Propagator,
        sum_of_weights: f64,
        sum_of_weight_log_weights: f64,
        starting_entropy: f64,
    ) {
        self.possible.fill(true);

        let stride = self.pattern_count * DIRECTION_COUNT;
        let mut initial = vec![0i32; stride];
        for pattern in 0..self.pattern_count {
            for direction in 0..DIRECTION_COUNT {
                initial[pattern * DIRECTION_COUNT + direction] =
                    propagator.support_count(OPPOSITE[direction], pattern) as i32;
            }
        }
        for cell in 0..self.cells {
            self.compatible[cell * stride..(cell + 1) * stride].copy_from_slice(&initial);
        }

        self.sums_of_ones.fill(self.pattern_count);
        self.sums_of_weights.fill(sum_of_weights);
        self.sums_of_weight_log_weights.fill(sum_of_weight_log_weights);
        self.entropies.fill(starting_entropy);
    }

    /// Whether `pattern` is still possible at `cell`
    #[inline]
    pub fn possible(&self, cell: usize, pattern: usize) -> bool {
        self.possible[cell * self.pattern_count + pattern]
    }

    /// Number of patterns still possible at `cell`
    #[inline]
    pub fn remaining(&self, cell: usize) -> usize {
        self.sums_of_ones[cell]
    }

    /// Current entropy estimate at `cell`
    #[inline]
    pub fn entropy(&self, cell: usize) -> f64 {
        self.entropies[cell]
    }

    /// Sum of weights of the patterns still possible at `cell`
    #[inline]
    pub fn weight_sum(&self, cell: usize) -> f64 {
        self.sums_of_weights[cell]
    }

    /// Sum of `w·log₁₀(w)` of the patterns still possible at `cell`
    #[inline]
    pub fn weight_log_weight_sum(&self, cell: usize) -> f64 {
        self.sums_of_weight_log_weights[cell]
    }

    /// Current support counter for `(cell, pattern, direction)`
    #[inline]
    pub fn support(&self, cell: usize, pattern: usize, direction: usize) -> i32 {
        self.compatible[(cell * self.pattern_count + pattern) * DIRECTION_COUNT + direction]
    }

    /// Decrement a support counter and return its new value
    #[inline]
    pub fn decrement_support(&mut self, cell: usize, pattern: usize, direction: usize) -> i32 {
        let index = (cell * self.pattern_count + pattern) * DIRECTION_COUNT + direction;
        self.compatible[index] -= 1;
        self.compatible[index]
    }

    /// First still-possible pattern at `cell`, in ascending order
    pub fn first_possible(&self, cell: usize) -> Option<usize> {
        (0..self.pattern_count).find(|&pattern| self.possible(cell, pattern))
    }

    /// Remove `pattern` from the superposition at `cell`
    ///
    /// Zeroes its support counters and folds its weight out of the entropy
    /// sums. The caller must guarantee the pattern was still possible.
    pub fn retire(&mut self, cell: usize, pattern: usize, weight: f64, weight_log_weight: f64) {
        let slot = cell * self.pattern_count + pattern;
        debug_assert!(self.possible[slot]);
        debug_assert!(self.sums_of_ones[cell] > 0);
        self.possible.set(slot, false);

        let base = slot * DIRECTION_COUNT;
        for counter in &mut self.compatible[base..base + DIRECTION_COUNT] {
            *counter = 0;
        }

        let sum = self.sums_of_weights[cell];
        self.entropies[cell] += self.sums_of_weight_log_weights[cell] / sum - sum.log10();

        self.sums_of_ones[cell] -= 1;
        self.sums_of_weights[cell] -= weight;
        self.sums_of_weight_log_weights[cell] -= weight_log_weight;

        let sum = self.sums_of_weights[cell];
        if sum > 0.0 {
            self.entropies[cell] -= self.sums_of_weight_log_weights[cell] / sum - sum.log10();
        } else {
            // No weight left at this cell; the entropy is never compared again.
            self.entropies[cell] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_propagator(pattern_count: usize) -> Propagator {
        let all: Vec<usize> = (0..pattern_count).collect();
        let table = vec![all; pattern_count];
        Propagator::new([table.clone(), table.clone(), table.clone(), table])
    }

    #[test]
    fn test_reset_restores_open_superposition() {
        let propagator = uniform_propagator(3);
        let mut wave = Wave::new(4, 3);
        wave.reset(&propagator, 3.0, 0.0, 3.0_f64.log10());

        for cell in 0..4 {
            assert_eq!(wave.remaining(cell), 3);
            for pattern in 0..3 {
                assert!(wave.possible(cell, pattern));
                for direction in 0..DIRECTION_COUNT {
                    assert_eq!(wave.support(cell, pattern, direction), 3);
                }
            }
        }
    }

    #[test]
    fn test_retire_updates_weight_sums() {
        let propagator = uniform_propagator(2);
        let weights: [f64; 2] = [1.0, 3.0];
        let wlw: Vec<f64> = weights.iter().map(|w| w * w.log10()).collect();
        let sum: f64 = weights.iter().sum();
        let wlw_sum: f64 = wlw.iter().sum();

        let mut wave = Wave::new(1, 2);
        wave.reset(&propagator, sum, wlw_sum, sum.log10() - wlw_sum / sum);

        wave.retire(0, 1, weights[1], wlw[1]);

        assert!(!wave.possible(0, 1));
        assert!(wave.possible(0, 0));
        assert_eq!(wave.remaining(0), 1);
        assert!((wave.weight_sum(0) - 1.0).abs() < 1e-12);
        assert!((wave.weight_log_weight_sum(0) - wlw[0]).abs() < 1e-12);
        for direction in 0..DIRECTION_COUNT {
            assert_eq!(wave.support(0, 1, direction), 0);
        }
    }

    #[test]
    fn test_retire_matches_recomputed_entropy() {
        let propagator = uniform_propagator(3);
        let weights: [f64; 3] = [2.0, 5.0, 7.0];
        let wlw: Vec<f64> = weights.iter().map(|w| w * w.log10()).collect();
        let sum: f64 = weights.iter().sum();
        let wlw_sum: f64 = wlw.iter().sum();

        let mut wave = Wave::new(1, 3);
        wave.reset(&propagator, sum, wlw_sum, sum.log10() - wlw_sum / sum);

        wave.retire(0, 0, weights[0], wlw[0]);

        // Entropy recomputed from scratch over the surviving patterns
        let rest_sum = weights[1] + weights[2];
        let rest_wlw = wlw[1] + wlw[2];
        let expected = rest_sum.log10() - rest_wlw / rest_sum;
        assert!((wave.entropy(0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_retiring_last_pattern_leaves_dead_cell() {
        let propagator = uniform_propagator(1);
        let mut wave = Wave::new(1, 1);
        wave.reset(&propagator, 2.0, 2.0 * 2.0_f64.log10(), 2.0_f64.log10());

        wave.retire(0, 0, 2.0, 2.0 * 2.0_f64.log10());

        assert_eq!(wave.remaining(0), 0);
        assert!(wave.first_possible(0).is_none());
        assert!(wave.entropy(0).is_finite());
    }
}
