//! Observation/propagation loop over the wave state

use rand::rngs::StdRng;
use rand::Rng;

use crate::io::error::{invalid_parameter, Result};
use crate::math::sampling::weighted_sample;
use crate::solver::propagator::{Propagator, DIRECTION_COUNT, DX, DY};
use crate::solver::wave::Wave;

/// Scale of the random perturbation applied to entropy comparisons
const ENTROPY_NOISE_SCALE: f64 = 1e-6;

/// Upper sentinel for the minimum-entropy scan
const ENTROPY_SCAN_CEILING: f64 = 1e3;

/// Outcome of a single solver run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Every cell collapsed to a single pattern
    Success,
    /// Some cell ran out of candidate patterns
    Contradiction,
    /// The iteration cap elapsed before either outcome
    Exhausted,
}

impl RunStatus {
    /// Whether the run ended without a contradiction
    ///
    /// `Exhausted` counts as "did not fail": the caller may render the
    /// remaining superposition instead of retrying.
    pub const fn did_not_fail(self) -> bool {
        !matches!(self, Self::Contradiction)
    }
}

/// Grid shape and initial-constraint hooks a model supplies to the solver
///
/// The model owns the solver and passes its topology down on every call, so
/// the solver never holds a reference back into the model.
pub trait Topology {
    /// Whether a cell position lies outside the observable region
    fn on_boundary(&self, x: i32, y: i32) -> bool;

    /// Install model-specific constraints after the superposition is reset
    ///
    /// Runs once per solver run, before the first observation. The default
    /// installs nothing.
    fn after_clear(&self, _solver: &mut Solver) {}
}

enum Observation {
    /// All non-boundary cells hold exactly one pattern
    Finished,
    /// A cell has no candidates left
    Dead,
    /// One cell was collapsed; its bans await propagation
    Pending,
}

/// Constraint-propagation solver over a rectangular pattern grid
///
/// Owns the superposition, the adjacency tables, and the ban stack. All
/// tables are sized at construction; `observe` and `propagate` allocate
/// nothing beyond the one-off `Observed` array on success.
#[derive(Debug, Clone)]
pub struct Solver {
    width: usize,
    height: usize,
    pattern_count: usize,
    weights: Vec<f64>,
    weight_log_weights: Vec<f64>,
    sum_of_weights: f64,
    sum_of_weight_log_weights: f64,
    starting_entropy: f64,
    propagator: Propagator,
    wave: Wave,
    stack: Vec<(usize, usize)>,
    distribution: Vec<f64>,
    observed: Option<Vec<usize>>,
}

impl Solver {
    /// Build a solver for a `width × height` grid over the given patterns
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern set is empty, a weight is not strictly
    /// positive, the adjacency tables don't cover every pattern, or a grid
    /// dimension is zero.
    pub fn new(
        width: usize,
        height: usize,
        weights: Vec<f64>,
        propagator: Propagator,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "dimensions",
                &format!("{width}x{height}"),
                &"output grid must be at least 1x1",
            ));
        }

        let pattern_count = weights.len();
        if pattern_count == 0 {
            return Err(invalid_parameter(
                "patterns",
                &0,
                &"at least one pattern is required",
            ));
        }

        if let Some(bad) = weights.iter().find(|w| !(**w > 0.0)) {
            return Err(invalid_parameter(
                "weights",
                bad,
                &"every pattern weight must be strictly positive",
            ));
        }

        if !propagator.is_consistent() || propagator.pattern_count() != pattern_count {
            return Err(invalid_parameter(
                "propagator",
                &propagator.pattern_count(),
                &format!("adjacency tables must cover all {pattern_count} patterns"),
            ));
        }

        let weight_log_weights: Vec<f64> = weights.iter().map(|w| w * w.log10()).collect();
        let sum_of_weights: f64 = weights.iter().sum();
        let sum_of_weight_log_weights: f64 = weight_log_weights.iter().sum();
        let starting_entropy = sum_of_weights.log10() - sum_of_weight_log_weights / sum_of_weights;

        let cells = width * height;

        let mut solver = Self {
            width,
            height,
            pattern_count,
            weights,
            weight_log_weights,
            sum_of_weights,
            sum_of_weight_log_weights,
            starting_entropy,
            propagator,
            wave: Wave::new(cells, pattern_count),
            stack: Vec::with_capacity(cells * pattern_count),
            distribution: vec![0.0; pattern_count],
            observed: None,
        };
        // Start from the cleared state so the superposition renders sensibly
        // before the first run
        solver.clear();
        Ok(solver)
    }

    /// Grid width in cells
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of patterns in play
    pub const fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    /// Per-pattern prior weights
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The per-direction adjacency tables
    pub const fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Current superposition state
    pub const fn wave(&self) -> &Wave {
        &self.wave
    }

    /// The collapsed assignment, if the last run succeeded
    pub fn observed(&self) -> Option<&[usize]> {
        self.observed.as_deref()
    }

    /// Execute one full run: clear, install constraints, then iterate
    ///
    /// A `limit` of 0 iterates until success or contradiction.
    pub fn run<T: Topology + ?Sized>(
        &mut self,
        topology: &T,
        limit: usize,
        rng: &mut StdRng,
    ) -> RunStatus {
        self.clear();
        topology.after_clear(self);

        let mut iterations = 0;
        while limit == 0 || iterations < limit {
            match self.observe(topology, rng) {
                Observation::Finished => return RunStatus::Success,
                Observation::Dead => return RunStatus::Contradiction,
                Observation::Pending => self.propagate(topology),
            }
            iterations += 1;
        }

        RunStatus::Exhausted
    }

    /// Reset all per-run state to the fully-open superposition
    pub fn clear(&mut self) {
        self.wave.reset(
            &self.propagator,
            self.sum_of_weights,
            self.sum_of_weight_log_weights,
            self.starting_entropy,
        );
        self.stack.clear();
        self.observed = None;
    }

    /// Remove one candidate pattern from a cell and queue the consequence
    pub fn ban(&mut self, cell: usize, pattern: usize) {
        self.wave.retire(
            cell,
            pattern,
            self.weights[pattern],
            self.weight_log_weights[pattern],
        );
        self.stack.push((cell, pattern));
    }

    /// Collapse the lowest-entropy undecided cell
    fn observe<T: Topology + ?Sized>(&mut self, topology: &T, rng: &mut StdRng) -> Observation {
        let mut min = ENTROPY_SCAN_CEILING;
        let mut argmin = None;

        for cell in 0..self.width * self.height {
            let x = (cell % self.width) as i32;
            let y = (cell / self.width) as i32;
            if topology.on_boundary(x, y) {
                continue;
            }

            let remaining = self.wave.remaining(cell);
            if remaining == 0 {
                return Observation::Dead;
            }
            if remaining <= 1 {
                continue;
            }
            if self.wave.weight_sum(cell) == 0.0 {
                // Weight sum underflowed with live candidates left: the cell
                // can no longer be sampled, which is a contradiction.
                return Observation::Dead;
            }

            let entropy = self.wave.entropy(cell);
            if entropy >= min {
                continue;
            }
            let perturbed = entropy + ENTROPY_NOISE_SCALE * rng.random::<f64>();
            if perturbed < min {
                min = perturbed;
                argmin = Some(cell);
            }
        }

        let Some(target) = argmin else {
            // Fully settled: record the surviving pattern per cell
            let cells = self.width * self.height;
            let mut observed = vec![0; cells];
            for (cell, slot) in observed.iter_mut().enumerate() {
                *slot = self.wave.first_possible(cell).unwrap_or(0);
            }
            self.observed = Some(observed);
            return Observation::Finished;
        };

        for pattern in 0..self.pattern_count {
            self.distribution[pattern] = if self.wave.possible(target, pattern) {
                self.weights[pattern]
            } else {
                0.0
            };
        }
        let draw = rng.random::<f64>();
        let chosen = weighted_sample(&mut self.distribution, draw);

        for pattern in 0..self.pattern_count {
            if self.wave.possible(target, pattern) != (pattern == chosen) {
                self.ban(target, pattern);
            }
        }

        Observation::Pending
    }

    /// Drain the ban stack, withdrawing support from affected neighbours
    ///
    /// Each `(cell, pattern)` pair is banned at most once per run, so the
    /// loop terminates.
    pub fn propagate<T: Topology + ?Sized>(&mut self, topology: &T) {
        while let Some((cell, pattern)) = self.stack.pop() {
            let x1 = (cell % self.width) as i32;
            let y1 = (cell / self.width) as i32;

            for direction in 0..DIRECTION_COUNT {
                let x2 = x1 + DX[direction];
                let y2 = y1 + DY[direction];
                if topology.on_boundary(x2, y2) {
                    continue;
                }

                // Single wrap suffices: the step is at most one cell
                let x2 = x2.rem_euclid(self.width as i32) as usize;
                let y2 = y2.rem_euclid(self.height as i32) as usize;
                let neighbour = x2 + y2 * self.width;

                for index in 0..self.propagator.support_count(direction, pattern) {
                    let follower = self.propagator.supports(direction, pattern)[index];
                    if self.wave.decrement_support(neighbour, follower, direction) == 0 {
                        self.ban(neighbour, follower);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct OpenTorus;

    impl Topology for OpenTorus {
        fn on_boundary(&self, _x: i32, _y: i32) -> bool {
            false
        }
    }

    fn uniform_tables(pattern_count: usize) -> Propagator {
        let all: Vec<usize> = (0..pattern_count).collect();
        let table = vec![all; pattern_count];
        Propagator::new([table.clone(), table.clone(), table.clone(), table])
    }

    #[test]
    fn test_construction_rejects_empty_patterns() {
        let result = Solver::new(4, 4, Vec::new(), Propagator::new([vec![], vec![], vec![], vec![]]));
        assert!(result.is_err());
    }

    #[test]
    fn test_construction_rejects_nonpositive_weights() {
        let result = Solver::new(4, 4, vec![1.0, 0.0], uniform_tables(2));
        assert!(result.is_err());

        let result = Solver::new(4, 4, vec![1.0, -2.0], uniform_tables(2));
        assert!(result.is_err());
    }

    #[test]
    fn test_unconstrained_patterns_collapse_everywhere() {
        let mut solver = Solver::new(3, 3, vec![1.0, 2.0], uniform_tables(2)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let status = solver.run(&OpenTorus, 0, &mut rng);
        assert_eq!(status, RunStatus::Success);

        let observed = solver.observed().unwrap();
        assert_eq!(observed.len(), 9);
        for (cell, &pattern) in observed.iter().enumerate() {
            assert!(solver.wave().possible(cell, pattern));
            assert_eq!(solver.wave().remaining(cell), 1);
        }
    }

    #[test]
    fn test_ban_pushes_and_zeroes_support() {
        let mut solver = Solver::new(2, 2, vec![1.0, 1.0], uniform_tables(2)).unwrap();
        solver.clear();

        solver.ban(3, 1);
        assert!(!solver.wave().possible(3, 1));
        for direction in 0..DIRECTION_COUNT {
            assert_eq!(solver.wave().support(3, 1, direction), 0);
        }
        assert_eq!(solver.wave().remaining(3), 1);
    }

    #[test]
    fn test_limit_zero_iterations_reports_exhausted() {
        let mut solver = Solver::new(3, 3, vec![1.0, 1.0], uniform_tables(2)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        // One observation is never enough for a 3x3 grid of open cells, but
        // the first iteration must still run before the cap is checked.
        let status = solver.run(&OpenTorus, 1, &mut rng);
        assert_eq!(status, RunStatus::Exhausted);
        assert!(status.did_not_fail());
        assert!(solver.observed().is_none());
    }

    #[test]
    fn test_same_seed_reproduces_assignment() {
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);

        let mut solver_a = Solver::new(4, 4, vec![1.0, 2.0, 3.0], uniform_tables(3)).unwrap();
        let mut solver_b = solver_a.clone();

        assert_eq!(solver_a.run(&OpenTorus, 0, &mut rng_a), RunStatus::Success);
        assert_eq!(solver_b.run(&OpenTorus, 0, &mut rng_b), RunStatus::Success);
        assert_eq!(solver_a.observed(), solver_b.observed());
    }
}
