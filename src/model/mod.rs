//! Model builders translating source material into solver configurations
//!
//! Both model flavours share the solver core; they differ in how the pattern
//! set and adjacency tables are derived, in the boundary predicate, and in
//! the constraints installed after each clear.

/// Overlapping N×N pattern extraction from a source image
pub mod overlapping;
/// Color deduplication for source pixels
pub mod palette;
/// Dihedral orientation groups
pub mod symmetry;
/// Declared tile sets with compiled edge adjacency
pub mod tiled;

use image::Rgba;
use rand::rngs::StdRng;

use crate::solver::RunStatus;

/// A configured synthesizer that can solve and render itself
///
/// The rendering half is the contract an external encoder consumes: a size
/// and a pixel lookup. Before a successful run the lookup reflects the
/// remaining superposition; afterwards it reflects the collapsed assignment.
pub trait Model {
    /// Execute one solver run with the given iteration cap
    fn run(&mut self, limit: usize, rng: &mut StdRng) -> RunStatus;

    /// Output image width in pixels
    fn width(&self) -> usize;

    /// Output image height in pixels
    fn height(&self) -> usize;

    /// Pixel color at `(x, y)`
    fn color_at(&self, x: usize, y: usize) -> Rgba<u8>;
}

/// Retry a model up to `tries` times, stopping at the first run that does
/// not contradict
///
/// Returns the final status: `Contradiction` only if every attempt hit one.
pub fn solve(
    model: &mut dyn Model,
    limit: usize,
    tries: usize,
    rng: &mut StdRng,
) -> RunStatus {
    let mut status = RunStatus::Contradiction;
    for _ in 0..tries {
        status = model.run(limit, rng);
        if status.did_not_fail() {
            return status;
        }
    }
    status
}
