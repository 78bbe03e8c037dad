//! Entropy-guided observation/propagation solver
//!
//! The solver maintains a superposition of patterns per grid cell and
//! alternates between collapsing the lowest-entropy cell and propagating the
//! consequences through per-direction support counters until the grid is
//! fully determined or a cell runs out of candidates.

/// Solver state machine: observe, propagate, ban
pub mod engine;
/// Per-direction adjacency tables and grid directions
pub mod propagator;
/// Superposition bitmap with entropy bookkeeping
pub mod wave;

pub use engine::{RunStatus, Solver, Topology};
pub use propagator::{Propagator, DIRECTION_COUNT, DX, DY, OPPOSITE};
