//! Wave function collapse texture and tile synthesizer
//!
//! Extracts overlapping patterns from a source image (or compiles a declared
//! tile set) into pairwise adjacency rules, then fills an output grid with an
//! entropy-guided observation/propagation loop until every cell holds exactly
//! one pattern or a contradiction is reached.

#![forbid(unsafe_code)]

/// Input/output operations, manifest parsing, and error handling
pub mod io;
/// Mathematical utilities for weighted sampling
pub mod math;
/// Model builders: overlapping pattern extraction and tiled adjacency compilation
pub mod model;
/// Constraint-propagation solver core
pub mod solver;

pub use io::error::{GenerationError, Result};
