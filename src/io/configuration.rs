//! Runtime configuration defaults for the command-line tool

/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;

/// Default number of solver attempts per sample before reporting contradiction
pub const DEFAULT_TRIES: usize = 10;

/// Default iteration cap per attempt (0 = unlimited)
pub const DEFAULT_LIMIT: usize = 0;

/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_result";

/// Width of the batch progress bar in characters
pub const PROGRESS_BAR_WIDTH: usize = 40;
