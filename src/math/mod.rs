//! Mathematical utilities shared by the solver and model builders

/// Weighted sampling from unnormalised distributions
pub mod sampling;
