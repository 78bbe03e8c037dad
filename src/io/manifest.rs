//! JSON descriptors for batch samples and tile sets

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::io::error::{GenerationError, Result};

/// Which model a sample drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// Patterns extracted from a source image
    Overlapping,
    /// A declared tile set descriptor
    Tiled,
}

/// One entry of the batch manifest
///
/// `pattern` names the source image (overlapping) or the tile set descriptor
/// (tiled), relative to the manifest file. The zero-values of the reference
/// format would produce empty models, so `n` and `symmetry` default to the
/// smallest useful settings instead.
#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    /// Model flavour
    #[serde(rename = "type")]
    pub kind: SampleKind,
    /// Input file, relative to the manifest
    pub pattern: String,
    /// Output grid width in cells
    pub width: usize,
    /// Output grid height in cells
    pub height: usize,
    /// Pattern window size (overlapping only)
    #[serde(default = "default_window")]
    pub n: usize,
    /// Treat the source image as a torus (overlapping only)
    #[serde(default)]
    pub periodic_in: bool,
    /// Treat the output grid as a torus
    #[serde(default)]
    pub periodic_out: bool,
    /// Number of D₄ variants admitted per window, 1 to 8 (overlapping only)
    #[serde(default = "default_symmetry")]
    pub symmetry: usize,
    /// Pattern pinned to the bottom row; 0 disables (overlapping only)
    #[serde(default)]
    pub ground: i32,
    /// Render undecided cells as black (tiled only)
    #[serde(default)]
    pub black: bool,
}

const fn default_window() -> usize {
    2
}

const fn default_symmetry() -> usize {
    1
}

/// One declared tile of a tile set
#[derive(Debug, Clone, Deserialize)]
pub struct TileDef {
    /// Name referenced by edges
    pub name: String,
    /// Symmetry symbol: `L`, `T`, `I`, `\` or anything else for none
    #[serde(default)]
    pub symmetry: String,
    /// Whether pre-rotated images are supplied per orientation
    #[serde(default)]
    pub unique: bool,
    /// Prior weight shared by every orientation
    pub weight: f64,
    /// Image files, relative to the descriptor
    pub files: Vec<String>,
}

/// A tile set descriptor: tile declarations plus allowed edges
#[derive(Debug, Clone, Deserialize)]
pub struct TileSet {
    /// Tile edge length in pixels
    pub size: usize,
    /// Declared tiles
    pub tiles: Vec<TileDef>,
    /// Allowed west→east adjacencies as `"name"` or `"name orientation"`
    /// endpoint pairs
    pub edges: Vec<[String; 2]>,
}

/// Load the batch manifest: a JSON array of samples
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    parse_json(path)
}

/// Load a tile set descriptor
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn load_tile_set(path: &Path) -> Result<TileSet> {
    parse_json(path)
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| GenerationError::ManifestRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| GenerationError::ManifestParse {
        path: path.to_path_buf(),
        source: e,
    })
}
