//! Tiled model: symmetry-orbit expansion and edge compilation
//!
//! A declared tile contributes one oriented variant per element of its
//! symmetry orbit. The action table records where every variant lands under
//! composed rotations and reflections, and each user-declared edge is closed
//! under those actions to fill the dense adjacency relation before it is
//! flattened into the solver's sparse tables.

use std::collections::HashMap;

use image::Rgba;
use rand::rngs::StdRng;

use crate::io::error::{invalid_parameter, invalid_source, GenerationError, Result};
use crate::io::manifest::TileSet;
use crate::model::symmetry::kernel;
use crate::model::Model;
use crate::solver::{Propagator, RunStatus, Solver, Topology, DIRECTION_COUNT};

/// Flat row-major pixel grid of one oriented tile
pub type TilePixels = Vec<Rgba<u8>>;

/// Construction inputs for the tiled model
#[derive(Debug, Clone, Copy)]
pub struct TiledOptions {
    /// Output grid width in tiles
    pub width: usize,
    /// Output grid height in tiles
    pub height: usize,
    /// Treat the output grid as a torus
    pub periodic: bool,
    /// Render fully-undecided cells as black instead of averaging
    pub black: bool,
}

/// Rectangular boundary predicate for the tiled grid
struct RectTopology {
    width: usize,
    height: usize,
    periodic: bool,
}

impl Topology for RectTopology {
    fn on_boundary(&self, x: i32, y: i32) -> bool {
        !self.periodic && (x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32)
    }
}

/// Synthesizer over a declared tile set with compiled edge adjacency
pub struct TiledModel {
    solver: Solver,
    topology: RectTopology,
    tile_size: usize,
    tiles: Vec<TilePixels>,
    tile_names: Vec<String>,
    black: bool,
}

impl TiledModel {
    /// Expand symmetry orbits and compile declared edges into adjacency
    ///
    /// `images[i]` holds the decoded pixel grids for tile `i`: one per
    /// orientation when the tile is `unique`, a single base image otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile list is empty, a weight is not strictly
    /// positive, an image count or size disagrees with the declaration, or
    /// an edge names an undeclared tile or an unparsable orientation.
    pub fn new(set: &TileSet, images: &[Vec<TilePixels>], options: &TiledOptions) -> Result<Self> {
        let size = set.size;
        if size == 0 {
            return Err(invalid_parameter("size", &size, &"tile size must be positive"));
        }
        if set.tiles.is_empty() {
            return Err(invalid_source(&"tile set declares no tiles"));
        }
        if images.len() != set.tiles.len() {
            return Err(invalid_source(&format!(
                "{} image groups supplied for {} tiles",
                images.len(),
                set.tiles.len()
            )));
        }

        let mut action: Vec<[usize; 8]> = Vec::new();
        let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
        let mut tiles: Vec<TilePixels> = Vec::new();
        let mut tile_names: Vec<String> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        for (tile, provided) in set.tiles.iter().zip(images.iter()) {
            if !(tile.weight > 0.0) {
                return Err(invalid_parameter(
                    "weight",
                    &tile.weight,
                    &format!("tile '{}' must have a strictly positive weight", tile.name),
                ));
            }

            let orbit = kernel(&tile.symmetry);
            let cardinality = orbit.cardinality;
            let base = action.len();
            first_occurrence.insert(tile.name.as_str(), base);

            for orientation in 0..cardinality {
                let quarter = orbit.rotate(orientation);
                let half = orbit.rotate(quarter);
                let three_quarter = orbit.rotate(half);
                action.push([
                    base + orientation,
                    base + quarter,
                    base + half,
                    base + three_quarter,
                    base + orbit.reflect(orientation),
                    base + orbit.reflect(quarter),
                    base + orbit.reflect(half),
                    base + orbit.reflect(three_quarter),
                ]);
            }

            let required = if tile.unique { cardinality } else { 1 };
            if provided.len() < required {
                return Err(invalid_source(&format!(
                    "tile '{}' needs {} image(s), {} supplied",
                    tile.name,
                    required,
                    provided.len()
                )));
            }
            for pixels in provided.iter().take(required) {
                if pixels.len() != size * size {
                    return Err(invalid_source(&format!(
                        "tile '{}' image does not match declared size {size}x{size}",
                        tile.name
                    )));
                }
            }

            if tile.unique {
                for (orientation, pixels) in provided.iter().take(cardinality).enumerate() {
                    tiles.push(pixels.clone());
                    tile_names.push(format!("{} {orientation}", tile.name));
                }
            } else {
                tiles.push(provided[0].clone());
                tile_names.push(format!("{} 0", tile.name));
                for orientation in 1..cardinality {
                    let rotated = rotate_tile(&tiles[base + orientation - 1], size);
                    tiles.push(rotated);
                    tile_names.push(format!("{} {orientation}", tile.name));
                }
            }

            for _ in 0..cardinality {
                weights.push(tile.weight);
            }
        }

        let pattern_count = action.len();
        let propagator = compile_edges(set, &action, &first_occurrence, pattern_count)?;

        let solver = Solver::new(options.width, options.height, weights, propagator)?;

        Ok(Self {
            solver,
            topology: RectTopology {
                width: options.width,
                height: options.height,
                periodic: options.periodic,
            },
            tile_size: size,
            tiles,
            tile_names,
            black: options.black,
        })
    }

    /// The configured solver
    pub const fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Human-readable names per oriented variant
    pub fn tile_names(&self) -> &[String] {
        &self.tile_names
    }

    fn observed_color(&self, observed: &[usize], x: usize, y: usize) -> Rgba<u8> {
        let tx = x / self.tile_size;
        let ty = y / self.tile_size;
        let xt = x % self.tile_size;
        let yt = y % self.tile_size;

        let tile = &self.tiles[observed[tx + ty * self.solver.width()]];
        tile[xt + yt * self.tile_size]
    }

    fn unobserved_color(&self, x: usize, y: usize) -> Rgba<u8> {
        let tx = x / self.tile_size;
        let ty = y / self.tile_size;
        let xt = x % self.tile_size;
        let yt = y % self.tile_size;

        let cell = tx + ty * self.solver.width();
        let wave = self.solver.wave();
        let pattern_count = self.solver.pattern_count();

        if self.black && wave.remaining(cell) == pattern_count {
            return Rgba([0, 0, 0, 255]);
        }

        // Weighted average over the surviving variants, normalised to unit sum
        let lambda = 1.0 / wave.weight_sum(cell);
        let weights = self.solver.weights();
        let mut channels = [0.0f64; 4];

        for pattern in 0..pattern_count {
            if wave.possible(cell, pattern) {
                let color = self.tiles[pattern][xt + yt * self.tile_size];
                for (sum, channel) in channels.iter_mut().zip(color.0.iter()) {
                    *sum += f64::from(*channel) * weights[pattern] * lambda;
                }
            }
        }

        Rgba(channels.map(|sum| sum as u8))
    }
}

impl Model for TiledModel {
    fn run(&mut self, limit: usize, rng: &mut StdRng) -> RunStatus {
        self.solver.run(&self.topology, limit, rng)
    }

    fn width(&self) -> usize {
        self.solver.width() * self.tile_size
    }

    fn height(&self) -> usize {
        self.solver.height() * self.tile_size
    }

    fn color_at(&self, x: usize, y: usize) -> Rgba<u8> {
        if let Some(observed) = self.solver.observed() {
            self.observed_color(observed, x, y)
        } else {
            self.unobserved_color(x, y)
        }
    }
}

/// Split an edge endpoint into its tile name and orientation index
fn parse_endpoint(text: &str) -> Result<(&str, usize)> {
    let mut parts = text.split(' ');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(GenerationError::MalformedEdge {
            endpoint: text.to_string(),
            reason: "missing tile name".to_string(),
        });
    }

    let cardinal = match parts.next() {
        None => 0,
        Some(raw) => raw.parse().map_err(|_| GenerationError::MalformedEdge {
            endpoint: text.to_string(),
            reason: format!("orientation '{raw}' is not a number"),
        })?,
    };
    if cardinal >= 8 {
        return Err(GenerationError::MalformedEdge {
            endpoint: text.to_string(),
            reason: "orientation index must be below 8".to_string(),
        });
    }
    if parts.next().is_some() {
        return Err(GenerationError::MalformedEdge {
            endpoint: text.to_string(),
            reason: "expected 'name' or 'name orientation'".to_string(),
        });
    }

    Ok((name, cardinal))
}

/// Translate declared edges into the four sparse adjacency tables
///
/// Each edge asserts the west→east clause for its endpoints and the three
/// images of that clause under the symmetry actions; the south→north table
/// uses the rotated variants, and the remaining two directions are the
/// transposes.
fn compile_edges(
    set: &TileSet,
    action: &[[usize; 8]],
    first_occurrence: &HashMap<&str, usize>,
    pattern_count: usize,
) -> Result<Propagator> {
    let mut dense: [Vec<Vec<bool>>; DIRECTION_COUNT] =
        std::array::from_fn(|_| vec![vec![false; pattern_count]; pattern_count]);

    for [left, right] in &set.edges {
        let (left_name, left_cardinal) = parse_endpoint(left)?;
        let (right_name, right_cardinal) = parse_endpoint(right)?;

        let left_base = *first_occurrence
            .get(left_name)
            .ok_or_else(|| GenerationError::UnknownTile {
                name: left_name.to_string(),
            })?;
        let right_base = *first_occurrence
            .get(right_name)
            .ok_or_else(|| GenerationError::UnknownTile {
                name: right_name.to_string(),
            })?;

        let l = action[left_base][left_cardinal];
        let r = action[right_base][right_cardinal];
        let d = action[l][1];
        let u = action[r][1];

        dense[0][r][l] = true;
        dense[0][action[r][6]][action[l][6]] = true;
        dense[0][action[l][4]][action[r][4]] = true;
        dense[0][action[l][2]][action[r][2]] = true;

        dense[1][u][d] = true;
        dense[1][action[d][6]][action[u][6]] = true;
        dense[1][action[u][4]][action[d][4]] = true;
        dense[1][action[d][2]][action[u][2]] = true;
    }

    for t1 in 0..pattern_count {
        for t2 in 0..pattern_count {
            dense[2][t2][t1] = dense[0][t1][t2];
            dense[3][t2][t1] = dense[1][t1][t2];
        }
    }

    let lists = dense.map(|table| {
        table
            .iter()
            .map(|row| {
                (0..pattern_count)
                    .filter(|&candidate| row[candidate])
                    .collect()
            })
            .collect()
    });

    Ok(Propagator::new(lists))
}

fn rotate_tile(pixels: &TilePixels, size: usize) -> TilePixels {
    let mut rotated = vec![Rgba([0, 0, 0, 0]); size * size];
    for y in 0..size {
        for x in 0..size {
            rotated[x + y * size] = pixels[size - 1 - y + x * size];
        }
    }
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::manifest::TileDef;

    fn solid(size: usize, color: Rgba<u8>) -> TilePixels {
        vec![color; size * size]
    }

    fn tile_def(name: &str, symmetry: &str, weight: f64) -> TileDef {
        TileDef {
            name: name.to_string(),
            symmetry: symmetry.to_string(),
            unique: false,
            weight,
            files: Vec::new(),
        }
    }

    fn pair_set(edges: Vec<[String; 2]>) -> TileSet {
        TileSet {
            size: 2,
            tiles: vec![tile_def("white", "X", 1.0), tile_def("black", "X", 1.0)],
            edges,
        }
    }

    fn options() -> TiledOptions {
        TiledOptions {
            width: 4,
            height: 4,
            periodic: false,
            black: false,
        }
    }

    #[test]
    fn test_endpoint_parsing() {
        assert_eq!(parse_endpoint("corner").unwrap(), ("corner", 0));
        assert_eq!(parse_endpoint("corner 3").unwrap(), ("corner", 3));
        assert!(parse_endpoint("").is_err());
        assert!(parse_endpoint("corner x").is_err());
        assert!(parse_endpoint("corner 8").is_err());
        assert!(parse_endpoint("corner 1 2").is_err());
    }

    #[test]
    fn test_rotate_tile_quarter_turn() {
        let a = Rgba([1, 0, 0, 255]);
        let b = Rgba([2, 0, 0, 255]);
        let c = Rgba([3, 0, 0, 255]);
        let d = Rgba([4, 0, 0, 255]);
        // [a b / c d] becomes [b d / a c]
        let rotated = rotate_tile(&vec![a, b, c, d], 2);
        assert_eq!(rotated, vec![b, d, a, c]);
    }

    #[test]
    fn test_corner_orbit_action_table() {
        let set = TileSet {
            size: 2,
            tiles: vec![tile_def("corner", "L", 1.0)],
            edges: vec![["corner".to_string(), "corner 1".to_string()]],
        };
        let images = vec![vec![solid(2, Rgba([9, 9, 9, 255]))]];
        let model = TiledModel::new(&set, &images, &options()).unwrap();

        // Four oriented variants, all named after the one declared tile
        assert_eq!(model.solver().pattern_count(), 4);
        assert_eq!(model.tile_names()[0], "corner 0");
        assert_eq!(model.tile_names()[3], "corner 3");
        assert_eq!(model.solver().weights(), &[1.0; 4]);
    }

    #[test]
    fn test_unknown_tile_in_edge_is_rejected() {
        let set = pair_set(vec![["white".to_string(), "grey".to_string()]]);
        let images = vec![
            vec![solid(2, Rgba([255, 255, 255, 255]))],
            vec![solid(2, Rgba([0, 0, 0, 255]))],
        ];
        let result = TiledModel::new(&set, &images, &options());
        assert!(matches!(result, Err(GenerationError::UnknownTile { .. })));
    }

    #[test]
    fn test_nonpositive_weight_is_rejected() {
        let mut set = pair_set(vec![["white".to_string(), "black".to_string()]]);
        set.tiles[1].weight = 0.0;
        let images = vec![
            vec![solid(2, Rgba([255, 255, 255, 255]))],
            vec![solid(2, Rgba([0, 0, 0, 255]))],
        ];
        assert!(TiledModel::new(&set, &images, &options()).is_err());
    }

    #[test]
    fn test_wrong_image_size_is_rejected() {
        let set = pair_set(vec![["white".to_string(), "black".to_string()]]);
        let images = vec![
            vec![solid(3, Rgba([255, 255, 255, 255]))],
            vec![solid(2, Rgba([0, 0, 0, 255]))],
        ];
        assert!(TiledModel::new(&set, &images, &options()).is_err());
    }

    #[test]
    fn test_empty_tile_set_is_rejected() {
        let set = TileSet {
            size: 2,
            tiles: Vec::new(),
            edges: Vec::new(),
        };
        assert!(TiledModel::new(&set, &[], &options()).is_err());
    }

    #[test]
    fn test_edge_clause_is_transposed_into_reverse_directions() {
        let set = pair_set(vec![["white".to_string(), "black".to_string()]]);
        let images = vec![
            vec![solid(2, Rgba([255, 255, 255, 255]))],
            vec![solid(2, Rgba([0, 0, 0, 255]))],
        ];
        let model = TiledModel::new(&set, &images, &options()).unwrap();
        let tables = model.solver().propagator();

        for direction in 0..DIRECTION_COUNT {
            let opposite = crate::solver::OPPOSITE[direction];
            for t1 in 0..2 {
                for t2 in 0..2 {
                    let forward = tables.supports(direction, t1).contains(&t2);
                    let backward = tables.supports(opposite, t2).contains(&t1);
                    assert_eq!(forward, backward);
                }
            }
        }
    }
}
