//! Overlapping-pattern model: N×N window extraction and overlap adjacency
//!
//! Every N×N window of the source image becomes a candidate pattern,
//! optionally augmented with its rotations and reflections under D₄. Two
//! patterns may sit next to each other exactly when their pixel grids agree
//! on the overlapping region, which yields the four directional adjacency
//! tables the solver propagates over.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use ndarray::Array2;
use rand::rngs::StdRng;

use crate::io::error::{invalid_parameter, invalid_source, Result};
use crate::model::palette::Palette;
use crate::model::Model;
use crate::solver::{Propagator, RunStatus, Solver, Topology, DIRECTION_COUNT, DX, DY};

/// Construction inputs for the overlapping model
#[derive(Debug, Clone)]
pub struct OverlappingOptions {
    /// Pattern window size
    pub n: usize,
    /// Output grid width in cells
    pub width: usize,
    /// Output grid height in cells
    pub height: usize,
    /// Treat the source image as a torus during extraction
    pub periodic_input: bool,
    /// Treat the output grid as a torus
    pub periodic_output: bool,
    /// Number of D₄ variants admitted per window, between 1 and 8
    pub symmetry: usize,
    /// Pattern pinned to the bottom row, taken modulo the pattern count;
    /// 0 disables the constraint
    pub ground: i32,
}

/// Boundary predicate and ground constraint for the overlapping grid
struct FringeTopology {
    n: usize,
    width: usize,
    height: usize,
    periodic: bool,
    ground: Option<usize>,
}

impl Topology for FringeTopology {
    fn on_boundary(&self, x: i32, y: i32) -> bool {
        !self.periodic
            && (x + self.n as i32 > self.width as i32
                || y + self.n as i32 > self.height as i32
                || x < 0
                || y < 0)
    }

    fn after_clear(&self, solver: &mut Solver) {
        let Some(ground) = self.ground else {
            return;
        };

        let bottom = self.height - 1;
        for x in 0..self.width {
            for pattern in 0..solver.pattern_count() {
                if pattern != ground {
                    solver.ban(x + bottom * self.width, pattern);
                }
            }
            for y in 0..bottom {
                solver.ban(x + y * self.width, ground);
            }
        }

        solver.propagate(self);
    }
}

/// Synthesizer over patterns extracted from a source image
pub struct OverlappingModel {
    solver: Solver,
    topology: FringeTopology,
    n: usize,
    patterns: Vec<Vec<u8>>,
    palette: Palette,
}

impl OverlappingModel {
    /// Extract patterns from `source` and compile the adjacency tables
    ///
    /// # Errors
    ///
    /// Returns an error if the window size, symmetry count, grid, or source
    /// dimensions are invalid, or if the source uses more than 256 distinct
    /// colors.
    pub fn new(source: &RgbaImage, options: &OverlappingOptions) -> Result<Self> {
        let n = options.n;
        if n == 0 {
            return Err(invalid_parameter(
                "n",
                &n,
                &"pattern window must be at least 1x1",
            ));
        }
        if options.symmetry == 0 || options.symmetry > 8 {
            return Err(invalid_parameter(
                "symmetry",
                &options.symmetry,
                &"must be between 1 and 8",
            ));
        }
        if options.width < n || options.height < n {
            return Err(invalid_parameter(
                "dimensions",
                &format!("{}x{}", options.width, options.height),
                &format!("output must fit at least one {n}x{n} window"),
            ));
        }

        let smx = source.width() as usize;
        let smy = source.height() as usize;
        if !options.periodic_input && (smx < n || smy < n) {
            return Err(invalid_source(&format!(
                "{smx}x{smy} source is smaller than the {n}x{n} pattern window"
            )));
        }

        let mut palette = Palette::new();
        let mut sample = Array2::<u8>::zeros((smx, smy));
        for y in 0..smy {
            for x in 0..smx {
                let index = palette.intern(*source.get_pixel(x as u32, y as u32));
                if index > usize::from(u8::MAX) {
                    return Err(invalid_source(&"source uses more than 256 distinct colors"));
                }
                sample[[x, y]] = index as u8;
            }
        }

        let (patterns, weights) = extract_patterns(&sample, n, options);
        let pattern_count = patterns.len();
        if pattern_count == 0 {
            return Err(invalid_source(&"no patterns could be extracted"));
        }

        let ground = match options.ground.rem_euclid(pattern_count as i32) as usize {
            0 => None,
            g => Some(g),
        };

        let mut lists: [Vec<Vec<usize>>; DIRECTION_COUNT] =
            std::array::from_fn(|_| Vec::with_capacity(pattern_count));
        for (direction, table) in lists.iter_mut().enumerate() {
            for t1 in 0..pattern_count {
                let allowed = (0..pattern_count)
                    .filter(|&t2| {
                        agrees(
                            &patterns[t1],
                            &patterns[t2],
                            DX[direction],
                            DY[direction],
                            n,
                        )
                    })
                    .collect();
                table.push(allowed);
            }
        }

        let solver = Solver::new(
            options.width,
            options.height,
            weights,
            Propagator::new(lists),
        )?;

        let topology = FringeTopology {
            n,
            width: options.width,
            height: options.height,
            periodic: options.periodic_output,
            ground,
        };

        Ok(Self {
            solver,
            topology,
            n,
            patterns,
            palette,
        })
    }

    /// The configured solver
    pub const fn solver(&self) -> &Solver {
        &self.solver
    }

    /// The deduplicated patterns, as palette-index grids
    pub fn patterns(&self) -> &[Vec<u8>] {
        &self.patterns
    }

    /// Whether a cell's pattern footprint escapes the output grid
    pub fn on_boundary(&self, x: i32, y: i32) -> bool {
        self.topology.on_boundary(x, y)
    }

    fn observed_color(&self, observed: &[usize], x: usize, y: usize) -> Rgba<u8> {
        let width = self.solver.width();
        let height = self.solver.height();

        // Cells in the last N-1 rows/columns read the tail of the final
        // full-footprint pattern instead of anchoring their own
        let dx = if x < width - self.n + 1 { 0 } else { self.n - 1 };
        let dy = if y < height - self.n + 1 { 0 } else { self.n - 1 };

        let pattern = observed[(x - dx) + (y - dy) * width];
        self.palette.color(self.patterns[pattern][dx + dy * self.n])
    }

    fn unobserved_color(&self, x: usize, y: usize) -> Rgba<u8> {
        let width = self.solver.width();
        let height = self.solver.height();
        let wave = self.solver.wave();

        let mut contributors = 0u32;
        let mut sums = [0u32; 4];

        for dy in 0..self.n {
            for dx in 0..self.n {
                let mut sx = x as i32 - dx as i32;
                let mut sy = y as i32 - dy as i32;
                if sx < 0 {
                    sx += width as i32;
                }
                if sy < 0 {
                    sy += height as i32;
                }
                if self.topology.on_boundary(sx, sy) {
                    continue;
                }

                let cell = sx as usize + sy as usize * width;
                for pattern in 0..self.solver.pattern_count() {
                    if wave.possible(cell, pattern) {
                        contributors += 1;
                        let color = self.palette.color(self.patterns[pattern][dx + dy * self.n]);
                        for (sum, channel) in sums.iter_mut().zip(color.0.iter()) {
                            *sum += u32::from(*channel);
                        }
                    }
                }
            }
        }

        if contributors == 0 {
            return Rgba([0, 0, 0, 0]);
        }

        let mut channels = [0u8; 4];
        for (slot, sum) in channels.iter_mut().zip(sums.iter()) {
            *slot = (sum / contributors) as u8;
        }
        Rgba(channels)
    }
}

impl Model for OverlappingModel {
    fn run(&mut self, limit: usize, rng: &mut StdRng) -> RunStatus {
        self.solver.run(&self.topology, limit, rng)
    }

    fn width(&self) -> usize {
        self.solver.width()
    }

    fn height(&self) -> usize {
        self.solver.height()
    }

    fn color_at(&self, x: usize, y: usize) -> Rgba<u8> {
        if let Some(observed) = self.solver.observed() {
            self.observed_color(observed, x, y)
        } else {
            self.unobserved_color(x, y)
        }
    }
}

/// Enumerate all admitted pattern variants and tally their frequencies
///
/// Patterns deduplicate on their byte content; weights count every
/// extraction that produced the pattern, including repeats within one
/// window's variant set.
fn extract_patterns(
    sample: &Array2<u8>,
    n: usize,
    options: &OverlappingOptions,
) -> (Vec<Vec<u8>>, Vec<f64>) {
    let (smx, smy) = sample.dim();
    let (scan_width, scan_height) = if options.periodic_input {
        (smx, smy)
    } else {
        (smx - n + 1, smy - n + 1)
    };

    let mut index_of: HashMap<Vec<u8>, usize> = HashMap::new();
    let mut patterns: Vec<Vec<u8>> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();

    for y in 0..scan_height {
        for x in 0..scan_width {
            let base = pattern_from(n, |dx, dy| sample[[(x + dx) % smx, (y + dy) % smy]]);
            let reflected = reflect(&base, n);
            let quarter = rotate(&base, n);
            let quarter_reflected = reflect(&quarter, n);
            let half = rotate(&quarter, n);
            let half_reflected = reflect(&half, n);
            let three_quarter = rotate(&half, n);
            let three_quarter_reflected = reflect(&three_quarter, n);

            let variants = [
                base,
                reflected,
                quarter,
                quarter_reflected,
                half,
                half_reflected,
                three_quarter,
                three_quarter_reflected,
            ];

            for variant in variants.into_iter().take(options.symmetry) {
                match index_of.entry(variant) {
                    Entry::Occupied(slot) => weights[*slot.get()] += 1.0,
                    Entry::Vacant(slot) => {
                        patterns.push(slot.key().clone());
                        weights.push(1.0);
                        slot.insert(patterns.len() - 1);
                    }
                }
            }
        }
    }

    (patterns, weights)
}

fn pattern_from<F: Fn(usize, usize) -> u8>(n: usize, pixel: F) -> Vec<u8> {
    let mut result = vec![0; n * n];
    for y in 0..n {
        for x in 0..n {
            result[x + y * n] = pixel(x, y);
        }
    }
    result
}

fn rotate(pattern: &[u8], n: usize) -> Vec<u8> {
    pattern_from(n, |x, y| pattern[n - 1 - y + x * n])
}

fn reflect(pattern: &[u8], n: usize) -> Vec<u8> {
    pattern_from(n, |x, y| pattern[n - 1 - x + y * n])
}

/// Whether two patterns agree on the region where their footprints overlap
/// when the second is offset by `(dx, dy)`
pub(crate) fn agrees(p1: &[u8], p2: &[u8], dx: i32, dy: i32, n: usize) -> bool {
    let n = n as i32;
    let (xmin, xmax) = if dx < 0 { (0, dx + n) } else { (dx, n) };
    let (ymin, ymax) = if dy < 0 { (0, dy + n) } else { (dy, n) };

    for y in ymin..ymax {
        for x in xmin..xmax {
            let own = (x + n * y) as usize;
            let other = (x - dx + n * (y - dy)) as usize;
            if p1[own] != p2[other] {
                return false;
            }
        }
    }
    true
}
