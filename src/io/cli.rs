//! Command-line interface for batch sample generation
//!
//! Processes a JSON manifest of samples, building and solving one model per
//! entry. Samples are independent, so the batch fans out across a thread
//! pool by default; each sample gets its own deterministic seed derived from
//! the base seed and its manifest position.

use std::path::{Path, PathBuf};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::io::configuration::{DEFAULT_LIMIT, DEFAULT_SEED, DEFAULT_TRIES, OUTPUT_SUFFIX};
use crate::io::error::{GenerationError, Result};
use crate::io::image::{export_png, load_rgba, load_tile_images};
use crate::io::manifest::{self, Sample, SampleKind};
use crate::io::progress::ProgressManager;
use crate::model::overlapping::{OverlappingModel, OverlappingOptions};
use crate::model::tiled::{TiledModel, TiledOptions};
use crate::model::{self, Model};

/// Command-line arguments for the generation tool
#[derive(Parser)]
#[command(name = "wavetile")]
#[command(
    author,
    version,
    about = "Generate textures and tile maps with wave function collapse"
)]
pub struct Cli {
    /// JSON manifest listing the samples to generate
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Base random seed for reproducible generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of solver attempts per sample before giving up
    #[arg(short, long, default_value_t = DEFAULT_TRIES)]
    pub tries: usize,

    /// Iteration cap per attempt (0 = unlimited)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Process samples one at a time instead of in parallel
    #[arg(long)]
    pub serial: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Runs every sample of a manifest and reports the failures
pub struct BatchProcessor {
    cli: Cli,
}

impl BatchProcessor {
    /// Create a processor for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Process the manifest
    ///
    /// Per-sample failures are reported and do not abort the rest of the
    /// batch; only a failure to read the manifest itself is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or parsed.
    // Per-sample failures go to stderr so the batch can keep running
    #[allow(clippy::print_stderr)]
    pub fn process(&self) -> Result<()> {
        let samples = manifest::load_samples(&self.cli.manifest)?;
        if samples.is_empty() {
            return Ok(());
        }

        let dir = self
            .cli
            .manifest
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let progress = (!self.cli.quiet).then(|| ProgressManager::new(samples.len()));

        let run_one = |(index, sample): (usize, &Sample)| {
            let outcome = self.execute_sample(sample, &dir, self.cli.seed + index as u64);
            if let Some(ref bar) = progress {
                bar.sample_done(&sample.pattern);
            }
            (sample.pattern.clone(), outcome)
        };

        let outcomes: Vec<(String, Result<()>)> = if self.cli.serial {
            samples.iter().enumerate().map(run_one).collect()
        } else {
            samples.par_iter().enumerate().map(run_one).collect()
        };

        if let Some(ref bar) = progress {
            bar.finish();
        }

        for (name, outcome) in &outcomes {
            if let Err(error) = outcome {
                eprintln!("{name}: {error}");
            }
        }

        Ok(())
    }

    fn execute_sample(&self, sample: &Sample, dir: &Path, seed: u64) -> Result<()> {
        let input = dir.join(&sample.pattern);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut built: Box<dyn Model> = match sample.kind {
            SampleKind::Overlapping => {
                let source = load_rgba(&input)?;
                Box::new(OverlappingModel::new(
                    &source,
                    &OverlappingOptions {
                        n: sample.n,
                        width: sample.width,
                        height: sample.height,
                        periodic_input: sample.periodic_in,
                        periodic_output: sample.periodic_out,
                        symmetry: sample.symmetry,
                        ground: sample.ground,
                    },
                )?)
            }
            SampleKind::Tiled => {
                let set = manifest::load_tile_set(&input)?;
                let tile_dir = input.parent().unwrap_or(dir);
                let images = set
                    .tiles
                    .iter()
                    .map(|tile| load_tile_images(tile_dir, tile, set.size))
                    .collect::<Result<Vec<_>>>()?;
                Box::new(TiledModel::new(
                    &set,
                    &images,
                    &TiledOptions {
                        width: sample.width,
                        height: sample.height,
                        periodic: sample.periodic_out,
                        black: sample.black,
                    },
                )?)
            }
        };

        let status = model::solve(built.as_mut(), self.cli.limit, self.cli.tries, &mut rng);
        if !status.did_not_fail() {
            return Err(GenerationError::Contradiction {
                sample: sample.pattern.clone(),
                tries: self.cli.tries,
            });
        }

        export_png(built.as_ref(), &output_path(&input))
    }
}

/// Derive the output path: the input stem plus the result suffix, always PNG
fn output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let output_name = format!("{}{}.png", stem.to_string_lossy(), OUTPUT_SUFFIX);

    input
        .parent()
        .map_or_else(|| PathBuf::from(&output_name), |parent| parent.join(&output_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_extension() {
        let output = output_path(Path::new("samples/flowers.png"));
        assert_eq!(output, PathBuf::from("samples/flowers_result.png"));

        let output = output_path(Path::new("samples/castle.json"));
        assert_eq!(output, PathBuf::from("samples/castle_result.png"));
    }
}
