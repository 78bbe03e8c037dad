//! CLI entry point for batch wave function collapse generation

use clap::Parser;
use wavetile::io::cli::{BatchProcessor, Cli};

fn main() -> wavetile::Result<()> {
    let cli = Cli::parse();
    let processor = BatchProcessor::new(cli);
    processor.process()
}
