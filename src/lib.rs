//! Generate a color scheme from images.
//!
//! Pixels are sampled at random, converted to CIE Lab and grouped with
//! k-means using the CIEDE2000 color difference. Each cluster becomes one
//! palette color, weighted by the share of samples it holds.

pub use self::error::{Error, Result};

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use wild::ArgsOs;

pub use extractor::{
    ClusterPolicy, Metric, PaletteEntry, PaletteExtractor, PaletteOptions, extract_palette,
    format_entry,
};

mod arg_validators;
pub mod color_space;
mod error;
mod extractor;
pub mod kmeans;
pub mod random;

#[derive(Parser, Debug)]
#[command(version, about = "Generate color scheme from image, based on k-means algorithm", long_about = None)]
pub struct Args {
    /// Input image files or glob patterns
    #[arg(required(true))]
    files: Vec<String>,
    /// Sample size
    #[arg(long, default_value_t = 1000, value_parser = arg_validators::validate_positive_count)]
    sample: usize,
    /// Number of clusters for k-means algorithm
    #[arg(long, default_value_t = 8, value_parser = arg_validators::validate_positive_count)]
    cluster: usize,
    /// RNG seed, negative for random seed
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,
    /// Enable colorful printing
    #[arg(short, long, default_value_t = false)]
    color: bool,
    /// Maximum number of colors printed per image
    #[arg(short('n'), long)]
    max_lines: Option<usize>,
    /// Color difference used for clustering
    #[arg(short, long, value_enum, default_value_t = Metric::Ciede2000)]
    metric: Metric,
    /// Maximum k-means iterations (0 for no limit)
    #[arg(long, default_value_t = kmeans::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Lower the cluster count to the sample size instead of failing
    #[arg(long, default_value_t = false)]
    clamp_clusters: bool,
    /// Verbose messages
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

pub fn run(args: ArgsOs) -> Result<()> {
    let args = Args::parse_from(args);
    init_logging(args.verbose);

    let files = expand_file_patterns(&args.files)?;
    let show_file_names = files.len() > 1;
    for file in files {
        let palette_extractor = PaletteExtractor::new(file.to_owned(), &args);
        let palette = palette_extractor.process()?;
        if show_file_names {
            println!("{}:", file.display());
        }
        for line in palette_extractor.render(&palette) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Log to stderr so palette output stays clean
fn init_logging(verbose: bool) {
    let level = match verbose {
        true => Level::DEBUG,
        false => Level::WARN,
    };
    // Only fails if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Expand glob patterns, keeping plain paths that match nothing so they fail to decode by name
fn expand_file_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        for file in glob::glob(pattern)? {
            files.push(file?);
            matched = true;
        }
        if !matched {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}
