use std::path::PathBuf;

use clap::ValueEnum;
use image::RgbImage;
use itertools::Itertools;
use tracing::{debug, info};

use crate::{
    Args, Error, Result,
    color_space::{self, Lab, Rgb},
    kmeans::{self, KMeans},
    random::{RandomSource, SeededRandom},
};

mod display;
mod io;

pub use display::format_entry;

/// One palette color and the share of samples it represents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    pub color: Rgb,
    /// Fraction of samples in (0, 1]
    pub proportion: f64,
}

/// Distance used to compare Lab samples while clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Metric {
    /// CIEDE2000 color difference
    #[default]
    Ciede2000,
    /// Euclidean distance in Lab (CIE76)
    Euclidean,
}

impl Metric {
    fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Ciede2000 => color_space::color_diff(&Lab::from_slice(a), &Lab::from_slice(b)),
            Metric::Euclidean => color_space::euclidean(a, b),
        }
    }
}

/// What to do when more clusters than samples are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusterPolicy {
    #[default]
    Reject,
    /// Lower the cluster count to the sample count
    Clamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteOptions {
    pub samples: usize,
    pub clusters: usize,
    pub metric: Metric,
    /// Zero means no cap
    pub max_iterations: usize,
    pub cluster_policy: ClusterPolicy,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            samples: 1000,
            clusters: 8,
            metric: Metric::default(),
            max_iterations: kmeans::DEFAULT_MAX_ITERATIONS,
            cluster_policy: ClusterPolicy::default(),
        }
    }
}

impl PaletteOptions {
    /// Check sample and cluster counts, returning the cluster count to use
    pub fn validate(&self) -> Result<usize> {
        if self.clusters < 1 {
            return Err(Error::NoClusters);
        }
        if self.samples < 1 {
            return Err(Error::NoSamples);
        }
        if self.clusters > self.samples {
            return match self.cluster_policy {
                ClusterPolicy::Reject => Err(Error::TooManyClusters {
                    clusters: self.clusters,
                    samples: self.samples,
                }),
                ClusterPolicy::Clamp => Ok(self.samples),
            };
        }
        Ok(self.clusters)
    }
}

/// Sample pixels, cluster them in Lab space and rank the clusters by size
///
/// Clusters that end up without members are left out, so fewer than the
/// requested number of entries may be returned. Entries are ordered by
/// descending proportion; equal sizes keep the clustering order.
pub fn extract_palette<R: RandomSource>(
    image: &RgbImage,
    options: &PaletteOptions,
    rng: &mut R,
) -> Result<Vec<PaletteEntry>> {
    let clusters = options.validate()?;
    let points = sample_lab_points(image, options.samples, rng)?;

    let metric = options.metric;
    let clustering = KMeans::new(&points, 3)?
        .with_max_iterations(options.max_iterations)
        .cluster(clusters, |a, b| metric.distance(a, b), rng)?;
    debug!(
        "clustered {} samples into {} clusters in {} iterations",
        points.len(),
        clustering.clusters.len(),
        clustering.iterations
    );

    let samples = options.samples as f64;
    let palette = clustering
        .clusters
        .into_iter()
        .sorted_by(|a, b| b.len().cmp(&a.len()))
        .filter(|cluster| !cluster.is_empty())
        .map(|cluster| PaletteEntry {
            color: color_space::lab_to_rgb(&Lab::from_slice(&cluster.centroid)),
            proportion: cluster.len() as f64 / samples,
        })
        .collect();
    Ok(palette)
}

/// Pick pixels uniformly at random, with replacement, as Lab points
fn sample_lab_points<R: RandomSource>(
    image: &RgbImage,
    samples: usize,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    let pixels = image.as_raw();
    let pixel_count = pixels.len() / 3;
    if pixel_count == 0 {
        return Err(Error::EmptyInput);
    }
    let points = (0..samples)
        .map(|_| {
            let index = rng.randint(0, pixel_count) * 3;
            let rgb = Rgb::from([pixels[index], pixels[index + 1], pixels[index + 2]]);
            color_space::rgb_to_lab(&rgb).to_array().to_vec()
        })
        .collect();
    Ok(points)
}

/// Extracts and prints the palette of a single image file
pub struct PaletteExtractor {
    file: PathBuf,
    options: PaletteOptions,
    seed: Option<u64>,
    pub colorful: bool,
    pub max_lines: Option<usize>,
}

impl PaletteExtractor {
    pub fn new(file: PathBuf, args: &Args) -> Self {
        Self {
            file,
            options: PaletteOptions {
                samples: args.sample,
                clusters: args.cluster,
                metric: args.metric,
                max_iterations: args.max_iterations,
                cluster_policy: match args.clamp_clusters {
                    true => ClusterPolicy::Clamp,
                    false => ClusterPolicy::Reject,
                },
            },
            // Negative seeds ask for a random seed
            seed: args.seed.and_then(|seed| u64::try_from(seed).ok()),
            colorful: args.color,
            max_lines: args.max_lines,
        }
    }

    pub fn with_options(file: PathBuf, options: PaletteOptions, seed: Option<u64>) -> Self {
        Self {
            file,
            options,
            seed,
            colorful: false,
            max_lines: None,
        }
    }

    /// Seed for the random source, `None` when seeded from entropy
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Validate options, decode the image and extract its palette
    pub fn process(&self) -> Result<Vec<PaletteEntry>> {
        // Bad counts are reported before the file is touched
        self.options.validate()?;

        let image = io::open_image(&self.file)?;
        info!(
            "{}: {}x{}, {} samples, {} clusters",
            self.file.display(),
            image.width(),
            image.height(),
            self.options.samples,
            self.options.clusters
        );

        let mut rng = SeededRandom::new(self.seed);
        extract_palette(&image, &self.options, &mut rng)
    }

    /// Format palette entries as output lines, honoring the line limit
    pub fn render(&self, palette: &[PaletteEntry]) -> Vec<String> {
        palette
            .iter()
            .take(self.max_lines.unwrap_or(usize::MAX))
            .map(|entry| format_entry(entry, self.colorful))
            .collect()
    }
}
