use std::path::PathBuf;

use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
    // -- Preconditions
    #[display("number of clusters must be positive")]
    NoClusters,
    #[display("number of samples must be positive")]
    NoSamples,
    #[display("more clusters ({clusters}) than samples ({samples})")]
    TooManyClusters { clusters: usize, samples: usize },

    // -- Images
    #[display("image has no pixels: \"{}\"", path.display())]
    EmptyImage { path: PathBuf },
    #[display("failed to open file \"{}\": {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    // -- Clustering
    #[display("cannot create {requested} clusters from {points} points")]
    InvalidClusterCount { requested: usize, points: usize },
    #[display("no points to cluster")]
    EmptyInput,
    #[display("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    // -- Externals
    #[from]
    Io(std::io::Error),
    #[from]
    Pattern(glob::PatternError),
    #[from]
    Glob(glob::GlobError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            Error::Pattern(e) => Some(e),
            Error::Glob(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// True for rejected sample or cluster counts
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::NoClusters | Error::NoSamples | Error::TooManyClusters { .. }
        )
    }
}
