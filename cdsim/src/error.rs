//! Error taxonomy for the carrier drift engine.
//!
//! Only fatal conditions surface as [`SimError`]. Per-carrier events
//! (collection, loss, non-finite positions) are logged and queued for removal
//! instead of being returned as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("cannot find any carriers to simulate")]
    EmptyPopulation,

    #[error("carrier [{index}] is outside the lateral extent of the device at ({x}, {y}, {z})")]
    OutsideLateralExtent { index: usize, x: f64, y: f64, z: f64 },

    #[error("octree insertion of carrier [{index}] exceeded depth {depth}; positions are degenerate or nearly coincident")]
    TreeDepthExceeded { index: usize, depth: usize },

    #[error("carrier [{index}] lies outside the root octant")]
    OutsideTreeDomain { index: usize },

    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("csv line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("snapshot: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<csv::Error> for SimError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map_or(0, |p| p.line() as usize);
        let message = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(io) => SimError::Io(io),
            _ => SimError::Csv { line, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
