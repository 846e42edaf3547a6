use std::path::PathBuf;
use thiserror::Error;

use crate::engine::SyncAction;
use crate::resolver::Classification;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The candidate vanished between classification and action.
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Conversion failed for {}: {reason}", path.display())]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Remove found no derived file, even after reloading the index.
    #[error("Wallpaper not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{} is {classification}, cannot {action}", path.display())]
    NotEligible {
        path: PathBuf,
        action: SyncAction,
        classification: Classification,
    },

    #[error("{0}")]
    Other(String),
}
