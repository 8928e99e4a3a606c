use std::path::PathBuf;

/// Failures that end the whole program. Connection problems are not in here:
/// losing the device is an expected part of a session's life, see
/// `session::SessionEnd`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to write output file {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to write CSV row: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("unable to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
