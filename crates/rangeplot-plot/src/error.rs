use std::path::PathBuf;

/// Errors that can occur while driving the plot.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// Frame-level error (transport failure, not a malformed frame).
    #[error("frame error: {0}")]
    Frame(#[from] rangeplot_frame::FrameError),

    /// The render sink could not draw.
    #[error("render sink failed: {0}")]
    Sink(#[from] std::io::Error),

    /// Windows must hold at least one sample.
    #[error("window length must be at least 1 (got {0})")]
    InvalidWindowLength(usize),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::PlotConfig`].
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The background acquisition thread could not be started.
    #[error("failed to start acquisition thread: {0}")]
    Spawn(std::io::Error),

    /// The background acquisition thread panicked.
    #[error("acquisition thread panicked")]
    AcquisitionPanicked,
}

pub type Result<T> = std::result::Result<T, PlotError>;
