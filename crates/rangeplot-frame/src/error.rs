use rangeplot_transport::TransportError;

use crate::channel::Channel;

/// Errors that can occur while decoding or encoding frames.
///
/// A malformed frame is not an error; see [`crate::FrameStatus`].
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No byte arrived within the source's read timeout.
    #[error("no data within read timeout")]
    Timeout,

    /// The byte source ended before a frame started.
    #[error("byte source closed")]
    ConnectionClosed,

    /// The transport failed for a reason other than timeout or end of stream.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// An I/O error occurred while writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A channel value cannot be expressed as two nibbles.
    #[error("{channel} value {value} does not fit the wire encoding (max 255)")]
    ValueOutOfRange { channel: Channel, value: u16 },
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => FrameError::Timeout,
            TransportError::Closed => FrameError::ConnectionClosed,
            TransportError::Io(io) => FrameError::Io(io),
            other => FrameError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
