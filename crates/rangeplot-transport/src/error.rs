/// Errors that can occur while pulling bytes from a source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named serial port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// The serial driver rejected a control operation (clear, query).
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No byte arrived within the configured read timeout.
    #[error("no data within read timeout")]
    Timeout,

    /// The source reached its end and will not produce more bytes.
    #[error("source closed")]
    Closed,
}

impl TransportError {
    /// True when the error only means "nothing arrived yet".
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }

    /// True when the OS refused access to the port.
    pub fn is_permission_denied(&self) -> bool {
        let denied = std::io::ErrorKind::PermissionDenied;
        match self {
            TransportError::Open { source, .. } | TransportError::Serial(source) => {
                source.kind() == serialport::ErrorKind::Io(denied)
            }
            TransportError::Io(err) => err.kind() == denied,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
