use std::io::ErrorKind;

use crate::error::{Result, TransportError};

/// A source of raw sensor bytes, read one at a time.
///
/// Reads block for at most the source's configured timeout and report
/// [`TransportError::Timeout`] instead of hanging.
pub trait ByteSource {
    /// Read exactly one byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Drop every byte currently buffered on the source.
    ///
    /// Returns how many bytes were discarded, when the source can tell.
    fn discard_input(&mut self) -> Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }
}

/// Map an I/O error from a single-byte read onto the transport taxonomy.
///
/// Returns `None` for `Interrupted`, which callers retry.
pub(crate) fn classify_read_error(err: std::io::Error) -> Option<TransportError> {
    match err.kind() {
        ErrorKind::Interrupted => None,
        ErrorKind::TimedOut | ErrorKind::WouldBlock => Some(TransportError::Timeout),
        ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe => Some(TransportError::Closed),
        _ => Some(TransportError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;

    fn pull_two<S: ByteSource>(mut source: S) -> (u8, u8) {
        (source.read_byte().unwrap(), source.read_byte().unwrap())
    }

    #[test]
    fn boxed_and_borrowed_sources_delegate() {
        let mut source = MemorySource::from_bytes([1, 2, 3, 4]);
        assert_eq!(pull_two(&mut source), (1, 2));

        let boxed: Box<dyn ByteSource> = Box::new(source);
        assert_eq!(pull_two(boxed), (3, 4));
    }

    #[test]
    fn read_errors_are_classified() {
        assert!(classify_read_error(std::io::Error::from(ErrorKind::Interrupted)).is_none());
        assert!(matches!(
            classify_read_error(std::io::Error::from(ErrorKind::TimedOut)),
            Some(TransportError::Timeout)
        ));
        assert!(matches!(
            classify_read_error(std::io::Error::from(ErrorKind::WouldBlock)),
            Some(TransportError::Timeout)
        ));
        assert!(matches!(
            classify_read_error(std::io::Error::from(ErrorKind::BrokenPipe)),
            Some(TransportError::Closed)
        ));
        assert!(matches!(
            classify_read_error(std::io::Error::from(ErrorKind::PermissionDenied)),
            Some(TransportError::Io(_))
        ));
    }
}
