use std::io::Read;

use crate::error::{Result, TransportError};
use crate::traits::{classify_read_error, ByteSource};

/// Byte source over any `Read` stream, such as a captured wire dump.
///
/// A replayed stream has no notion of "buffered input", so
/// [`ByteSource::discard_input`] leaves it untouched. End of stream maps to
/// [`TransportError::Closed`].
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the source and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(buf[0]),
                Err(err) => {
                    if let Some(err) = classify_read_error(err) {
                        return Err(err);
                    }
                }
            }
        }
    }

    fn discard_input(&mut self) -> Result<usize> {
        Ok(0)
    }
}

impl<R> std::fmt::Debug for ReaderSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSource").finish_non_exhaustive()
    }
}
