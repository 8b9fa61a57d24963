use std::collections::VecDeque;

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::ByteSource;

/// Scripted in-memory byte source.
///
/// Everything fed in counts as "currently buffered": reading from an empty
/// source reports [`TransportError::Timeout`] (like an idle serial line), and
/// [`MemorySource::close`] turns that into [`TransportError::Closed`] once
/// the queue runs dry.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    pending: VecDeque<u8>,
    closed: bool,
    bytes_read: u64,
}

impl MemorySource {
    /// Create an empty, open source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-loaded with `bytes`.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let mut source = Self::new();
        source.feed(bytes);
        source
    }

    /// Append bytes as if they had just arrived on the wire.
    pub fn feed(&mut self, bytes: impl AsRef<[u8]>) {
        self.pending.extend(bytes.as_ref().iter().copied());
    }

    /// Mark the source as ended; remaining bytes can still be read.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Bytes waiting to be read.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total bytes handed out by `read_byte`.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl ByteSource for MemorySource {
    fn read_byte(&mut self) -> Result<u8> {
        match self.pending.pop_front() {
            Some(byte) => {
                self.bytes_read += 1;
                Ok(byte)
            }
            None if self.closed => Err(TransportError::Closed),
            None => Err(TransportError::Timeout),
        }
    }

    fn discard_input(&mut self) -> Result<usize> {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            trace!(dropped, "discarded buffered input");
        }
        Ok(dropped)
    }
}
