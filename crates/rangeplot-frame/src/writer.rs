use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_sample, Sample, FRAME_LEN, TERMINATOR};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    terminator: u8,
    frames_written: u64,
}

impl<T: Write> FrameWriter<T> {
    /// Create a writer using the standard terminator.
    pub fn new(inner: T) -> Self {
        Self::with_terminator(inner, TERMINATOR)
    }

    /// Create a writer with an explicit terminator byte.
    pub fn with_terminator(inner: T, terminator: u8) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(FRAME_LEN),
            terminator,
            frames_written: 0,
        }
    }

    /// Encode and send one sample.
    pub fn send_sample(&mut self, sample: &Sample) -> Result<()> {
        self.buf.clear();
        encode_sample(sample, self.terminator, &mut self.buf)?;
        self.write_buffered()
    }

    /// Send raw payload bytes followed by the terminator.
    ///
    /// Payload bytes are written as given, including values outside the
    /// nibble range.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(payload);
        self.buf.extend_from_slice(&[self.terminator]);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.frames_written += 1;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Frames fully written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rangeplot_transport::ReaderSource;

    use super::*;
    use crate::reader::FrameDecoder;

    #[test]
    fn writes_sample_frames() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.send_sample(&Sample::new(3, 5, 7)).unwrap();
        writer.send_sample(&Sample::new(200, 0, 17)).unwrap();

        assert_eq!(writer.frames_written(), 2);
        assert_eq!(
            writer.get_ref().as_slice(),
            &[
                0x03, 0x00, 0x05, 0x00, 0x07, 0x00, 0x0A, 0x08, 0x0C, 0x00, 0x00, 0x01, 0x01, 0x0A
            ]
        );
    }

    #[test]
    fn payload_is_written_verbatim() {
        let mut writer = FrameWriter::with_terminator(Vec::new(), 0xFF);
        writer.send_payload(&[0x20, 0x0A, 0x01]).unwrap();
        assert_eq!(writer.into_inner(), vec![0x20, 0x0A, 0x01, 0xFF]);
    }

    #[test]
    fn rejected_sample_writes_nothing() {
        let mut writer = FrameWriter::new(Vec::new());
        assert!(writer.send_sample(&Sample::new(300, 0, 0)).is_err());
        assert!(writer.get_ref().is_empty());
        assert_eq!(writer.frames_written(), 0);
    }

    #[test]
    fn written_frames_decode_back() {
        let mut writer = FrameWriter::new(Vec::new());
        let samples = [Sample::new(0, 0, 0), Sample::new(255, 128, 64)];
        for sample in &samples {
            writer.send_sample(sample).unwrap();
        }

        let mut decoder = FrameDecoder::new(ReaderSource::new(Cursor::new(writer.into_inner())));
        for sample in &samples {
            assert_eq!(decoder.decode_next_frame().unwrap().sample, *sample);
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn zero_length_write_reports_closed() {
        let mut writer = FrameWriter::new(ClosedWriter);
        let err = writer.send_sample(&Sample::default()).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }
}
