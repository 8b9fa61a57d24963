//! Synthetic sensor boards for running the pipeline without hardware.
//!
//! [`MockFrameSource`] emits frames in the layout [`crate::FrameDecoder`]
//! expects. [`MockLineReader`] reproduces an older two-channel line format
//! (four ASCII hex digits and a newline); it does not match the six-byte
//! frame and is kept only as a separate double.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::codec::{FRAME_LEN, NIBBLE_MAX, PAYLOAD_LEN, TERMINATOR};
use crate::error::Result;
use crate::writer::FrameWriter;

/// Generates random well-formed frames: six nibbles and the terminator.
pub struct MockFrameSource<R = ThreadRng> {
    rng: R,
    terminator: u8,
}

impl MockFrameSource<ThreadRng> {
    /// Generator backed by the thread-local RNG.
    pub fn new() -> Self {
        Self::with_terminator(TERMINATOR)
    }

    /// Generator backed by the thread-local RNG, ending frames with `terminator`.
    pub fn with_terminator(terminator: u8) -> Self {
        Self::with_rng(rand::thread_rng(), terminator)
    }
}

impl Default for MockFrameSource<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MockFrameSource<R> {
    /// Generator with an explicit RNG and terminator.
    pub fn with_rng(rng: R, terminator: u8) -> Self {
        Self { rng, terminator }
    }

    /// Six random payload nibbles.
    pub fn next_payload(&mut self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        for byte in &mut payload {
            *byte = self.rng.gen_range(0..=NIBBLE_MAX);
        }
        payload
    }

    /// One complete frame, terminator included.
    pub fn next_frame(&mut self) -> [u8; FRAME_LEN] {
        let mut frame = [self.terminator; FRAME_LEN];
        frame[..PAYLOAD_LEN].copy_from_slice(&self.next_payload());
        frame
    }

    /// Write frames until `count` is reached or `running` is cleared.
    ///
    /// `count: None` keeps going until `running` turns false. `interval` is
    /// slept between frames when non-zero. Returns the number of frames sent.
    pub fn write_frames<W: Write>(
        &mut self,
        writer: &mut FrameWriter<W>,
        count: Option<u64>,
        interval: Duration,
        running: &AtomicBool,
    ) -> Result<u64> {
        let mut sent = 0u64;
        while running.load(Ordering::SeqCst) {
            if count.is_some_and(|count| sent >= count) {
                break;
            }

            let payload = self.next_payload();
            writer.send_payload(&payload)?;
            trace!(?payload, "mock frame sent");
            sent += 1;

            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }

        debug!(sent, "mock source stopped");
        Ok(sent)
    }
}

/// Two-channel line generator: two random bytes as four hex digits + `\n`.
///
/// Only four payload bytes per line, so its output never lines up with the
/// six-byte frames the decoder reads.
pub struct MockLineReader<R = ThreadRng> {
    rng: R,
}

impl MockLineReader<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for MockLineReader<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MockLineReader<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Next simulated line, e.g. `b"3fa0\n"`.
    pub fn readline(&mut self) -> Vec<u8> {
        let lidar: u8 = self.rng.gen();
        let ultra: u8 = self.rng.gen();
        format!("{lidar:02x}{ultra:02x}\n").into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rangeplot_transport::ReaderSource;

    use super::*;
    use crate::codec::FrameStatus;
    use crate::reader::FrameDecoder;

    #[test]
    fn frames_hold_nibbles_and_terminator() {
        let mut mock = MockFrameSource::with_rng(StdRng::seed_from_u64(7), TERMINATOR);
        for _ in 0..200 {
            let frame = mock.next_frame();
            assert!(frame[..PAYLOAD_LEN].iter().all(|b| *b <= NIBBLE_MAX));
            assert_eq!(frame[PAYLOAD_LEN], TERMINATOR);
        }
    }

    #[test]
    fn written_frames_decode_in_range() {
        let mut mock = MockFrameSource::with_rng(StdRng::seed_from_u64(11), TERMINATOR);
        let mut writer = FrameWriter::new(Vec::new());
        let running = AtomicBool::new(true);

        let sent = mock
            .write_frames(&mut writer, Some(25), Duration::ZERO, &running)
            .unwrap();
        assert_eq!(sent, 25);

        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 25 * FRAME_LEN);

        let mut decoder = FrameDecoder::new(ReaderSource::new(Cursor::new(bytes)));
        for _ in 0..25 {
            let frame = decoder.decode_next_frame().unwrap();
            assert_eq!(frame.status, FrameStatus::Complete);
            assert!(frame.sample.values().iter().all(|v| *v <= 255));
        }
    }

    #[test]
    fn cleared_flag_stops_immediately() {
        let mut mock = MockFrameSource::with_rng(StdRng::seed_from_u64(3), TERMINATOR);
        let mut writer = FrameWriter::new(Vec::new());
        let running = AtomicBool::new(false);

        let sent = mock
            .write_frames(&mut writer, None, Duration::ZERO, &running)
            .unwrap();
        assert_eq!(sent, 0);
        assert!(writer.get_ref().is_empty());
    }

    #[test]
    fn line_reader_emits_four_hex_digits() {
        let mut reader = MockLineReader::with_rng(StdRng::seed_from_u64(5));
        for _ in 0..50 {
            let line = reader.readline();
            assert_eq!(line.len(), 5);
            assert_eq!(line[4], b'\n');
            assert!(line[..4].iter().all(|b| b.is_ascii_hexdigit()));
        }
    }
}
