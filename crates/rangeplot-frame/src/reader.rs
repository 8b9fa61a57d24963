use bytes::{BufMut, BytesMut};
use rangeplot_transport::{ByteSource, TransportError};
use tracing::{debug, warn};

use crate::codec::{decode_payload, DecoderConfig, Frame, FrameStatus, PAYLOAD_LEN};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Running counters for a decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames returned, whatever their status.
    pub frames: u64,
    /// Frames that fell back to the fault value.
    pub malformed: u64,
    /// Bytes thrown away by the post-frame drain.
    pub drained_bytes: u64,
}

/// How the accumulation loop stopped.
enum Collected {
    Terminated,
    Stalled(TransportError),
    Overrun,
}

/// Pulls frames out of a [`ByteSource`], one byte at a time.
///
/// Each call to [`FrameDecoder::decode_next_frame`] produces exactly one
/// frame and then discards whatever the source still has buffered, so the
/// next call starts from fresh data.
pub struct FrameDecoder<S> {
    source: S,
    buf: BytesMut,
    config: DecoderConfig,
    stats: FrameStats,
}

impl<S: ByteSource> FrameDecoder<S> {
    /// Create a decoder with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(source: S, config: DecoderConfig) -> Self {
        Self {
            source,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stats: FrameStats::default(),
        }
    }

    /// Read and decode the next frame (blocking, bounded by the source timeout).
    ///
    /// Bytes are accumulated until the terminator shows up with at least six
    /// bytes already collected. A terminator that arrives earlier is kept as
    /// payload and reading goes on.
    ///
    /// If the source stalls or ends mid-frame, whatever was collected is
    /// decoded; fewer than six bytes yields a [`FrameStatus::Malformed`] frame
    /// carrying the fault value. Only a stall before the first byte is
    /// reported as an error ([`crate::FrameError::Timeout`] or
    /// [`crate::FrameError::ConnectionClosed`]).
    pub fn decode_next_frame(&mut self) -> Result<Frame> {
        self.buf.clear();

        let status = match self.collect() {
            Collected::Terminated => FrameStatus::Complete,
            Collected::Overrun => FrameStatus::Overrun,
            Collected::Stalled(err) => {
                if self.buf.is_empty() {
                    return Err(err.into());
                }
                if !matches!(err, TransportError::Timeout | TransportError::Closed) {
                    return Err(err.into());
                }
                debug!(collected = self.buf.len(), %err, "source stalled mid-frame");
                if self.buf.len() < PAYLOAD_LEN {
                    FrameStatus::Malformed
                } else {
                    FrameStatus::Unterminated
                }
            }
        };

        let raw = self.buf.split().freeze();
        let sample = decode_payload(&raw, self.config.fault_value);
        let frame = Frame {
            sample,
            raw,
            status,
        };

        self.stats.frames += 1;
        match status {
            FrameStatus::Malformed => {
                self.stats.malformed += 1;
                warn!(tokens = ?frame.tokens(), "malformed frame, substituting fault value");
            }
            FrameStatus::Overrun => {
                warn!(
                    len = frame.raw.len(),
                    max = self.config.max_frame_len,
                    "no terminator within frame limit"
                );
            }
            _ => {
                debug!(
                    lidar = sample.lidar,
                    ultra = sample.ultra,
                    kalman = sample.kalman,
                    status = status.as_str(),
                    "decoded frame"
                );
            }
        }

        self.drain()?;
        Ok(frame)
    }

    /// Accumulate bytes until the stop condition holds.
    fn collect(&mut self) -> Collected {
        let terminator = self.config.terminator;
        let mut byte = match self.source.read_byte() {
            Ok(byte) => byte,
            Err(err) => return Collected::Stalled(err),
        };

        let limit = self.config.max_frame_len.max(PAYLOAD_LEN);
        while byte != terminator || self.buf.len() < PAYLOAD_LEN {
            if self.buf.len() >= limit {
                return Collected::Overrun;
            }
            self.buf.put_u8(byte);
            byte = match self.source.read_byte() {
                Ok(byte) => byte,
                Err(err) => return Collected::Stalled(err),
            };
        }

        Collected::Terminated
    }

    fn drain(&mut self) -> Result<()> {
        match self.source.discard_input() {
            Ok(dropped) => {
                self.stats.drained_bytes += dropped as u64;
                Ok(())
            }
            Err(TransportError::Timeout | TransportError::Closed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the decoder and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl<S> std::fmt::Debug for FrameDecoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use rangeplot_transport::{MemorySource, ReaderSource};

    use super::*;
    use crate::codec::{encode_sample, Sample, TERMINATOR};
    use crate::error::FrameError;

    fn wire(samples: &[Sample]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for sample in samples {
            encode_sample(sample, TERMINATOR, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn decodes_reference_frame() {
        let source = MemorySource::from_bytes([0x03, 0x00, 0x05, 0x00, 0x07, 0x00, 0x0A]);
        let mut decoder = FrameDecoder::new(source);

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.sample, Sample::new(3, 5, 7));
        assert_eq!(frame.status, FrameStatus::Complete);
        assert_eq!(frame.raw.as_ref(), &[0x03, 0x00, 0x05, 0x00, 0x07, 0x00]);
    }

    #[test]
    fn n_frames_yield_n_samples() {
        let samples: Vec<Sample> = (0..20u16)
            .map(|i| Sample::new(i, i * 3 % 256, 255 - i))
            .collect();
        // A replay source never drains, so every frame is seen in order.
        let mut decoder = FrameDecoder::new(ReaderSource::new(Cursor::new(wire(&samples))));

        for expected in &samples {
            let frame = decoder.decode_next_frame().unwrap();
            assert_eq!(frame.sample, *expected);
            assert_eq!(frame.status, FrameStatus::Complete);
        }
        assert!(matches!(
            decoder.decode_next_frame(),
            Err(FrameError::ConnectionClosed)
        ));
        assert_eq!(decoder.stats().frames, samples.len() as u64);
        assert_eq!(decoder.stats().malformed, 0);
    }

    #[test]
    fn early_terminator_is_kept_as_payload() {
        // Terminator as the very first byte does not end the frame.
        let bytes = [0x0A, 0x01, 0x02, 0x00, 0x04, 0x00, 0x0A];
        let mut decoder = FrameDecoder::new(MemorySource::from_bytes(bytes));

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.status, FrameStatus::Complete);
        assert_eq!(frame.raw.as_ref(), &bytes[..6]);
        assert_eq!(frame.sample, Sample::new(0x0A + 16, 2, 4));
    }

    #[test]
    fn only_terminator_after_sixth_byte_stops() {
        let bytes = [
            0x01, 0x0A, 0x02, 0x00, 0x03, 0x00, 0x05, 0x06, 0x0A, 0x09, 0x09,
        ];
        let mut decoder = FrameDecoder::new(ReaderSource::new(Cursor::new(bytes.to_vec())));

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.raw.as_ref(), &bytes[..8]);
        assert_eq!(frame.sample, Sample::new(1 + 0x0A * 16, 2, 3));
        assert_eq!(decoder.get_mut().read_byte().unwrap(), 0x09);
    }

    #[test]
    fn lone_terminator_then_stall_yields_fault_triple() {
        let mut decoder = FrameDecoder::new(MemorySource::from_bytes([0x0A]));

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.sample, Sample::fault(1000));
        assert_eq!(frame.status, FrameStatus::Malformed);
        assert_eq!(frame.tokens(), vec!["0x0a"]);
        assert_eq!(decoder.stats().malformed, 1);
    }

    #[test]
    fn lone_terminator_then_close_yields_fault_triple() {
        let mut source = MemorySource::from_bytes([0x0A]);
        source.close();
        let mut decoder = FrameDecoder::new(source);

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.sample, Sample::fault(1000));
        assert!(frame.is_malformed());
    }

    #[test]
    fn fault_value_is_configurable() {
        let config = DecoderConfig {
            fault_value: 999,
            ..DecoderConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(MemorySource::from_bytes([1, 2, 3]), config);
        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.sample, Sample::fault(999));
    }

    #[test]
    fn stall_after_six_bytes_decodes_unterminated() {
        let mut decoder =
            FrameDecoder::new(MemorySource::from_bytes([0x03, 0x00, 0x05, 0x00, 0x07, 0x00]));
        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.status, FrameStatus::Unterminated);
        assert_eq!(frame.sample, Sample::new(3, 5, 7));
    }

    #[test]
    fn stall_before_any_byte_is_timeout() {
        let mut decoder = FrameDecoder::new(MemorySource::new());
        assert!(matches!(
            decoder.decode_next_frame(),
            Err(FrameError::Timeout)
        ));
        assert_eq!(decoder.stats().frames, 0);
    }

    #[test]
    fn closed_before_any_byte_is_connection_closed() {
        let mut source = MemorySource::new();
        source.close();
        let mut decoder = FrameDecoder::new(source);
        assert!(matches!(
            decoder.decode_next_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn buffered_bytes_after_frame_are_drained() {
        let mut bytes = wire(&[Sample::new(3, 5, 7)]);
        bytes.extend_from_slice(&[0x0E, 0x0E, 0x0E, 0x0A, 0x01]);
        let mut decoder = FrameDecoder::new(MemorySource::from_bytes(&bytes));

        let first = decoder.decode_next_frame().unwrap();
        assert_eq!(first.sample, Sample::new(3, 5, 7));
        assert_eq!(decoder.get_ref().pending(), 0);
        assert_eq!(decoder.stats().drained_bytes, 5);

        decoder.get_mut().feed(wire(&[Sample::new(9, 8, 7)]));
        let second = decoder.decode_next_frame().unwrap();
        assert_eq!(second.sample, Sample::new(9, 8, 7));
        assert!(!second.raw.contains(&0x0E));
        assert!(!second.tokens().contains(&"0x0e".to_string()));
    }

    #[test]
    fn overrun_stops_at_frame_limit() {
        let config = DecoderConfig {
            max_frame_len: 8,
            ..DecoderConfig::default()
        };
        let bytes = vec![0x01u8; 32];
        let mut decoder =
            FrameDecoder::with_config(ReaderSource::new(Cursor::new(bytes)), config);

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.status, FrameStatus::Overrun);
        assert_eq!(frame.raw.len(), 8);
        assert_eq!(frame.sample, Sample::new(17, 17, 17));
    }

    #[test]
    fn custom_terminator() {
        let config = DecoderConfig {
            terminator: 0xFF,
            ..DecoderConfig::default()
        };
        let bytes = [0x0A, 0x00, 0x0A, 0x00, 0x0A, 0x00, 0xFF];
        let mut decoder = FrameDecoder::with_config(MemorySource::from_bytes(bytes), config);

        let frame = decoder.decode_next_frame().unwrap();
        assert_eq!(frame.status, FrameStatus::Complete);
        assert_eq!(frame.sample, Sample::new(10, 10, 10));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut decoder = FrameDecoder::new(MemorySource::from_bytes([1]));
        assert_eq!(decoder.get_ref().pending(), 1);
        assert_eq!(decoder.config().terminator, TERMINATOR);
        let _ = decoder.get_mut();
        let source = decoder.into_inner();
        assert_eq!(source.pending(), 1);
    }
}
