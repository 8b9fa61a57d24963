use bytes::{BufMut, Bytes, BytesMut};

use crate::channel::{Channel, CHANNELS};
use crate::error::{FrameError, Result};

/// Frame terminator: ASCII newline.
pub const TERMINATOR: u8 = 0x0A;

/// Payload bytes per frame: two per channel.
pub const PAYLOAD_LEN: usize = 6;

/// Wire size of a well-formed frame (payload + terminator).
pub const FRAME_LEN: usize = PAYLOAD_LEN + 1;

/// Largest value a payload byte is expected to carry.
pub const NIBBLE_MAX: u8 = 0x0F;

/// Value substituted on every channel when a frame cannot be decoded.
pub const DEFAULT_FAULT_VALUE: u16 = 1000;

/// Default cap on bytes accumulated while waiting for a terminator.
pub const DEFAULT_MAX_FRAME_LEN: usize = 256;

/// One decoded reading per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    pub lidar: u16,
    pub ultra: u16,
    pub kalman: u16,
}

impl Sample {
    pub fn new(lidar: u16, ultra: u16, kalman: u16) -> Self {
        Self {
            lidar,
            ultra,
            kalman,
        }
    }

    /// A sample with every channel set to `value`.
    pub fn fault(value: u16) -> Self {
        Self::new(value, value, value)
    }

    /// Value of one channel.
    pub fn get(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Lidar => self.lidar,
            Channel::Ultrasonic => self.ultra,
            Channel::Kalman => self.kalman,
        }
    }

    /// Values in wire order.
    pub fn values(&self) -> [u16; 3] {
        [self.lidar, self.ultra, self.kalman]
    }
}

/// How a frame ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Terminator seen at or after the sixth payload byte.
    Complete,
    /// The source stalled or ended after six or more bytes; decoded anyway.
    Unterminated,
    /// The accumulation cap was hit before a terminator; decoded anyway.
    Overrun,
    /// Fewer than six bytes were available; every channel holds the fault value.
    Malformed,
}

impl FrameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameStatus::Complete => "complete",
            FrameStatus::Unterminated => "unterminated",
            FrameStatus::Overrun => "overrun",
            FrameStatus::Malformed => "malformed",
        }
    }
}

/// Result of one decode cycle.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded channel values (fault value on every channel when malformed).
    pub sample: Sample,
    /// Bytes accumulated before the terminator, terminator excluded.
    pub raw: Bytes,
    pub status: FrameStatus,
}

impl Frame {
    /// The accumulated bytes as `0xhh` tokens, for diagnostics.
    pub fn tokens(&self) -> Vec<String> {
        self.raw.iter().map(|b| format!("0x{b:02x}")).collect()
    }

    pub fn is_malformed(&self) -> bool {
        self.status == FrameStatus::Malformed
    }
}

/// Decoder settings.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Byte that ends a frame. Default: 0x0A.
    pub terminator: u8,
    /// Value substituted for malformed frames. Default: 1000.
    pub fault_value: u16,
    /// Cap on accumulated bytes per frame. Default: 256.
    pub max_frame_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            terminator: TERMINATOR,
            fault_value: DEFAULT_FAULT_VALUE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Decode the channel values out of accumulated payload bytes.
///
/// Channel k is `raw[2k] + raw[2k + 1] * 16`. Bytes past the sixth are
/// ignored and nibble range is not checked. With fewer than six bytes the
/// fault sample is returned.
pub fn decode_payload(raw: &[u8], fault_value: u16) -> Sample {
    if raw.len() < PAYLOAD_LEN {
        return Sample::fault(fault_value);
    }

    let value = |channel: Channel| {
        let offset = channel.payload_offset();
        u16::from(raw[offset]) + u16::from(raw[offset + 1]) * 16
    };

    Sample::new(
        value(Channel::Lidar),
        value(Channel::Ultrasonic),
        value(Channel::Kalman),
    )
}

/// Encode a sample into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────┐
/// │ lidar lo │ lidar hi │ ultra lo │ ultra hi │ kalman lo│ kalman hi│ 0x0A │
/// └──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────┘
/// ```
/// Each byte holds one nibble; values above 255 are rejected.
pub fn encode_sample(sample: &Sample, terminator: u8, dst: &mut BytesMut) -> Result<()> {
    for channel in CHANNELS {
        let value = sample.get(channel);
        if value > 0xFF {
            return Err(FrameError::ValueOutOfRange { channel, value });
        }
    }

    dst.reserve(FRAME_LEN);
    for channel in CHANNELS {
        let value = sample.get(channel);
        dst.put_u8((value & 0x0F) as u8);
        dst.put_u8((value >> 4) as u8);
    }
    dst.put_u8(terminator);
    Ok(())
}
