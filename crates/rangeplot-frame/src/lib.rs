//! Terminator-delimited sensor framing.
//!
//! Every frame on the wire is six payload bytes followed by a single
//! terminator byte (0x0A):
//! - bytes 0-1: lidar distance, `low + high * 16`
//! - bytes 2-3: ultrasonic distance
//! - bytes 4-5: kalman-filtered distance
//!
//! There is no checksum, length prefix or escaping. The decoder recovers one
//! [`Sample`] per call and never fails on a malformed frame; it substitutes
//! the fault value instead.

pub mod channel;
pub mod codec;
pub mod error;
pub mod mock;
pub mod reader;
pub mod writer;

pub use channel::{Channel, CHANNELS};
pub use codec::{
    decode_payload, encode_sample, DecoderConfig, Frame, FrameStatus, Sample,
    DEFAULT_FAULT_VALUE, DEFAULT_MAX_FRAME_LEN, FRAME_LEN, NIBBLE_MAX, PAYLOAD_LEN, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use mock::{MockFrameSource, MockLineReader};
pub use reader::{FrameDecoder, FrameStats};
pub use writer::FrameWriter;
