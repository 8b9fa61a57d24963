//! Byte sources for the rangeplot sensor link.
//!
//! Provides a unified, timeout-bounded interface over the places sensor bytes
//! come from:
//! - Serial ports (USB-UART bridges, virtual tty pairs)
//! - In-memory scripted buffers (tests, dry runs)
//! - Any `Read` implementation (replays of captured dumps)
//!
//! This is the lowest layer of rangeplot. Everything else builds on top of
//! the [`ByteSource`] trait provided here.

pub mod error;
pub mod memory;
pub mod reader;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemorySource;
pub use reader::ReaderSource;
pub use serial::{list_ports, PortInfo, SerialSource, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use traits::ByteSource;
