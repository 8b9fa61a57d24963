//! Live plotting of decoded sensor frames.
//!
//! This is the "just works" layer: pull frames from a byte source, keep the
//! most recent N samples per channel, and hand a read-only display snapshot
//! to a render sink once per tick.

pub mod acquire;
pub mod config;
pub mod driver;
pub mod error;
pub mod sink;
pub mod window;

pub use acquire::{AcquiredPlot, Acquisition, Drained, DEFAULT_QUEUE_DEPTH};
pub use config::{
    y_axis_max, PlotConfig, DEFAULT_PORT, DEFAULT_TICK_INTERVAL, DEFAULT_WINDOW_LENGTH,
    DEFAULT_Y_MAX,
};
pub use driver::{run_loop, PlotDriver, PlotLoop, RunOptions, RunSummary, TickOutcome};
pub use error::{PlotError, Result};
pub use sink::{DisplayState, RecordingSink, RenderSink, Trace};
pub use window::{Window, WindowSet};
