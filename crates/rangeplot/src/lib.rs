//! Live plotting of multi-sensor distance readings from a serial link.
//!
//! A sensor board streams one frame per measurement cycle: six nibble bytes
//! (lidar, ultrasonic, kalman; two bytes each) and a newline. rangeplot
//! decodes those frames, keeps the last N samples per channel and redraws
//! three traces on every tick.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte sources (serial port, scripted buffer, replay)
//! - [`frame`]: Frame decoder, encoder and mock sensor boards
//! - [`plot`]: Sliding windows, render sinks and the render loop

/// Re-export transport types.
pub mod transport {
    pub use rangeplot_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rangeplot_frame::*;
}

/// Re-export plot types.
pub mod plot {
    pub use rangeplot_plot::*;
}
