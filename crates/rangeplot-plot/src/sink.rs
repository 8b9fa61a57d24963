use rangeplot_frame::{Channel, FrameStatus, CHANNELS};

use crate::error::Result;
use crate::window::WindowSet;

/// One channel's trace: values paired with the shared x-axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub channel: Channel,
    pub values: Vec<u16>,
}

/// Read-only snapshot handed to a [`RenderSink`] on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    /// Ticks completed so far, this one included.
    pub tick: u64,
    /// Shared x-axis, always `0..N`.
    pub x: Vec<usize>,
    /// Traces in channel order (lidar, ultrasonic, kalman).
    pub traces: [Trace; 3],
    /// Fixed x bounds `[0, N - 1]`.
    pub x_bounds: [f64; 2],
    /// Fixed y bounds `[0, y_max]`.
    pub y_bounds: [f64; 2],
    /// How the frame behind this tick ended; `None` when no frame arrived.
    pub status: Option<FrameStatus>,
}

impl DisplayState {
    /// Build a snapshot of `windows`.
    pub fn from_windows(
        windows: &WindowSet,
        y_max: u16,
        tick: u64,
        status: Option<FrameStatus>,
    ) -> Self {
        let n = windows.capacity();
        let trace = |channel: Channel| Trace {
            channel,
            values: windows.snapshot(channel),
        };
        Self {
            tick,
            x: (0..n).collect(),
            traces: CHANNELS.map(trace),
            x_bounds: [0.0, n.saturating_sub(1) as f64],
            y_bounds: [0.0, f64::from(y_max)],
            status,
        }
    }

    /// The `(x, y)` pair for one channel.
    pub fn series(&self, channel: Channel) -> (&[usize], &[u16]) {
        (&self.x, &self.traces[channel.index()].values)
    }

    /// Newest value per channel.
    pub fn latest(&self) -> [u16; 3] {
        self.traces
            .each_ref()
            .map(|trace| trace.values.last().copied().unwrap_or_default())
    }
}

/// Anything that can redraw three traces.
pub trait RenderSink {
    /// Redraw with the given snapshot.
    fn render(&mut self, state: &DisplayState) -> Result<()>;
}

impl<K: RenderSink + ?Sized> RenderSink for &mut K {
    fn render(&mut self, state: &DisplayState) -> Result<()> {
        (**self).render(state)
    }
}

impl<K: RenderSink + ?Sized> RenderSink for Box<K> {
    fn render(&mut self, state: &DisplayState) -> Result<()> {
        (**self).render(state)
    }
}

/// Sink that keeps every snapshot it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub states: Vec<DisplayState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&DisplayState> {
        self.states.last()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, state: &DisplayState) -> Result<()> {
        self.states.push(state.clone());
        Ok(())
    }
}
