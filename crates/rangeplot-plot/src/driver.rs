use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rangeplot_frame::{FrameDecoder, FrameError, FrameStats, FrameStatus};
use rangeplot_transport::ByteSource;
use tracing::{debug, info};

use crate::config::{y_axis_max, PlotConfig, DEFAULT_TICK_INTERVAL};
use crate::error::Result;
use crate::sink::{DisplayState, RenderSink};
use crate::window::WindowSet;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was decoded, pushed and drawn.
    Rendered(FrameStatus),
    /// No data within the read timeout; the unchanged windows were redrawn.
    NoData,
    /// The source ended; nothing was drawn.
    SourceClosed,
}

/// Something that can be ticked by [`run_loop`].
pub trait PlotLoop {
    /// Run one decode/buffer/draw cycle.
    fn tick(&mut self, sink: &mut dyn RenderSink) -> Result<TickOutcome>;
}

/// Loop control for [`run_loop`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Minimum time between tick starts.
    pub tick_interval: Duration,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Cleared to stop the loop (e.g. by a Ctrl-C handler).
    pub running: Arc<AtomicBool>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_ticks: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Totals reported when a loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub rendered: u64,
    pub malformed: u64,
    pub idle: u64,
    pub source_closed: bool,
}

/// Drive `plot` until the source closes, `max_ticks` is reached, or
/// `running` is cleared.
///
/// The loop adds no throttling beyond `tick_interval`; a tick that already
/// took longer starts the next one immediately.
pub fn run_loop<L: PlotLoop + ?Sized>(
    plot: &mut L,
    sink: &mut dyn RenderSink,
    options: &RunOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    while options.running.load(Ordering::SeqCst) {
        if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }

        let started = Instant::now();
        match plot.tick(sink)? {
            TickOutcome::Rendered(status) => {
                summary.rendered += 1;
                if status == FrameStatus::Malformed {
                    summary.malformed += 1;
                }
            }
            TickOutcome::NoData => summary.idle += 1,
            TickOutcome::SourceClosed => {
                summary.source_closed = true;
                break;
            }
        }
        summary.ticks += 1;

        if let Some(rest) = options.tick_interval.checked_sub(started.elapsed()) {
            if !rest.is_zero() {
                std::thread::sleep(rest);
            }
        }
    }

    info!(
        ticks = summary.ticks,
        rendered = summary.rendered,
        malformed = summary.malformed,
        idle = summary.idle,
        source_closed = summary.source_closed,
        "render loop finished"
    );
    Ok(summary)
}

/// Single-threaded render loop driver.
///
/// Owns the decoder (and through it the byte source) and the per-channel
/// windows. Every tick blocks on one frame read, so the draw rate follows
/// the link rate.
pub struct PlotDriver<S> {
    decoder: FrameDecoder<S>,
    windows: WindowSet,
    y_max: u16,
    ticks: u64,
}

impl<S: ByteSource> PlotDriver<S> {
    /// Build a driver over `source` using the framing and window settings of
    /// `config`.
    pub fn new(source: S, config: &PlotConfig) -> Result<Self> {
        let decoder = FrameDecoder::with_config(source, config.decoder_config());
        Self::with_decoder(decoder, config.window_length)
    }

    /// Build a driver around an existing decoder.
    ///
    /// The y-axis spans `[0, 1000]`, stretched to the decoder's fault value
    /// when that is larger.
    pub fn with_decoder(decoder: FrameDecoder<S>, window_length: usize) -> Result<Self> {
        let windows = WindowSet::new(window_length)?;
        let y_max = y_axis_max(decoder.config().fault_value);
        Ok(Self {
            decoder,
            windows,
            y_max,
            ticks: 0,
        })
    }

    /// Current display snapshot.
    pub fn display_state(&self, status: Option<FrameStatus>) -> DisplayState {
        DisplayState::from_windows(&self.windows, self.y_max, self.ticks, status)
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    pub fn stats(&self) -> FrameStats {
        self.decoder.stats()
    }

    pub fn decoder_mut(&mut self) -> &mut FrameDecoder<S> {
        &mut self.decoder
    }
}

impl<S: ByteSource> PlotLoop for PlotDriver<S> {
    fn tick(&mut self, sink: &mut dyn RenderSink) -> Result<TickOutcome> {
        let (outcome, status) = match self.decoder.decode_next_frame() {
            Ok(frame) => {
                self.windows.push_sample(&frame.sample);
                (TickOutcome::Rendered(frame.status), Some(frame.status))
            }
            Err(FrameError::Timeout) => {
                debug!("no frame within read timeout");
                (TickOutcome::NoData, None)
            }
            Err(FrameError::ConnectionClosed) => return Ok(TickOutcome::SourceClosed),
            Err(err) => return Err(err.into()),
        };

        self.ticks += 1;
        let state = self.display_state(status);
        sink.render(&state)?;
        Ok(outcome)
    }
}

impl<S> std::fmt::Debug for PlotDriver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotDriver")
            .field("window_length", &self.windows.capacity())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}
