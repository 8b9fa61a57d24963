//! Decoding on a background thread, drawing on the caller's thread.
//!
//! The acquisition thread owns the decoder and only sends decoded frames
//! over a bounded channel. The windows stay with [`AcquiredPlot`] on the
//! render side, which drains the queue at the start of each tick, so there
//! is a single writer and no locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rangeplot_frame::{Frame, FrameDecoder, FrameError, FrameStats, FrameStatus};
use rangeplot_transport::ByteSource;
use tracing::{debug, error, warn};

use crate::config::PlotConfig;
use crate::driver::{PlotLoop, TickOutcome};
use crate::error::{PlotError, Result};
use crate::sink::{DisplayState, RenderSink};
use crate::window::WindowSet;

/// Default number of frames buffered between the threads.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Pause after a read timeout, for sources that time out without blocking.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Frames pulled from the queue in one go.
#[derive(Debug, Default)]
pub struct Drained {
    pub frames: Vec<Frame>,
    /// The acquisition thread has exited and the queue is empty.
    pub closed: bool,
}

/// Handle to a running acquisition thread.
pub struct Acquisition {
    running: Arc<AtomicBool>,
    receiver: Option<Receiver<Frame>>,
    handle: Option<JoinHandle<std::result::Result<FrameStats, FrameError>>>,
}

impl Acquisition {
    /// Start decoding `decoder` on a new thread.
    pub fn spawn<S>(decoder: FrameDecoder<S>, queue_depth: usize) -> Result<Self>
    where
        S: ByteSource + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (sender, receiver) = mpsc::sync_channel(queue_depth.max(1));

        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("rangeplot-acquire".to_string())
            .spawn(move || acquire(decoder, sender, flag))
            .map_err(PlotError::Spawn)?;

        Ok(Self {
            running,
            receiver: Some(receiver),
            handle: Some(handle),
        })
    }

    /// Take every frame queued so far without blocking.
    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();
        let Some(receiver) = &self.receiver else {
            drained.closed = true;
            return drained;
        };

        loop {
            match receiver.try_recv() {
                Ok(frame) => drained.frames.push(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drained.closed = true;
                    break;
                }
            }
        }
        drained
    }

    /// Stop the thread and return its decoder counters.
    ///
    /// A transport failure that ended the thread early is returned here.
    pub fn stop(mut self) -> Result<FrameStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<FrameStats> {
        self.running.store(false, Ordering::SeqCst);
        // Unblocks a sender waiting on a full queue.
        self.receiver.take();

        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result.map_err(PlotError::from),
                Err(_) => Err(PlotError::AcquisitionPanicked),
            },
            None => Ok(FrameStats::default()),
        }
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(%err, "acquisition ended with error");
        }
    }
}

impl std::fmt::Debug for Acquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquisition")
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

fn acquire<S: ByteSource>(
    mut decoder: FrameDecoder<S>,
    sender: SyncSender<Frame>,
    running: Arc<AtomicBool>,
) -> std::result::Result<FrameStats, FrameError> {
    while running.load(Ordering::SeqCst) {
        match decoder.decode_next_frame() {
            Ok(frame) => {
                if sender.send(frame).is_err() {
                    debug!("render side hung up");
                    break;
                }
            }
            Err(FrameError::Timeout) => std::thread::sleep(IDLE_BACKOFF),
            Err(FrameError::ConnectionClosed) => {
                debug!("source closed, acquisition done");
                break;
            }
            Err(err) => {
                error!(%err, "acquisition failed");
                return Err(err);
            }
        }
    }
    Ok(decoder.stats())
}

/// Render loop fed by an [`Acquisition`] thread.
///
/// Each tick folds every queued frame into the windows, then draws once.
/// Drawing no longer waits on the link.
#[derive(Debug)]
pub struct AcquiredPlot {
    acquisition: Acquisition,
    windows: WindowSet,
    y_max: u16,
    ticks: u64,
}

impl AcquiredPlot {
    /// Start acquisition over `source` with the settings of `config`.
    pub fn spawn<S>(source: S, config: &PlotConfig) -> Result<Self>
    where
        S: ByteSource + Send + 'static,
    {
        let windows = WindowSet::new(config.window_length)?;
        let decoder = FrameDecoder::with_config(source, config.decoder_config());
        let acquisition = Acquisition::spawn(decoder, DEFAULT_QUEUE_DEPTH)?;
        Ok(Self {
            acquisition,
            windows,
            y_max: config.y_max(),
            ticks: 0,
        })
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Stop acquisition and return the decoder counters.
    pub fn shutdown(self) -> Result<FrameStats> {
        self.acquisition.stop()
    }
}

impl PlotLoop for AcquiredPlot {
    fn tick(&mut self, sink: &mut dyn RenderSink) -> Result<TickOutcome> {
        let drained = self.acquisition.drain();

        let (outcome, status) = match drained.frames.last() {
            Some(last) => {
                let status = last.status;
                for frame in &drained.frames {
                    self.windows.push_sample(&frame.sample);
                }
                let malformed = drained
                    .frames
                    .iter()
                    .filter(|frame| frame.status == FrameStatus::Malformed)
                    .count();
                if malformed > 0 {
                    debug!(malformed, batch = drained.frames.len(), "fault samples in batch");
                }
                (TickOutcome::Rendered(status), Some(status))
            }
            None if drained.closed => return Ok(TickOutcome::SourceClosed),
            None => (TickOutcome::NoData, None),
        };

        self.ticks += 1;
        let state = DisplayState::from_windows(&self.windows, self.y_max, self.ticks, status);
        sink.render(&state)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    use rangeplot_frame::{Channel, FrameWriter, Sample};
    use rangeplot_transport::{MemorySource, ReaderSource};

    use super::*;
    use crate::driver::{run_loop, RunOptions};
    use crate::sink::RecordingSink;

    fn wire(samples: &[Sample]) -> Vec<u8> {
        let mut writer = FrameWriter::new(Vec::new());
        for sample in samples {
            writer.send_sample(sample).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn background_acquisition_fills_windows() {
        let samples: Vec<Sample> = (1..=12).map(|i| Sample::new(i, i * 2, i * 3)).collect();
        let source = ReaderSource::new(Cursor::new(wire(&samples)));
        let config = PlotConfig {
            window_length: 5,
            ..PlotConfig::default()
        };
        let mut plot = AcquiredPlot::spawn(source, &config).unwrap();
        let mut sink = RecordingSink::new();

        let summary = run_loop(
            &mut plot,
            &mut sink,
            &RunOptions {
                tick_interval: Duration::from_millis(1),
                ..RunOptions::default()
            },
        )
        .unwrap();

        assert!(summary.source_closed);
        assert_eq!(
            plot.windows().snapshot(Channel::Lidar),
            vec![8, 9, 10, 11, 12]
        );
        assert_eq!(
            plot.windows().snapshot(Channel::Kalman),
            vec![24, 27, 30, 33, 36]
        );
        for state in &sink.states {
            assert_eq!(state.x, vec![0, 1, 2, 3, 4]);
        }

        let stats = plot.shutdown().unwrap();
        assert_eq!(stats.frames, 12);
    }

    #[test]
    fn idle_source_reports_no_data_and_stops_cleanly() {
        let config = PlotConfig {
            window_length: 3,
            ..PlotConfig::default()
        };
        let mut plot = AcquiredPlot::spawn(MemorySource::new(), &config).unwrap();
        let mut sink = RecordingSink::new();

        assert_eq!(plot.tick(&mut sink).unwrap(), TickOutcome::NoData);
        assert_eq!(sink.last().unwrap().latest(), [0, 0, 0]);

        let started = Instant::now();
        let stats = plot.shutdown().unwrap();
        assert_eq!(stats.frames, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    struct CountingIdleSource {
        reads: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl ByteSource for CountingIdleSource {
        fn read_byte(&mut self) -> rangeplot_transport::Result<u8> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Err(rangeplot_transport::TransportError::Timeout)
        }

        fn discard_input(&mut self) -> rangeplot_transport::Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn idle_thread_backs_off_between_timeouts() {
        let reads = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let source = CountingIdleSource {
            reads: Arc::clone(&reads),
        };
        let acquisition =
            Acquisition::spawn(FrameDecoder::new(source), DEFAULT_QUEUE_DEPTH).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        acquisition.stop().unwrap();

        let reads = reads.load(Ordering::SeqCst);
        assert!(reads >= 1);
        assert!(reads < 1_000, "{reads} reads in 50ms");
    }

    #[test]
    fn drain_after_stop_reports_closed() {
        let mut source = MemorySource::new();
        source.close();
        let acquisition =
            Acquisition::spawn(FrameDecoder::new(source), DEFAULT_QUEUE_DEPTH).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let drained = acquisition.drain();
            if drained.closed {
                assert!(drained.frames.is_empty());
                break;
            }
            assert!(Instant::now() < deadline, "acquisition never closed");
            std::thread::sleep(Duration::from_millis(1));
        }
        acquisition.stop().unwrap();
    }
}
