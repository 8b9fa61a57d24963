use std::fs::File;
use std::io::{self, BufReader};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rangeplot_plot::{
    run_loop, AcquiredPlot, PlotConfig, PlotDriver, PlotError, RenderSink, RunOptions,
    RunSummary,
};
use rangeplot_transport::{ByteSource, ReaderSource, SerialSource};
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, parse_byte, parse_duration, parse_interval, PlotArgs};
use crate::exit::{io_error, plot_error, transport_error, CliResult, SUCCESS};
use crate::output::{JsonLinesSink, OutputFormat, PrettySink};
use crate::tui::ChartSink;

pub fn run(args: PlotArgs, format: OutputFormat) -> CliResult<i32> {
    let config = resolve_config(&args)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let options = RunOptions {
        tick_interval: config.tick_interval(),
        max_ticks: args.ticks,
        running: running.clone(),
    };

    let summary = match &args.replay {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?;
            let title = format!("replay {}", path.display());
            let mut sink = make_sink(format, title, running)?;
            drive(
                ReaderSource::new(BufReader::new(file)),
                &config,
                args.background,
                &mut sink,
                &options,
            )?
        }
        None => {
            let source = SerialSource::open(&config.port, config.baud_rate, config.read_timeout())
                .map_err(|err| transport_error("open failed", err))?;
            let title = format!("{} @ {}", config.port, config.baud_rate);
            let mut sink = make_sink(format, title, running)?;
            drive(source, &config, args.background, &mut sink, &options)?
        }
    };

    // Runs after the sink is dropped so the chart has released the terminal.
    info!(
        ticks = summary.ticks,
        rendered = summary.rendered,
        malformed = summary.malformed,
        "plot finished"
    );
    Ok(SUCCESS)
}

/// Defaults, then the config file, then flags and environment.
pub(crate) fn resolve_config(args: &PlotArgs) -> CliResult<PlotConfig> {
    let mut config = match &args.config {
        Some(path) => PlotConfig::from_json_file(path)
            .map_err(|err| plot_error("config load failed", err))?,
        None => PlotConfig::default(),
    };

    if let Some(port) = &args.port {
        config.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(window) = args.window {
        config.window_length = window;
    }
    if let Some(interval) = &args.tick_interval {
        config.tick_interval_ms = parse_interval(interval)?.as_millis() as u64;
    }
    if let Some(timeout) = &args.read_timeout {
        config.read_timeout_ms = parse_duration(timeout)?.as_millis() as u64;
    }
    if let Some(terminator) = &args.terminator {
        config.terminator_byte = parse_byte(terminator)?;
    }
    if let Some(fault) = args.fault_value {
        config.fault_value = fault;
    }

    config
        .validate()
        .map_err(|err| plot_error("invalid configuration", err))?;
    Ok(config)
}

fn make_sink(
    format: OutputFormat,
    title: String,
    running: Arc<AtomicBool>,
) -> CliResult<Box<dyn RenderSink>> {
    let sink: Box<dyn RenderSink> = match format {
        OutputFormat::Json => Box::new(JsonLinesSink::new(io::stdout())),
        OutputFormat::Pretty => Box::new(PrettySink::new(io::stdout())),
        OutputFormat::Chart => Box::new(
            ChartSink::new(title, running)
                .map_err(|err| io_error("terminal setup failed", err))?,
        ),
    };
    Ok(sink)
}

fn drive<S>(
    source: S,
    config: &PlotConfig,
    background: bool,
    sink: &mut dyn RenderSink,
    options: &RunOptions,
) -> CliResult<RunSummary>
where
    S: ByteSource + Send + 'static,
{
    if background {
        let mut plot = AcquiredPlot::spawn(source, config)
            .map_err(|err| plot_error("acquisition start failed", err))?;
        let result = run_loop(&mut plot, sink, options);
        let stopped = plot.shutdown();

        let summary = loop_result(result)?;
        let stats = stopped.map_err(|err| plot_error("acquisition failed", err))?;
        info!(
            frames = stats.frames,
            malformed = stats.malformed,
            drained = stats.drained_bytes,
            "acquisition stopped"
        );
        Ok(summary)
    } else {
        let mut driver =
            PlotDriver::new(source, config).map_err(|err| plot_error("plot setup failed", err))?;
        let summary = loop_result(run_loop(&mut driver, sink, options))?;
        let stats = driver.stats();
        info!(
            frames = stats.frames,
            malformed = stats.malformed,
            drained = stats.drained_bytes,
            "decoder stopped"
        );
        Ok(summary)
    }
}

/// A closed stdout (e.g. `| head`) ends the plot like a stop request.
fn loop_result(result: rangeplot_plot::Result<RunSummary>) -> CliResult<RunSummary> {
    match result {
        Ok(summary) => Ok(summary),
        Err(PlotError::Sink(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("output closed, stopping");
            Ok(RunSummary::default())
        }
        Err(err) => Err(plot_error("plot failed", err)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rangeplot_frame::Channel;
    use rangeplot_plot::{DisplayState, RecordingSink, DEFAULT_PORT};

    use super::*;
    use crate::exit::{DATA_INVALID, USAGE};

    fn temp_file(tag: &str, body: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rangeplot-cli-{tag}-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_apply_without_flags() {
        let config = resolve_config(&PlotArgs::default()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.window_length, 50);
        assert_eq!(config.terminator_byte, 0x0A);
        assert_eq!(config.fault_value, 1000);
    }

    #[test]
    fn flags_override_config_file() {
        let path = temp_file("override", br#"{"window_length": 20, "baud_rate": 9600}"#);
        let args = PlotArgs {
            config: Some(path.clone()),
            window: Some(8),
            tick_interval: Some("5ms".to_string()),
            terminator: Some("0x0D".to_string()),
            ..PlotArgs::default()
        };

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.window_length, 8);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.tick_interval_ms, 5);
        assert_eq!(config.terminator_byte, 0x0D);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn bad_values_are_usage_errors() {
        let args = PlotArgs {
            window: Some(0),
            ..PlotArgs::default()
        };
        assert_eq!(resolve_config(&args).unwrap_err().code, USAGE);

        let args = PlotArgs {
            read_timeout: Some("0s".to_string()),
            ..PlotArgs::default()
        };
        assert_eq!(resolve_config(&args).unwrap_err().code, USAGE);
    }

    #[test]
    fn malformed_config_file_is_data_invalid() {
        let path = temp_file("broken", b"{ not json");
        let args = PlotArgs {
            config: Some(path.clone()),
            ..PlotArgs::default()
        };
        assert_eq!(resolve_config(&args).unwrap_err().code, DATA_INVALID);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn drive_replays_until_source_closes() {
        let wire = vec![3, 0, 5, 0, 7, 0, 0x0A, 1, 0, 1, 0, 1, 0, 0x0A];
        let config = PlotConfig {
            window_length: 4,
            tick_interval_ms: 0,
            ..PlotConfig::default()
        };
        let mut sink = RecordingSink::new();

        let summary = drive(
            ReaderSource::new(Cursor::new(wire)),
            &config,
            false,
            &mut sink,
            &RunOptions::default(),
        )
        .unwrap();

        assert_eq!(summary.rendered, 2);
        assert!(summary.source_closed);
        let last = sink.last().unwrap();
        assert_eq!(last.series(Channel::Lidar).1, &[0, 0, 3, 1]);
        assert_eq!(last.series(Channel::Kalman).1, &[0, 0, 7, 1]);
    }

    #[test]
    fn background_drive_sees_every_frame() {
        let wire = [2, 0, 4, 0, 6, 0, 0x0A].repeat(5);
        let config = PlotConfig {
            window_length: 5,
            tick_interval_ms: 1,
            ..PlotConfig::default()
        };
        let mut sink = RecordingSink::new();

        drive(
            ReaderSource::new(Cursor::new(wire)),
            &config,
            true,
            &mut sink,
            &RunOptions::default(),
        )
        .unwrap();

        let last = sink.last().unwrap();
        assert_eq!(last.series(Channel::Ultrasonic).1, &[4, 4, 4, 4, 4]);
    }

    struct ClosedPipeSink;

    impl RenderSink for ClosedPipeSink {
        fn render(&mut self, _state: &DisplayState) -> rangeplot_plot::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe).into())
        }
    }

    #[test]
    fn closed_output_ends_plot_cleanly() {
        let wire = [3, 0, 5, 0, 7, 0, 0x0A].repeat(3);
        let config = PlotConfig {
            window_length: 3,
            ..PlotConfig::default()
        };

        for background in [false, true] {
            let summary = drive(
                ReaderSource::new(Cursor::new(wire.clone())),
                &config,
                background,
                &mut ClosedPipeSink,
                &RunOptions::default(),
            )
            .unwrap();
            assert!(!summary.source_closed);
        }
    }

    #[test]
    fn other_sink_errors_still_fail() {
        let err = loop_result(Err(PlotError::Sink(io::Error::from(
            io::ErrorKind::PermissionDenied,
        ))))
        .unwrap_err();
        assert_eq!(err.code, crate::exit::PERMISSION_DENIED);
    }
}
