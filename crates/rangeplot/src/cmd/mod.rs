use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod mock;
pub mod plot;
pub mod ports;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plot live readings from a serial port or a captured dump.
    Plot(PlotArgs),
    /// Emulate a sensor board by writing random frames.
    Mock(MockArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Plot(args) => plot::run(args, format),
        Command::Mock(args) => mock::run(args),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct PlotArgs {
    /// Serial port to read from.
    #[arg(long, env = "RANGEPLOT_PORT", conflicts_with = "replay")]
    pub port: Option<String>,
    /// Baud rate.
    #[arg(long, env = "RANGEPLOT_BAUD")]
    pub baud: Option<u32>,
    /// Samples kept per channel.
    #[arg(long, env = "RANGEPLOT_WINDOW")]
    pub window: Option<usize>,
    /// Delay between ticks (e.g. 1ms, 2s).
    #[arg(long)]
    pub tick_interval: Option<String>,
    /// Serial read timeout (e.g. 500ms, 1s).
    #[arg(long)]
    pub read_timeout: Option<String>,
    /// Frame terminator byte (e.g. 0x0A or 10).
    #[arg(long)]
    pub terminator: Option<String>,
    /// Value reported on every channel for short frames.
    #[arg(long)]
    pub fault_value: Option<u16>,
    /// JSON configuration file; flags override its values.
    #[arg(long, value_name = "FILE", env = "RANGEPLOT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Read a captured byte dump instead of a serial port.
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
    /// Decode on a separate thread and render at a fixed cadence.
    #[arg(long)]
    pub background: bool,
    /// Stop after N ticks.
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MockArgs {
    /// Serial port to write to.
    #[arg(long, env = "RANGEPLOT_MOCK_PORT", conflicts_with = "stdout")]
    pub port: Option<String>,
    /// Baud rate.
    #[arg(long, default_value_t = rangeplot_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Pause between frames (e.g. 0, 50ms).
    #[arg(long, default_value = "0")]
    pub interval: String,
    /// Frame terminator byte (e.g. 0x0A or 10).
    #[arg(long, default_value = "0x0A")]
    pub terminator: String,
    /// Write frames to stdout instead of a port.
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `2s` or bare seconds. Zero is rejected.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let duration = parse_interval(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Like [`parse_duration`], but zero is allowed.
pub fn parse_interval(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

/// Parse a byte given as `0x0A` or `10`.
pub fn parse_byte(input: &str) -> CliResult<u8> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| CliError::new(USAGE, format!("invalid byte value: {input}")))
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
