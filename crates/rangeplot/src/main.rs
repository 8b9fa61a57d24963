mod cmd;
mod exit;
mod logging;
mod output;
mod tui;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel, LogTarget};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "rangeplot",
    version,
    about = "Plot lidar, ultrasonic and kalman readings from a serial link"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format.
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Append logs to a file instead of stderr.
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn log_target<'a>(log_file: Option<&'a PathBuf>, format: OutputFormat) -> LogTarget<'a> {
    match (log_file, format) {
        (Some(path), _) => LogTarget::File(path),
        // The chart owns the terminal; stray stderr lines would tear it.
        (None, OutputFormat::Chart) => LogTarget::Discard,
        (None, _) => LogTarget::Stderr,
    }
}

fn main() {
    let cli = Cli::parse();

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    init_logging(
        cli.log_format,
        cli.log_level,
        log_target(cli.log_file.as_ref(), format),
    );

    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
