use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::ValueEnum;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Off => tracing::level_filters::LevelFilter::OFF,
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

/// Where log lines go.
pub enum LogTarget<'a> {
    Stderr,
    /// Append to a file; used while the terminal chart owns the screen.
    File(&'a Path),
    /// Drop everything.
    Discard,
}

pub fn init_logging(format: LogFormat, level: LogLevel, target: LogTarget<'_>) {
    match target {
        LogTarget::Stderr => install(format, level, std::io::stderr),
        LogTarget::File(path) => {
            match File::options().create(true).append(true).open(path) {
                Ok(file) => install(format, level, Mutex::new(file)),
                Err(err) => {
                    eprintln!("warning: cannot open log file {}: {err}", path.display());
                    install(format, LogLevel::Off, std::io::sink);
                }
            }
        }
        LogTarget::Discard => install(format, LogLevel::Off, std::io::sink),
    }
}

fn install<W>(format: LogFormat, level: LogLevel, writer: W)
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
