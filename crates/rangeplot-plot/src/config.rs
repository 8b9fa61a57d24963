use std::path::Path;
use std::time::Duration;

use rangeplot_frame::{DecoderConfig, DEFAULT_FAULT_VALUE, DEFAULT_MAX_FRAME_LEN, TERMINATOR};
use rangeplot_transport::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};

/// Samples kept per channel.
pub const DEFAULT_WINDOW_LENGTH: usize = 50;

/// Pause between render ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Top of the fixed y-axis.
pub const DEFAULT_Y_MAX: u16 = 1000;

/// Y-axis top for a given fault value: [`DEFAULT_Y_MAX`], raised when the
/// fault value would otherwise sit above the chart.
pub fn y_axis_max(fault_value: u16) -> u16 {
    DEFAULT_Y_MAX.max(fault_value)
}

/// Default serial port (one end of a virtual tty pair).
pub const DEFAULT_PORT: &str = "/dev/ttys048";

/// Everything needed to open the link and drive the plot.
///
/// Loaded from JSON with every field optional; missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// Serial port name.
    pub port: String,
    pub baud_rate: u32,
    /// Samples kept per channel (N).
    pub window_length: usize,
    pub tick_interval_ms: u64,
    /// Bound on a single blocking byte read.
    pub read_timeout_ms: u64,
    pub terminator_byte: u8,
    /// Value plotted on every channel for a malformed frame.
    pub fault_value: u16,
    pub max_frame_len: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            window_length: DEFAULT_WINDOW_LENGTH,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            terminator_byte: TERMINATOR,
            fault_value: DEFAULT_FAULT_VALUE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl PlotConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PlotError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| PlotError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(PlotError::InvalidWindowLength(self.window_length));
        }
        if self.baud_rate == 0 {
            return Err(PlotError::InvalidConfig(
                "baud_rate must be greater than zero".to_string(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(PlotError::InvalidConfig(
                "read_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.port.trim().is_empty() {
            return Err(PlotError::InvalidConfig("port must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Top of the y-axis for this configuration.
    pub fn y_max(&self) -> u16 {
        y_axis_max(self.fault_value)
    }

    /// Decoder settings derived from this configuration.
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            terminator: self.terminator_byte,
            fault_value: self.fault_value,
            max_frame_len: self.max_frame_len,
        }
    }
}
