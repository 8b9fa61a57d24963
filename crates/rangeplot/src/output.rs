use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rangeplot_frame::Channel;
use rangeplot_plot::{DisplayState, RenderSink};
use rangeplot_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full-screen terminal chart.
    Chart,
    /// One JSON object per tick.
    Json,
    /// One line of text per tick.
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Chart
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct TickOutput<'a> {
    tick: u64,
    status: &'a str,
    x: &'a [usize],
    lidar: &'a [u16],
    ultra: &'a [u16],
    kalman: &'a [u16],
}

fn status_name(state: &DisplayState) -> &'static str {
    state.status.map(|s| s.as_str()).unwrap_or("idle")
}

/// Writes every tick as a JSON line.
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn render(&mut self, state: &DisplayState) -> rangeplot_plot::Result<()> {
        let line = TickOutput {
            tick: state.tick,
            status: status_name(state),
            x: &state.x,
            lidar: state.series(Channel::Lidar).1,
            ultra: state.series(Channel::Ultrasonic).1,
            kalman: state.series(Channel::Kalman).1,
        };
        serde_json::to_writer(&mut self.out, &line).map_err(std::io::Error::other)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes the newest value of each channel, one line per tick.
pub struct PrettySink<W> {
    out: W,
}

impl<W: Write> PrettySink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for PrettySink<W> {
    fn render(&mut self, state: &DisplayState) -> rangeplot_plot::Result<()> {
        let [lidar, ultra, kalman] = state.latest();
        writeln!(
            self.out,
            "tick={} status={} lidar={lidar} ultra={ultra} kalman={kalman}",
            state.tick,
            status_name(state),
        )?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    product: Option<&'a str>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|p| PortOutput {
                    name: &p.name,
                    kind: p.kind,
                    product: p.product.as_deref(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Chart => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for port in ports {
                match &port.product {
                    Some(product) => println!("{} ({}, {product})", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}
