//! Full-screen chart of the three channel windows.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rangeplot_frame::{Channel, CHANNELS};
use rangeplot_plot::{DisplayState, RenderSink};
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Terminal,
};

pub fn channel_color(channel: Channel) -> Color {
    match channel {
        Channel::Lidar => Color::Green,
        Channel::Ultrasonic => Color::Blue,
        Channel::Kalman => Color::Magenta,
    }
}

/// Redraws a line chart on the alternate screen every tick.
///
/// `q`, Esc and Ctrl-C clear `running`. The terminal is restored on drop.
pub struct ChartSink {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    running: Arc<AtomicBool>,
    title: String,
}

impl ChartSink {
    pub fn new(title: impl Into<String>, running: Arc<AtomicBool>) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(err);
            }
        };

        Ok(Self {
            terminal,
            running,
            title: title.into(),
        })
    }

    fn poll_keys(&self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let quit = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => true,
                KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
                _ => false,
            };
            if quit {
                self.running.store(false, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

fn points(state: &DisplayState, channel: Channel) -> Vec<(f64, f64)> {
    let (x, y) = state.series(channel);
    x.iter()
        .zip(y)
        .map(|(&x, &y)| (x as f64, f64::from(y)))
        .collect()
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Line<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(|v| Line::from(format!("{v:.0}")))
        .collect()
}

fn status_line(state: &DisplayState) -> Line<'static> {
    let status = state.status.map(|s| s.as_str()).unwrap_or("idle");
    let mut spans = vec![Span::raw(format!("tick {}  {status}  ", state.tick))];
    for (channel, value) in CHANNELS.into_iter().zip(state.latest()) {
        spans.push(Span::styled(
            format!("{channel}={value}  "),
            Style::default().fg(channel_color(channel)),
        ));
    }
    spans.push(Span::styled(
        "q to quit",
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

impl RenderSink for ChartSink {
    fn render(&mut self, state: &DisplayState) -> rangeplot_plot::Result<()> {
        let series: Vec<(Channel, Vec<(f64, f64)>)> = CHANNELS
            .into_iter()
            .map(|channel| (channel, points(state, channel)))
            .collect();
        let title = self.title.as_str();

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(1)])
                .split(f.area());

            let datasets = series
                .iter()
                .map(|(channel, data)| {
                    Dataset::default()
                        .name(channel.name())
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(channel_color(*channel)))
                        .data(data)
                })
                .collect::<Vec<_>>();

            let chart = Chart::new(datasets)
                .block(
                    Block::default()
                        .title(Span::styled(
                            title,
                            Style::default().add_modifier(Modifier::BOLD),
                        ))
                        .borders(Borders::ALL),
                )
                .x_axis(
                    Axis::default()
                        .title("sample")
                        .style(Style::default().fg(Color::Gray))
                        .bounds(state.x_bounds)
                        .labels(axis_labels(state.x_bounds)),
                )
                .y_axis(
                    Axis::default()
                        .title("distance")
                        .style(Style::default().fg(Color::Gray))
                        .bounds(state.y_bounds)
                        .labels(axis_labels(state.y_bounds)),
                );

            f.render_widget(chart, chunks[0]);
            f.render_widget(Paragraph::new(status_line(state)), chunks[1]);
        })?;

        self.poll_keys()?;
        Ok(())
    }
}

impl Drop for ChartSink {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
