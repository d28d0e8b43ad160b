use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, BorderType, Borders, Paragraph,
    },
    Frame, Terminal,
};

use crate::error::MonitorError;
use crate::theme::{Rgb, BORDER_GREEN, DARK_BG, TITLE_GREEN};

/// The two bar charts drawn each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Series {
    Processor,
    Memory,
}

/// Surface the loop pushes render parameters to.
pub trait RenderSink {
    fn update(&mut self, series: Series, x_positions: &[f64], heights: &[f64], colors: &[Rgb], width: f64);
    fn set_title(&mut self, title: String);
    /// Redraws both charts and drains pending key events. Returns `false`
    /// once the operator has asked to quit.
    fn refresh(&mut self) -> Result<bool, MonitorError>;
}

#[derive(Default)]
struct SeriesData {
    x_positions: Vec<f64>,
    heights: Vec<f64>,
    colors: Vec<Rgb>,
    width: f64,
}

/// Terminal renderer: two stacked bar panels (processor on top, memory
/// below) on a Braille canvas, newest bar at the right edge.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
    window_secs: f64,
    processor: SeriesData,
    memory: SeriesData,
}

impl Tui {
    pub fn new(window_secs: f64) -> Result<Self, MonitorError> {
        crossterm::terminal::enable_raw_mode().map_err(MonitorError::Terminal)?;
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)
            .map_err(MonitorError::Terminal)?;
        let terminal =
            Terminal::new(CrosstermBackend::new(io::stdout())).map_err(MonitorError::Terminal)?;

        Ok(Self {
            terminal,
            title: String::new(),
            window_secs,
            processor: SeriesData::default(),
            memory: SeriesData::default(),
        })
    }

    fn quit_requested() -> Result<bool, MonitorError> {
        // Drain whatever arrived since the last tick without blocking; the
        // inter-tick sleep is the loop's only suspension point.
        while event::poll(Duration::from_millis(0)).map_err(MonitorError::Terminal)? {
            if let Event::Key(key) = event::read().map_err(MonitorError::Terminal)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    _ => {}
                }
            }
        }
        Ok(false)
    }
}

impl RenderSink for Tui {
    fn update(&mut self, series: Series, x_positions: &[f64], heights: &[f64], colors: &[Rgb], width: f64) {
        let slot = match series {
            Series::Processor => &mut self.processor,
            Series::Memory => &mut self.memory,
        };
        slot.x_positions = x_positions.to_vec();
        slot.heights = heights.to_vec();
        slot.colors = colors.to_vec();
        slot.width = width;
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn refresh(&mut self) -> Result<bool, MonitorError> {
        let title = &self.title;
        let window_secs = self.window_secs;
        let processor = &self.processor;
        let memory = &self.memory;

        self.terminal
            .draw(|frame| render(frame, title, window_secs, processor, memory))
            .map_err(MonitorError::Terminal)?;

        Ok(!Self::quit_requested()?)
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Restore the operator's terminal on every exit path.
        let _ = crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen);
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

fn render(frame: &mut Frame, title: &str, window_secs: f64, processor: &SeriesData, memory: &SeriesData) {
    let background = Block::default().style(Style::default().bg(DARK_BG));
    frame.render_widget(background, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(frame.area());

    let header = Paragraph::new(title.to_string())
        .style(Style::default().fg(TITLE_GREEN).bg(DARK_BG).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(header, chunks[0]);

    draw_series(frame, chunks[1], " GPU processor (%) ", window_secs, processor);
    draw_series(
        frame,
        chunks[2],
        &format!(" GPU memory (%) - last {window_secs:.0}s "),
        window_secs,
        memory,
    );
}

fn draw_series(frame: &mut Frame, area: Rect, label: &str, window_secs: f64, series: &SeriesData) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_GREEN))
        .title(label.to_string())
        .title_style(Style::default().fg(TITLE_GREEN))
        .style(Style::default().bg(DARK_BG));

    // Braille gives two dot columns per cell; sweep each bar at that
    // resolution so the fill has no holes.
    let inner = block.inner(area);
    let step = (window_secs / (inner.width.max(1) as f64 * 2.0)).max(1e-6);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, window_secs])
        .y_bounds([0.0, 100.0])
        .paint(|ctx| {
            for ((&x, &height), &color) in series
                .x_positions
                .iter()
                .zip(series.heights.iter())
                .zip(series.colors.iter())
            {
                let half = series.width / 2.0;
                let right = (x + half).min(window_secs);
                let mut sweep = (x - half).max(0.0);
                while sweep <= right {
                    ctx.draw(&CanvasLine {
                        x1: sweep,
                        y1: 0.0,
                        x2: sweep,
                        y2: height,
                        color: color.into(),
                    });
                    sweep += step;
                }
            }
        });

    frame.render_widget(canvas, area);
}
