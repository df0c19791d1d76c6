//! Ratatui-based terminal UI.
//!
//! Runs the same pipeline as `analyze` and shows the dual-axis chart next to
//! a statistics/conclusion panel. `←/→` switch commodity, `r` re-runs (with a
//! fresh seed in demo mode), `q` quits.

use std::io;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::warn;

use crate::app::pipeline::{AnalysisOutput, run_analysis};
use crate::domain::{AnalysisConfig, DataSource, DescriptiveStats};
use crate::error::AppError;
use crate::plot::ChartData;

mod plotters_chart;

use plotters_chart::PriceRainChart;

/// Start the TUI.
pub fn run(config: AnalysisConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, Local::now().date_naive());
    app.rerun();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: AnalysisConfig,
    today: NaiveDate,
    status: String,
    run: Option<AnalysisOutput>,
    chart: Option<ChartData>,
}

impl App {
    fn new(config: AnalysisConfig, today: NaiveDate) -> Self {
        Self {
            config,
            today,
            status: String::new(),
            run: None,
            chart: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => {
                self.config.commodity = self.config.commodity.prev();
                self.rerun();
            }
            KeyCode::Right => {
                self.config.commodity = self.config.commodity.next();
                self.rerun();
            }
            KeyCode::Char('r') => {
                if let DataSource::Sample { seed } = self.config.source {
                    self.config.source = DataSource::Sample {
                        seed: seed.wrapping_add(1),
                    };
                }
                self.rerun();
            }
            _ => {}
        }
        false
    }

    /// Run the pipeline for the current settings. Failures stay on screen.
    fn rerun(&mut self) {
        match run_analysis(&self.config, self.today) {
            Ok(run) => {
                self.chart = ChartData::from_records(&run.cleaned);
                self.status = format!(
                    "{}: {} rows after cleaning",
                    self.config.commodity.label(),
                    run.cleaned.len()
                );
                self.run = Some(run);
            }
            Err(err) => {
                warn!(error = %err, "Analysis failed");
                self.status = err.to_string();
                self.run = None;
                self.chart = None;
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("rainprice", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " | {} price vs rainfall | {}",
                self.config.commodity.label(),
                self.config.location_label
            )),
        ]));

        let source = match self.config.source {
            DataSource::Live => "live".to_string(),
            DataSource::Sample { seed } => format!("demo seed={seed}"),
        };
        let counts = self
            .run
            .as_ref()
            .map(|r| {
                format!(
                    "joined={} kept={} dry={} wet={}",
                    r.cleaning.initial_count,
                    r.cleaning.final_count,
                    r.comparison.dry_count,
                    r.comparison.wet_count
                )
            })
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(Span::styled(
            format!(
                "window: {} | source: {source} | {counts}",
                self.config.window(self.today)
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(46)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_panel(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Price (left) vs rainfall mm (right)")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = &self.chart else {
            let msg = Paragraph::new("No data to chart.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        frame.render_widget(PriceRainChart { data }, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, data);
        }
    }

    fn draw_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Statistics").borders(Borders::ALL);
        let Some(run) = &self.run else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };
        frame.render_widget(Paragraph::new(Text::from(panel_lines(run))).block(block), area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ commodity  r re-run  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn panel_lines(run: &AnalysisOutput) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let gray = Style::default().fg(Color::Gray);
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        format!("{:<8} {:>14} {:>12}", "", "price", "rain mm"),
        bold,
    )));
    let rows: [(&str, fn(&DescriptiveStats) -> Option<f64>); 6] = [
        ("mean", |s| Some(s.mean)),
        ("median", |s| Some(s.median)),
        ("std", |s| s.std),
        ("min", |s| Some(s.min)),
        ("max", |s| Some(s.max)),
        ("cv %", |s| s.cv),
    ];
    for (name, get) in rows {
        lines.push(Line::from(format!(
            "{name:<8} {:>14} {:>12}",
            cell(run.price_stats.as_ref().and_then(get)),
            cell(run.rain_stats.as_ref().and_then(get)),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Dry vs wet (Welch)", bold)));
    let c = &run.comparison;
    lines.push(Line::from(format!(
        "dry n={} mean={}",
        c.dry_count,
        cell(c.dry_mean)
    )));
    lines.push(Line::from(format!(
        "wet n={} mean={}",
        c.wet_count,
        cell(c.wet_mean)
    )));
    match (c.statistic, c.p_value) {
        (Some(t), Some(p)) => lines.push(Line::from(format!("t={t:.3} p={p:.4}"))),
        _ => lines.push(Line::from(Span::styled(c.reason.describe(), gray))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Conclusion", bold)));
    let k = &run.conclusion;
    lines.push(Line::from(format!(
        "r={} {}",
        k.correlation.map(|r| format!("{r:.3}")).unwrap_or_else(|| "N/A".to_string()),
        k.correlation_band.describe()
    )));
    lines.push(Line::from(k.stability_band.describe()));
    lines.push(Line::from(format!(
        "dry days: {} of {}",
        k.zero_rain_day_count, k.total_day_count
    )));
    lines
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 7,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    data: &ChartData,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let [x0, x1] = data.x_bounds;
    let [p0, p1] = data.price_bounds;
    let [r0, r1] = data.rain_bounds;

    // Dates along the bottom; only the outer ticks get labels when narrow.
    for i in 0..ticks {
        if chart.width < 60 && i != 0 && i != ticks - 1 {
            continue;
        }
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = data.date_label(x0 + u * (x1 - x0));
        let label_len = label.len() as u16;
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .clamp(inner.x, (inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;

        let left = format!("{:.0}", p0 + u * (p1 - p0));
        let start = (inner.x + insets.left.saturating_sub(1)).saturating_sub(left.len() as u16);
        if start >= inner.x {
            frame.render_widget(
                Paragraph::new(left.clone()).style(style),
                Rect {
                    x: start,
                    y,
                    width: left.len() as u16,
                    height: 1,
                },
            );
        }

        let right = format!("{:.1}", r0 + u * (r1 - r0));
        let width = (right.len() as u16).min(insets.right.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(right).style(style),
            Rect {
                x: chart.x + chart.width + 1,
                y,
                width,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}
