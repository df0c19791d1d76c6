//! Dual-axis ASCII chart for terminal output.
//!
//! Fixed-size grid with deterministic output (golden-tested):
//!
//! - price: `o` points joined by `-`, scaled to the left axis
//! - rainfall: `#` bars from the bottom row, scaled to the right axis
//!
//! The right axis tops out at `max(1, 1.5 * max rainfall)` so bars stay in
//! the lower part of the chart and leave room for the price line.

use std::io::Write;

use crate::app::pipeline::AnalysisOutput;
use crate::domain::AlignedRecord;
use crate::error::AppError;
use crate::report::ReportSink;

/// Upper bound of the rainfall axis.
pub fn rain_axis_max(records: &[AlignedRecord]) -> f64 {
    let max_rain = records
        .iter()
        .map(|r| r.rainfall_mm)
        .fold(0.0_f64, f64::max);
    (1.5 * max_rain).max(1.0)
}

/// Render the chart. `correlation` and `statistic` go into the header.
pub fn render_ascii_chart(
    records: &[AlignedRecord],
    correlation: Option<f64>,
    statistic: Option<f64>,
    width: usize,
    height: usize,
) -> String {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return "Chart: no aligned rows to plot\n".to_string();
    };

    let width = width.max(10);
    let height = height.max(5);

    let x_span = ((last.date - first.date).num_days() as f64).max(1.0);
    let (y_min, y_max) = price_range(records);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let rain_max = rain_axis_max(records);

    let mut grid = vec![vec![' '; width]; height];

    // Rain bars first; the price line overlays them.
    for r in records.iter().filter(|r| r.is_wet()) {
        let x = map_x(day_offset(r, first), 0.0, x_span, width);
        let top = map_y(r.rainfall_mm, 0.0, rain_max, height);
        for row in grid.iter_mut().skip(top) {
            row[x] = '#';
        }
    }

    let points: Vec<(usize, usize)> = records
        .iter()
        .map(|r| {
            (
                map_x(day_offset(r, first), 0.0, x_span, width),
                map_y(r.price, y_min, y_max, height),
            )
        })
        .collect();
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &points {
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Chart: {}..{} | price=[{y_min:.0}, {y_max:.0}] (o, left) | rain=[0.0, {rain_max:.1}]mm (#, right)\n",
        first.date, last.date
    ));
    out.push_str(&format!(
        "r = {} | t = {}\n",
        fmt_header(correlation, 3),
        fmt_header(statistic, 4)
    ));

    let last_row = height - 1;
    for (i, row) in grid.into_iter().enumerate() {
        let (left, right) = match i {
            0 => (format!("{y_max:.0}"), format!("{rain_max:.1}")),
            i if i == last_row => (format!("{y_min:.0}"), "0.0".to_string()),
            _ => (String::new(), String::new()),
        };
        out.push_str(&format!("{left:>10}|{}|{right}\n", row.into_iter().collect::<String>()));
    }

    out
}

fn fmt_header(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "N/A".to_string(),
    }
}

fn day_offset(r: &AlignedRecord, first: &AlignedRecord) -> f64 {
    (r.date - first.date).num_days() as f64
}

fn price_range(records: &[AlignedRecord]) -> (f64, f64) {
    let min = records.iter().map(|r| r.price).fold(f64::INFINITY, f64::min);
    let max = records.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max);
    if max > min { (min, max) } else { (min - 1.0, max + 1.0) }
}

pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Sink printing the ASCII chart to a writer.
pub struct AsciiChart<W: Write> {
    writer: W,
    width: usize,
    height: usize,
}

impl<W: Write> AsciiChart<W> {
    pub fn new(writer: W, width: usize, height: usize) -> Self {
        Self {
            writer,
            width,
            height,
        }
    }
}

impl<W: Write> ReportSink for AsciiChart<W> {
    fn emit(&mut self, output: &AnalysisOutput) -> Result<(), AppError> {
        let chart = render_ascii_chart(
            &output.cleaned,
            output.conclusion.correlation,
            output.comparison.statistic,
            self.width,
            self.height,
        );
        writeln!(self.writer, "{chart}")
            .map_err(|e| AppError::io(format!("Failed to write chart: {e}")))
    }
}
