//! SVG chart export (price line on the left axis, rainfall bars on the right).

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::app::pipeline::AnalysisOutput;
use crate::error::AppError;
use crate::plot::ChartData;
use crate::report::ReportSink;

/// Chart title for a run.
pub fn chart_title(output: &AnalysisOutput) -> String {
    format!(
        "{} price vs rainfall ({})",
        output.context.commodity.label(),
        output.context.location
    )
}

/// Subtitle line with the headline numbers.
pub fn chart_subtitle(output: &AnalysisOutput) -> String {
    let fmt = |v: Option<f64>, d: usize| match v {
        Some(v) if v.is_finite() => format!("{v:.d$}"),
        _ => "N/A".to_string(),
    };
    format!(
        "{} | r = {} | t = {}",
        output.context.window,
        fmt(output.conclusion.correlation, 3),
        fmt(output.comparison.statistic, 4)
    )
}

/// Render the dual-axis chart into an SVG file.
pub fn write_svg_chart(
    path: &Path,
    title: &str,
    subtitle: &str,
    data: &ChartData,
    size: (u32, u32),
) -> Result<(), AppError> {
    draw_svg(path, title, subtitle, data, size)
        .map_err(|e| AppError::io(format!("Failed to draw SVG chart '{}': {e}", path.display())))?;
    info!(path = %path.display(), "Wrote SVG chart");
    Ok(())
}

fn draw_svg(
    path: &Path,
    title: &str,
    subtitle: &str,
    data: &ChartData,
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(title, ("sans-serif", 22))?;

    let [x0, x1] = data.x_bounds;
    let [p0, p1] = data.price_bounds;
    let [r0, r1] = data.rain_bounds;

    let mut chart = ChartBuilder::on(&area)
        .caption(subtitle, ("sans-serif", 14))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .right_y_label_area_size(60)
        .build_cartesian_2d(x0..x1, p0..p1)?
        .set_secondary_coord(x0..x1, r0..r1);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("date")
        .y_desc("price")
        .x_labels(6)
        .x_label_formatter(&|x| data.date_label(*x))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("rainfall (mm)")
        .y_label_formatter(&|y| format!("{y:.1}"))
        .draw()?;

    let rain_color = RGBColor(70, 130, 180);
    chart
        .draw_secondary_series(
            data.rain
                .iter()
                .filter(|(_, r)| *r > 0.0)
                .map(|&(x, r)| Rectangle::new([(x - 0.4, 0.0), (x + 0.4, r)], rain_color.mix(0.5).filled())),
        )?
        .label("rainfall (mm)")
        .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 16, y + 4)], rain_color.mix(0.5).filled()));

    chart
        .draw_series(LineSeries::new(data.price.iter().copied(), &RED))?
        .label("price")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Sink writing the chart to an SVG file.
#[derive(Debug, Clone)]
pub struct SvgChart {
    pub path: PathBuf,
    pub size: (u32, u32),
}

impl SvgChart {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            size: (1200, 600),
        }
    }
}

impl ReportSink for SvgChart {
    fn emit(&mut self, output: &AnalysisOutput) -> Result<(), AppError> {
        let Some(data) = ChartData::from_records(&output.cleaned) else {
            warn!(
                context = %output.context,
                path = %self.path.display(),
                "No aligned rows to chart; SVG not written"
            );
            return Ok(());
        };
        write_svg_chart(
            &self.path,
            &chart_title(output),
            &chart_subtitle(output),
            &data,
            self.size,
        )
    }
}
