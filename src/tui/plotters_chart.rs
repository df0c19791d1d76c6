//! Plotters-powered price/rainfall chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`. The price line uses the primary (left) axis,
//! rainfall uses a secondary (right) axis.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::ChartData;

/// Render-only chart description; all series are prepared in `ChartData`.
pub struct PriceRainChart<'a> {
    pub data: &'a ChartData,
}

impl<'a> Widget for PriceRainChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.data.x_bounds;
        let [p0, p1] = self.data.price_bounds;
        let [r0, r1] = self.data.rain_bounds;
        if [x0, x1, p0, p1, r0, r1].iter().any(|v| !v.is_finite()) || x1 <= x0 || p1 <= p0 || r1 <= r0 {
            return;
        }

        let data = self.data;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .build_cartesian_2d(x0..x1, p0..p1)?
                .set_secondary_coord(x0..x1, r0..r1);

            // Tick labels are drawn by the caller in terminal cells; Plotters
            // only draws the axis lines.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(0)
                .axis_style(&WHITE)
                .draw()?;

            let rain_color = RGBColor(0, 128, 255);
            let price_color = RGBColor(255, 200, 0);

            // Vertical strokes instead of filled rectangles: the canvas
            // backend renders thin paths more reliably at cell resolution.
            chart.draw_secondary_series(
                data.rain
                    .iter()
                    .filter(|(_, r)| *r > 0.0)
                    .map(|&(x, r)| PathElement::new(vec![(x, 0.0), (x, r)], rain_color)),
            )?;
            chart.draw_series(LineSeries::new(data.price.iter().copied(), &price_color))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
