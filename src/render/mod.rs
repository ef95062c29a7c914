//! Rendering: aggregated series → chart file.
//!
//! The chart is composed once against the generic plotters `DrawingBackend`
//! and instantiated for the backend matching the output extension.

pub mod pdf;
pub mod scale;

use std::ops::Range;

use anyhow::Result;
use log::{debug, info, warn};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, DrawingAreaErrorKind, IntoDrawingArea};
use plotters::prelude::*;
use plotters_backend::DrawingBackend;

use crate::config::PlotConfig;
use crate::data::model::Series;
use crate::error::PlotError;
use crate::theme::{Theme, generate_palette};
use pdf::PdfBackend;

// ---------------------------------------------------------------------------
// Layout: series projected into chart coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProjectedPoint {
    x: f64,
    mean: f64,
    lower: f64,
    upper: f64,
}

#[derive(Debug, Clone)]
struct ProjectedSeries {
    name: Option<String>,
    points: Vec<ProjectedPoint>,
}

impl ProjectedSeries {
    fn has_band(&self) -> bool {
        self.points.iter().any(|p| p.upper > p.lower)
    }
}

#[derive(Debug, Clone)]
struct ChartLayout {
    x_range: Range<f64>,
    y_range: Range<f64>,
    series: Vec<ProjectedSeries>,
}

impl ChartLayout {
    /// Validate every value against the axis scales and project it.
    fn new(series: &[Series], config: &PlotConfig) -> Result<Self, PlotError> {
        let (xs, ys) = (config.x_scale, config.y_scale);
        let mut projected = Vec::with_capacity(series.len());
        let mut x_values = Vec::new();
        let mut y_values = Vec::new();

        for s in series {
            let mut points = Vec::with_capacity(s.points.len());
            for p in &s.points {
                xs.check("x", p.num_items)?;
                ys.check("y", p.mean)?;
                let lower = if ys.check("y", p.lower).is_err() {
                    warn!(
                        "error band at num_items={} reaches {}; clamped to the mean",
                        p.num_items, p.lower
                    );
                    p.mean
                } else {
                    p.lower
                };

                x_values.push(p.num_items);
                y_values.extend([lower, p.upper]);
                points.push(ProjectedPoint {
                    x: xs.forward(p.num_items),
                    mean: ys.forward(p.mean),
                    lower: ys.forward(lower),
                    upper: ys.forward(p.upper),
                });
            }
            projected.push(ProjectedSeries {
                name: s.name.clone(),
                points,
            });
        }

        if x_values.is_empty() {
            return Err(PlotError::Render("nothing to plot".to_string()));
        }

        let layout = ChartLayout {
            x_range: xs.range(x_values),
            y_range: ys.range(y_values),
            series: projected,
        };
        debug!(
            "chart ranges x={:?} y={:?} ({} series)",
            layout.x_range,
            layout.y_range,
            layout.series.len()
        );
        Ok(layout)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Render `series` to `config.output`. Dispatch by extension.
///
/// Supported formats:
/// * `.pdf` – vector PDF (Helvetica text)
/// * `.svg` – SVG
pub fn render(series: &[Series], config: &PlotConfig, theme: &Theme) -> Result<()> {
    let ext = config
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !matches!(ext.as_str(), "pdf" | "svg") {
        return Err(PlotError::UnsupportedOutput(ext).into());
    }

    let layout = ChartLayout::new(series, config)?;
    let size = (config.width, config.height);

    match ext.as_str() {
        "svg" => draw(
            SVGBackend::new(&config.output, size).into_drawing_area(),
            &layout,
            config,
            theme,
        )?,
        _ => draw(
            PdfBackend::new(&config.output, size).into_drawing_area(),
            &layout,
            config,
            theme,
        )?,
    }

    info!("Wrote {}", config.output.display());
    Ok(())
}

fn render_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Render(e.to_string())
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    config: &PlotConfig,
    theme: &Theme,
) -> Result<(), PlotError> {
    let font = |size: f64| (theme.font_family, size).into_font().color(&theme.text);

    root.fill(&theme.figure_face).map_err(render_err)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(72);
    if let Some(title) = &config.title {
        builder.caption(title, font(theme.title_font_size));
    }
    let mut chart = builder
        .build_cartesian_2d(layout.x_range.clone(), layout.y_range.clone())
        .map_err(render_err)?;

    chart
        .plotting_area()
        .fill(&theme.axes_face)
        .map_err(render_err)?;

    let x_fmt = |v: &f64| config.x_scale.tick_label(*v, &layout.x_range);
    let y_fmt = |v: &f64| config.y_scale.tick_label(*v, &layout.y_range);
    chart
        .configure_mesh()
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .x_labels(config.x_scale.tick_count(&layout.x_range))
        .y_labels(config.y_scale.tick_count(&layout.y_range))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .bold_line_style(theme.grid.stroke_width(1))
        .light_line_style(theme.axes_face)
        .axis_style(theme.axes_face)
        .set_all_tick_mark_size(0)
        .label_style(font(theme.tick_font_size))
        .axis_desc_style(font(theme.label_font_size))
        .draw()
        .map_err(render_err)?;

    let colors = generate_palette(layout.series.len());

    // Bands first so no line is hidden under a neighbour's fill.
    for (s, &color) in layout.series.iter().zip(&colors) {
        if !s.has_band() {
            continue;
        }
        let outline: Vec<(f64, f64)> = s
            .points
            .iter()
            .map(|p| (p.x, p.upper))
            .chain(s.points.iter().rev().map(|p| (p.x, p.lower)))
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(
                outline,
                color.mix(theme.band_alpha).filled(),
            )))
            .map_err(render_err)?;
    }

    for (s, &color) in layout.series.iter().zip(&colors) {
        let line = chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|p| (p.x, p.mean)),
                color.stroke_width(theme.line_width),
            ))
            .map_err(render_err)?;
        if let Some(name) = &s.name {
            let width = theme.line_width;
            line.label(name.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
            });
        }
    }

    if layout.series.iter().any(|s| s.name.is_some()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(theme.figure_face.mix(0.8))
            .border_style(theme.text.mix(0.2))
            .label_font(font(theme.tick_font_size))
            .draw()
            .map_err(render_err)?;
    }

    root.present().map_err(render_err)?;
    Ok(())
}
