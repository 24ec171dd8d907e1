//! PNG export of pie charts.
//!
//! Charts are drawn into an in-memory RGB buffer with plotters and then
//! encoded as PNG, so callers get bytes they can offer for download or
//! write wherever they like.

use std::io::Cursor;

use anyhow::{Context, Result, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::pie::PieChart;
use crate::config::ChartConfig;

const TITLE_HEIGHT: u32 = 60;
const TITLE_FONT_SIZE: u32 = 26;
const LABEL_FONT_SIZE: u32 = 18;
const PERCENT_FONT_SIZE: u32 = 16;
const ARC_STEP_DEGREES: f64 = 1.0;

const SLICE_COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Renders `chart` to PNG bytes at the configured size.
pub fn render_png(chart: &PieChart, config: &ChartConfig) -> Result<Vec<u8>> {
    let (width, height) = (config.width, config.height);
    if width == 0 || height <= TITLE_HEIGHT {
        bail!("chart size {width}x{height} is too small");
    }

    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (title_area, pie_area) = root.split_vertically(TITLE_HEIGHT as i32);
        draw_title(&title_area, &chart.title)?;
        draw_slices(&pie_area, chart)?;

        root.present()?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer)
        .context("chart buffer does not match image size")?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("failed to encode chart as PNG")?;

    Ok(png)
}

fn centered(size: u32) -> TextStyle<'static> {
    TextStyle::from(("sans-serif", size).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center))
}

fn draw_title(area: &Area<'_>, title: &str) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    area.draw_text(title, &centered(TITLE_FONT_SIZE), ((w / 2) as i32, (h / 2) as i32))?;
    Ok(())
}

fn draw_slices(area: &Area<'_>, chart: &PieChart) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let center = ((w / 2) as i32, (h / 2) as i32);
    let radius = f64::from(w.min(h)) * 0.32;

    let total = chart.total();
    if chart.slices.is_empty() || total <= 0.0 {
        area.draw_text("No data", &centered(LABEL_FONT_SIZE), center)?;
        return Ok(());
    }

    let label_style = centered(LABEL_FONT_SIZE);
    let percent_style = centered(PERCENT_FONT_SIZE);

    let mut angle = chart.start_angle;
    for (i, (slice, percent)) in chart
        .slices
        .iter()
        .zip(chart.percentage_labels())
        .enumerate()
    {
        let sweep = slice.value / total * 360.0;
        if sweep <= 0.0 {
            continue;
        }
        let color = SLICE_COLORS[i % SLICE_COLORS.len()];

        let points = wedge(center, radius, angle, sweep);
        area.draw(&Polygon::new(points.clone(), color.filled()))?;
        area.draw(&PathElement::new(points, WHITE.stroke_width(2)))?;

        let mid = angle + sweep / 2.0;
        area.draw_text(&slice.label, &label_style, point_at(center, radius * 1.18, mid))?;
        area.draw_text(&percent, &percent_style, point_at(center, radius * 0.62, mid))?;

        angle += sweep;
    }

    Ok(())
}

/// Closed outline of a wedge: the center followed by points along the arc.
fn wedge(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = (sweep / ARC_STEP_DEGREES).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 3);
    points.push(center);
    for step in 0..=steps {
        let degrees = start + sweep * step as f64 / steps as f64;
        points.push(point_at(center, radius, degrees));
    }
    points.push(center);
    points
}

/// Point at `degrees` counter-clockwise from three o'clock, in screen coordinates.
fn point_at(center: (i32, i32), radius: f64, degrees: f64) -> (i32, i32) {
    let radians = degrees.to_radians();
    (
        center.0 + (radius * radians.cos()).round() as i32,
        center.1 - (radius * radians.sin()).round() as i32,
    )
}
