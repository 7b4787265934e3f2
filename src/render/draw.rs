// src/render/draw.rs
//
// PNG output for prepared chart models. One shared style for every chart.

use anyhow::{anyhow, Result};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::series::Histogram as BarSeries;
use std::ops::Range;
use std::path::Path;

use super::{ArtifactKind, ArtifactSpec, Bar, ChartData, Histogram, MonthlyPivot, Slice};

pub const WIDTH: u32 = 900;
pub const HEIGHT: u32 = 500;
const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 24;
const LABEL_SIZE: u32 = 16;

/// Ten-colour categorical palette shared by all charts.
pub const PALETTE: [RGBColor; 10] = [
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
type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Draw `data` to a PNG at `path`.
pub fn draw_png(path: &Path, spec: &ArtifactSpec, data: &ChartData) -> Result<()> {
    draw(path, spec, data).map_err(|e| anyhow!("drawing {}: {}", path.display(), e))
}

fn draw(path: &Path, spec: &ArtifactSpec, data: &ChartData) -> DrawResult {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    if data.point_count() == 0 {
        draw_no_data(&root, spec)?;
    } else {
        match data {
            ChartData::Slices(slices) => draw_pie(&root, spec, slices)?,
            ChartData::Bars(bars) if spec.kind == ArtifactKind::HorizontalBar => {
                draw_hbars(&root, spec, bars)?
            }
            ChartData::Bars(bars) => draw_bars(&root, spec, bars)?,
            ChartData::Series(pivot) => draw_lines(&root, spec, pivot)?,
            ChartData::Histogram(hist) => draw_histogram(&root, spec, hist)?,
            ChartData::Points(points) => draw_scatter(&root, spec, points)?,
        }
    }

    root.present()?;
    Ok(())
}

fn draw_no_data(root: &Area, spec: &ArtifactSpec) -> DrawResult {
    let area = root.titled(spec.title, (FONT, TITLE_SIZE).into_font())?;
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        "no data",
        (w as i32 / 2 - 30, h as i32 / 2),
        (FONT, LABEL_SIZE).into_font().color(&BLACK.mix(0.6)),
    ))?;
    Ok(())
}

fn draw_pie(root: &Area, spec: &ArtifactSpec, slices: &[Slice]) -> DrawResult {
    // zero and negative slices have no area to draw
    let visible: Vec<&Slice> = slices.iter().filter(|s| s.share > 0.0).collect();
    if visible.is_empty() {
        return draw_no_data(root, spec);
    }

    let area = root.titled(spec.title, (FONT, TITLE_SIZE).into_font())?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.38;
    let sizes: Vec<f64> = visible.iter().map(|s| s.share).collect();
    let labels: Vec<&str> = visible.iter().map(|s| s.label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..visible.len()).map(color).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style((FONT, LABEL_SIZE).into_font().color(&BLACK));
    pie.percentages((FONT, LABEL_SIZE).into_font().color(&WHITE));
    area.draw(&pie)?;
    Ok(())
}

fn draw_bars(root: &Area, spec: &ArtifactSpec, bars: &[Bar]) -> DrawResult {
    let last = bars.len().saturating_sub(1) as u32;
    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, (FONT, TITLE_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            (0..last).into_segmented(),
            value_range(bars.iter().map(|b| b.value)),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|v| segment_label(v, bars))
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style((FONT, LABEL_SIZE).into_font())
        .draw()?;

    chart.draw_series(
        BarSeries::vertical(&chart)
            .style(color(0).filled())
            .margin(8)
            .data(bars.iter().enumerate().map(|(i, b)| (i as u32, b.value))),
    )?;
    Ok(())
}

fn draw_hbars(root: &Area, spec: &ArtifactSpec, bars: &[Bar]) -> DrawResult {
    let last = bars.len().saturating_sub(1) as u32;
    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, (FONT, TITLE_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(
            value_range(bars.iter().map(|b| b.value)),
            (0..last).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(bars.len())
        .y_label_formatter(&|v| segment_label(v, bars))
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style((FONT, LABEL_SIZE).into_font())
        .draw()?;

    chart.draw_series(
        BarSeries::horizontal(&chart)
            .style(color(0).filled())
            .margin(8)
            .data(bars.iter().enumerate().map(|(i, b)| (i as u32, b.value))),
    )?;
    Ok(())
}

fn draw_lines(root: &Area, spec: &ArtifactSpec, pivot: &MonthlyPivot) -> DrawResult {
    let last = pivot.months.len().saturating_sub(1).max(1) as i32;
    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, (FONT, TITLE_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0..last, value_range([0.0, pivot.max_value()]))?;

    chart
        .configure_mesh()
        .x_labels(pivot.months.len())
        .x_label_formatter(&|i| {
            usize::try_from(*i)
                .map(|i| pivot.month_label(i))
                .unwrap_or_default()
        })
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style((FONT, LABEL_SIZE).into_font())
        .draw()?;

    for (ci, category) in pivot.categories.iter().enumerate() {
        let c = color(ci);
        let points: Vec<(i32, f64)> = pivot
            .series(ci)
            .into_iter()
            .map(|(mi, v)| (mi as i32, v))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), c.stroke_width(2)))?
            .label(category.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, c.filled())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, LABEL_SIZE).into_font())
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn draw_histogram(root: &Area, spec: &ArtifactSpec, hist: &Histogram) -> DrawResult {
    let (lo, hi) = match (hist.bins.first(), hist.bins.last()) {
        (Some(first), Some(last)) => (first.lo, last.hi),
        _ => return draw_no_data(root, spec),
    };
    let tallest = hist.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, (FONT, TITLE_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(lo..hi, value_range([0.0, tallest]))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style((FONT, LABEL_SIZE).into_font())
        .draw()?;

    chart.draw_series(hist.bins.iter().map(|b| {
        Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], color(0).filled())
    }))?;
    chart.draw_series(hist.bins.iter().map(|b| {
        Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], WHITE.stroke_width(1))
    }))?;
    Ok(())
}

fn draw_scatter(root: &Area, spec: &ArtifactSpec, points: &[(f64, f64)]) -> DrawResult {
    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, (FONT, TITLE_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            padded_range(points.iter().map(|p| p.0)),
            padded_range(points.iter().map(|p| p.1)),
        )?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style((FONT, LABEL_SIZE).into_font())
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, 5, color(0).mix(0.8).filled())),
    )?;
    Ok(())
}

fn color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

fn segment_label(v: &SegmentValue<u32>, bars: &[Bar]) -> String {
    match v {
        SegmentValue::CenterOf(i) => bars
            .get(*i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Axis range covering 0 and every value, with headroom above the top.
fn value_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if hi <= lo {
        return lo..lo + 1.0;
    }
    let pad = (hi - lo) * 0.1;
    (if lo < 0.0 { lo - pad } else { lo })..hi + pad
}

/// Min..max with 5% padding on both sides.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if hi <= lo {
        return lo - 1.0..hi + 1.0;
    }
    let pad = (hi - lo) * 0.05;
    lo - pad..hi + pad
}
