// src/render/mod.rs
//
// ResultSet -> drawable model. Drawing and file formats live in the
// submodules; everything here is pure so it can be tested without fonts.

pub mod draw;
pub mod pivot;
pub mod slider;
pub mod workbook;

use anyhow::Result;
use std::fmt;

pub use pivot::MonthlyPivot;

use crate::error::ReportError;
use crate::source::{Column, ResultSet, Scalar};

/// Fixed bin count for every histogram.
pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pie,
    Bar,
    HorizontalBar,
    Line,
    Histogram,
    Scatter,
    Spreadsheet,
    Slider,
}

impl ArtifactKind {
    /// Short name used in status lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Pie => "pie",
            ArtifactKind::Bar => "bar",
            ArtifactKind::HorizontalBar => "barh",
            ArtifactKind::Line => "line",
            ArtifactKind::Histogram => "hist",
            ArtifactKind::Scatter => "scatter",
            ArtifactKind::Spreadsheet => "xlsx",
            ArtifactKind::Slider => "slider",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one report's rows become a file.
///
/// `columns` names the input columns in the order the chart kind reads them:
/// (label, value) for pie and bars, (month, category, value) for line,
/// (value) for histogram and (x, y) for scatter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSpec {
    pub kind: ArtifactKind,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub output: &'static str,
    pub about: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    /// Fraction of the positive total, 0 when the total is not positive.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Half-open bin `[lo, hi)`; the last bin also holds `hi`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width buckets spanning min..max.
    ///
    /// A single distinct value gets the unit-wide range around it.
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        if values.is_empty() || bins == 0 {
            return Self::default();
        }
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Self {
            bins: counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| Bin {
                    lo: lo + i as f64 * width,
                    hi: lo + (i + 1) as f64 * width,
                    count,
                })
                .collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Drawable model of one chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Slices(Vec<Slice>),
    Bars(Vec<Bar>),
    Series(MonthlyPivot),
    Histogram(Histogram),
    Points(Vec<(f64, f64)>),
}

impl ChartData {
    /// Number of plotted values; 0 means the chart is drawn as "no data".
    pub fn point_count(&self) -> usize {
        match self {
            ChartData::Slices(s) => s.len(),
            ChartData::Bars(b) => b.len(),
            ChartData::Series(p) => p.months.len() * p.categories.len(),
            ChartData::Histogram(h) => h.total(),
            ChartData::Points(p) => p.len(),
        }
    }

    fn empty(kind: ArtifactKind) -> Option<Self> {
        Some(match kind {
            ArtifactKind::Pie => ChartData::Slices(Vec::new()),
            ArtifactKind::Bar | ArtifactKind::HorizontalBar => ChartData::Bars(Vec::new()),
            ArtifactKind::Line => ChartData::Series(MonthlyPivot::default()),
            ArtifactKind::Histogram => ChartData::Histogram(Histogram::default()),
            ArtifactKind::Scatter => ChartData::Points(Vec::new()),
            ArtifactKind::Spreadsheet | ArtifactKind::Slider => return None,
        })
    }
}

/// Shape `rs` into the model `spec.kind` draws.
///
/// An empty result set yields an empty model without looking at columns.
pub fn prepare(spec: &ArtifactSpec, rs: &ResultSet) -> Result<ChartData> {
    let empty = ChartData::empty(spec.kind).ok_or_else(|| shape(spec, "not a chart kind"))?;
    if rs.is_empty() {
        return Ok(empty);
    }

    let data = match spec.kind {
        ArtifactKind::Pie => {
            let bars = labelled_values(spec, rs)?;
            let total: f64 = bars.iter().map(|b| b.value).filter(|v| *v > 0.0).sum();
            ChartData::Slices(
                bars.into_iter()
                    .map(|b| Slice {
                        share: if total > 0.0 { b.value.max(0.0) / total } else { 0.0 },
                        label: b.label,
                        value: b.value,
                    })
                    .collect(),
            )
        }
        ArtifactKind::Bar | ArtifactKind::HorizontalBar => {
            ChartData::Bars(labelled_values(spec, rs)?)
        }
        ArtifactKind::Line => {
            let month = input(spec, rs, 0)?;
            let category = input(spec, rs, 1)?;
            let value = numeric_input(spec, rs, 2)?;
            ChartData::Series(MonthlyPivot::from_columns(month, category, value).map_err(
                |e| shape(spec, &format!("{:#}", e)),
            )?)
        }
        ArtifactKind::Histogram => {
            let values: Vec<f64> = numeric_input(spec, rs, 0)?
                .values
                .iter()
                .filter_map(Scalar::as_f64)
                .collect();
            ChartData::Histogram(Histogram::from_values(&values, HISTOGRAM_BINS))
        }
        ArtifactKind::Scatter => {
            let x = numeric_input(spec, rs, 0)?;
            let y = numeric_input(spec, rs, 1)?;
            ChartData::Points(
                x.values
                    .iter()
                    .zip(&y.values)
                    .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
                    .collect(),
            )
        }
        ArtifactKind::Spreadsheet | ArtifactKind::Slider => return Ok(empty),
    };
    Ok(data)
}

fn labelled_values(spec: &ArtifactSpec, rs: &ResultSet) -> Result<Vec<Bar>> {
    let labels = input(spec, rs, 0)?;
    let values = numeric_input(spec, rs, 1)?;
    Ok(labels
        .values
        .iter()
        .zip(&values.values)
        .filter_map(|(label, value)| {
            Some(Bar {
                value: value.as_f64()?,
                label: label.to_string(),
            })
        })
        .collect())
}

fn input<'a>(spec: &ArtifactSpec, rs: &'a ResultSet, idx: usize) -> Result<&'a Column> {
    let name = spec
        .columns
        .get(idx)
        .ok_or_else(|| shape(spec, &format!("no input column #{} configured", idx + 1)))?;
    rs.column(name).ok_or_else(|| {
        shape(
            spec,
            &format!("missing column `{}` (have: {})", name, rs.column_names().join(", ")),
        )
        .into()
    })
}

fn numeric_input<'a>(spec: &ArtifactSpec, rs: &'a ResultSet, idx: usize) -> Result<&'a Column> {
    let col = input(spec, rs, idx)?;
    if col.values.iter().any(|v| !v.is_null() && !v.is_numeric()) {
        return Err(shape(spec, &format!("column `{}` is not numeric", col.name)).into());
    }
    Ok(col)
}

fn shape(spec: &ArtifactSpec, message: &str) -> ReportError {
    ReportError::Shape {
        output: spec.output.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: ArtifactKind, columns: &'static [&'static str]) -> ArtifactSpec {
        ArtifactSpec {
            kind,
            title: "t",
            x_label: "x",
            y_label: "y",
            output: "out.png",
            about: "test chart",
            columns,
        }
    }

    #[test]
    fn test_pie_shares_follow_values() {
        let rs = ResultSet::from_rows(
            &["category_name", "revenue"],
            vec![
                vec!["Electronics".into(), Scalar::Float(100.0)],
                vec!["Books".into(), Scalar::Float(50.0)],
            ],
        )
        .unwrap();
        let data = prepare(&spec(ArtifactKind::Pie, &["category_name", "revenue"]), &rs).unwrap();
        let ChartData::Slices(slices) = data else {
            panic!("expected slices");
        };
        assert_eq!(slices.len(), 2);
        assert!((slices[0].share / slices[1].share - 2.0).abs() < 1e-12);
        let total: f64 = slices.iter().map(|s| s.share).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_result_has_no_points_for_every_chart_kind() {
        let rs = ResultSet::default();
        for kind in [
            ArtifactKind::Pie,
            ArtifactKind::Bar,
            ArtifactKind::HorizontalBar,
            ArtifactKind::Line,
            ArtifactKind::Histogram,
            ArtifactKind::Scatter,
        ] {
            let data = prepare(&spec(kind, &["missing"]), &rs).unwrap();
            assert_eq!(data.point_count(), 0, "{kind}");
        }
    }

    #[test]
    fn test_spreadsheet_is_not_a_chart() {
        let rs = ResultSet::default();
        let err = prepare(&spec(ArtifactKind::Spreadsheet, &[]), &rs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::Shape { .. })
        ));
    }

    #[test]
    fn test_null_values_skipped_and_null_labels_blank() {
        let rs = ResultSet::from_rows(
            &["name", "v"],
            vec![
                vec![Scalar::Null, Scalar::Int(3)],
                vec!["b".into(), Scalar::Null],
                vec!["c".into(), Scalar::Float(1.5)],
            ],
        )
        .unwrap();
        let data = prepare(&spec(ArtifactKind::Bar, &["name", "v"]), &rs).unwrap();
        assert_eq!(
            data,
            ChartData::Bars(vec![
                Bar {
                    label: String::new(),
                    value: 3.0
                },
                Bar {
                    label: "c".into(),
                    value: 1.5
                },
            ])
        );
    }

    #[test]
    fn test_missing_and_non_numeric_columns_are_shape_errors() {
        let rs = ResultSet::from_rows(&["name", "v"], vec![vec!["a".into(), "x".into()]]).unwrap();
        for columns in [&["name", "nope"], &["name", "v"]] {
            let err = prepare(&spec(ArtifactKind::Bar, columns), &rs).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ReportError>(),
                Some(ReportError::Shape { .. })
            ));
        }
    }

    #[test]
    fn test_histogram_uses_fixed_bins() {
        let values: Vec<Scalar> = (0..=100).map(Scalar::Int).collect();
        let rs = ResultSet::new(vec![Column::new("order_total", values)]).unwrap();
        let data = prepare(&spec(ArtifactKind::Histogram, &["order_total"]), &rs).unwrap();
        let ChartData::Histogram(h) = data else {
            panic!("expected histogram");
        };
        assert_eq!(h.bins.len(), HISTOGRAM_BINS);
        assert_eq!(h.total(), 101);
        assert_eq!(h.bins[0].lo, 0.0);
        assert_eq!(h.bins[19].hi, 100.0);
        // max value lands in the last bin
        assert_eq!(h.bins[19].count, 6);
    }

    #[test]
    fn test_histogram_single_value() {
        let h = Histogram::from_values(&[7.0, 7.0], HISTOGRAM_BINS);
        assert_eq!(h.bins.len(), HISTOGRAM_BINS);
        assert_eq!(h.total(), 2);
        assert_eq!(h.bins[0].lo, 6.5);
    }

    #[test]
    fn test_scatter_drops_incomplete_points() {
        let rs = ResultSet::from_rows(
            &["product_price", "qty_sold"],
            vec![
                vec![Scalar::Float(10.0), Scalar::Int(2)],
                vec![Scalar::Null, Scalar::Int(1)],
                vec![Scalar::Float(5.0), Scalar::Int(4)],
            ],
        )
        .unwrap();
        let data = prepare(
            &spec(ArtifactKind::Scatter, &["product_price", "qty_sold"]),
            &rs,
        )
        .unwrap();
        assert_eq!(data, ChartData::Points(vec![(10.0, 2.0), (5.0, 4.0)]));
    }
}
