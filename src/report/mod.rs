// src/report/mod.rs
//
// The fixed report batch: six charts then one workbook, each run in
// isolation so one broken query does not stop the rest.

pub mod explore;

use anyhow::Result;
use std::time::Instant;
use tracing::{error, info};

use crate::catalog;
use crate::render::workbook::SheetSpec;
use crate::render::{self, ArtifactKind, ArtifactSpec};
use crate::sink::{Artifact, ArtifactSink};
use crate::source::DataSource;

/// A catalog query paired with the artifact it feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartReport {
    pub query: &'static str,
    pub spec: ArtifactSpec,
}

pub const CHART_REPORTS: &[ChartReport] = &[
    ChartReport {
        query: "revenue_by_category",
        spec: ArtifactSpec {
            kind: ArtifactKind::Pie,
            title: "Revenue share by category",
            x_label: "",
            y_label: "",
            output: "pie_revenue_by_category.png",
            about: "Revenue distribution across categories",
            columns: &["category_name", "revenue"],
        },
    },
    ChartReport {
        query: "top_products",
        spec: ArtifactSpec {
            kind: ArtifactKind::Bar,
            title: "Top-10 products by revenue",
            x_label: "Product",
            y_label: "Revenue",
            output: "bar_top_products.png",
            about: "Top-10 products by revenue",
            columns: &["product_name", "revenue"],
        },
    },
    ChartReport {
        query: "aov_by_address",
        spec: ArtifactSpec {
            kind: ArtifactKind::HorizontalBar,
            title: "Average order value by address",
            x_label: "Average order value",
            y_label: "",
            output: "barh_aov_by_address.png",
            about: "Average order value by address",
            columns: &["address_name", "avg_order_value"],
        },
    },
    ChartReport {
        query: "monthly_revenue_by_category",
        spec: ArtifactSpec {
            kind: ArtifactKind::Line,
            title: "Monthly revenue by category",
            x_label: "Month",
            y_label: "Revenue",
            output: "line_monthly_rev_by_category.png",
            about: "Monthly revenue by category (trend)",
            columns: &["month", "category_name", "revenue"],
        },
    },
    ChartReport {
        query: "order_totals",
        spec: ArtifactSpec {
            kind: ArtifactKind::Histogram,
            title: "Distribution of order totals",
            x_label: "Order total",
            y_label: "Count of orders",
            output: "hist_order_totals.png",
            about: "Distribution of order totals",
            columns: &["order_total"],
        },
    },
    ChartReport {
        query: "price_vs_qty",
        spec: ArtifactSpec {
            kind: ArtifactKind::Scatter,
            title: "Price vs quantity sold",
            x_label: "Product price",
            y_label: "Quantity sold",
            output: "scatter_price_vs_qty.png",
            about: "Price vs sales volume (by product)",
            columns: &["product_price", "qty_sold"],
        },
    },
];

/// Interactive page; run on demand only.
pub const TIME_SLIDER: ChartReport = ChartReport {
    query: "monthly_revenue_by_category",
    spec: ArtifactSpec {
        kind: ArtifactKind::Slider,
        title: "Monthly revenue by category (time slider)",
        x_label: "Category",
        y_label: "Revenue",
        output: "slider_monthly_rev_by_category.html",
        about: "Monthly revenue by category (time slider)",
        columns: &["month", "category_name", "revenue"],
    },
};

pub const EXPORT_FILE: &str = "nomadshop_sample.xlsx";
const EXPORT_ABOUT: &str = "Orders and line items sample";
/// (sheet name, catalog query) in sheet order.
pub const EXPORT_SHEETS: &[(&str, &str)] = &[("orders", "orders_sample"), ("items", "items_with_products")];

/// Result of one named unit of work.
#[derive(Debug)]
pub struct Outcome<T> {
    pub name: String,
    pub result: Result<T>,
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub type ReportOutcome = Outcome<Artifact>;

/// Query, render and save one chart.
pub fn run_chart(ds: &DataSource, sink: &ArtifactSink, report: &ChartReport) -> Result<Artifact> {
    let rs = ds.fetch(&catalog::get(report.query)?)?;
    let data = render::prepare(&report.spec, &rs)?;
    sink.save_chart(&report.spec, &rs, &data)
}

/// Write the sample workbook, one sheet per export query.
pub fn run_export(ds: &DataSource, sink: &ArtifactSink) -> Result<Artifact> {
    let mut sheets = Vec::with_capacity(EXPORT_SHEETS.len());
    for (sheet, query) in EXPORT_SHEETS {
        let rs = ds.fetch(&catalog::get(query)?)?;
        sheets.push(SheetSpec::new(*sheet, rs));
    }
    sink.save_workbook(EXPORT_FILE, EXPORT_ABOUT, &sheets)
}

pub fn run_time_slider(ds: &DataSource, sink: &ArtifactSink) -> Result<Artifact> {
    let rs = ds.fetch(&catalog::get(TIME_SLIDER.query)?)?;
    sink.save_slider(&TIME_SLIDER.spec, &rs)
}

/// The default batch, in order. Every report runs even when earlier ones fail.
pub fn run_default(ds: &DataSource, sink: &ArtifactSink) -> Vec<ReportOutcome> {
    let mut outcomes: Vec<ReportOutcome> = CHART_REPORTS
        .iter()
        .map(|report| isolate(report.query, || run_chart(ds, sink, report)))
        .collect();
    outcomes.push(isolate("export", || run_export(ds, sink)));
    outcomes
}

/// Number of failed outcomes.
pub fn failures<T>(outcomes: &[Outcome<T>]) -> usize {
    outcomes.iter().filter(|o| !o.is_ok()).count()
}

pub(crate) fn isolate<T>(name: &str, work: impl FnOnce() -> Result<T>) -> Outcome<T> {
    let start = Instant::now();
    let result = work();
    match &result {
        Ok(_) => info!(report = %name, elapsed = ?start.elapsed(), "report done"),
        Err(e) => error!(report = %name, elapsed = ?start.elapsed(), "report failed: {:#}", e),
    }
    Outcome {
        name: name.to_string(),
        result,
    }
}
