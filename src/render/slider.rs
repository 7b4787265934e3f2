// src/render/slider.rs
//
// Interactive monthly chart: a Vega-Lite bar chart per category with a range
// slider that picks the month, embedded in a standalone HTML page.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};

use super::{input, numeric_input, ArtifactSpec, MonthlyPivot};
use crate::source::ResultSet;

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const PARAM: &str = "month_index";

/// One (month, category) cell of the zero-filled pivot.
#[derive(Debug, Serialize)]
struct Frame<'a> {
    idx: usize,
    month: String,
    category: &'a str,
    value: f64,
}

/// Build the page for `rs`, read through `spec.columns` as
/// (month, category, value).
pub fn render(spec: &ArtifactSpec, rs: &ResultSet) -> Result<String> {
    let pivot = if rs.is_empty() {
        MonthlyPivot::default()
    } else {
        MonthlyPivot::from_columns(
            input(spec, rs, 0)?,
            input(spec, rs, 1)?,
            numeric_input(spec, rs, 2)?,
        )?
    };
    let vl = vega_lite(spec, &pivot)?;
    page(spec.title, &vl)
}

/// Vega-Lite spec with one frame per month.
pub fn vega_lite(spec: &ArtifactSpec, pivot: &MonthlyPivot) -> Result<Value> {
    let mut frames = Vec::with_capacity(pivot.months.len() * pivot.categories.len());
    for mi in 0..pivot.months.len() {
        let month = pivot.month_label(mi);
        for (ci, category) in pivot.categories.iter().enumerate() {
            frames.push(Frame {
                idx: mi,
                month: month.clone(),
                category,
                value: pivot.get(mi, ci).unwrap_or(0.0),
            });
        }
    }
    let values = serde_json::to_value(&frames).context("serializing slider frames")?;

    // fixed axis so bars are comparable between months
    let top = match pivot.max_value() {
        m if m > 0.0 => m,
        _ => 1.0,
    };
    let last = pivot.months.len().saturating_sub(1);

    Ok(json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": spec.title,
        "width": 600,
        "height": 360,
        "data": { "values": values },
        "params": [{
            "name": PARAM,
            "value": 0,
            "bind": { "input": "range", "min": 0, "max": last, "step": 1, "name": "Month " }
        }],
        "transform": [{ "filter": format!("datum.idx == {}", PARAM) }],
        "layer": [
            {
                "mark": "bar",
                "encoding": {
                    "x": {
                        "field": "category",
                        "type": "nominal",
                        "title": spec.x_label,
                        "sort": pivot.categories
                    },
                    "y": {
                        "field": "value",
                        "type": "quantitative",
                        "title": spec.y_label,
                        "scale": { "domain": [0.0, top] }
                    },
                    "color": { "field": "category", "type": "nominal", "legend": null },
                    "tooltip": [
                        { "field": "month", "type": "nominal" },
                        { "field": "category", "type": "nominal" },
                        { "field": "value", "type": "quantitative", "format": ",.2f" }
                    ]
                }
            },
            {
                "mark": { "type": "text", "align": "right", "baseline": "top", "fontSize": 16 },
                "encoding": {
                    "text": { "field": "month" },
                    "x": { "value": 600 },
                    "y": { "value": 0 }
                }
            }
        ]
    }))
}

/// Standalone HTML page that embeds `vl` with vega-embed.
pub fn page(title: &str, vl: &Value) -> Result<String> {
    let spec = serde_json::to_string_pretty(vl)
        .context("serializing Vega-Lite spec")?
        .replace("</", "<\\/");
    Ok(format!(
        r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="vis"></div>
  <script>
    vegaEmbed("#vis", {spec});
  </script>
</body>
</html>
"##,
        title = escape_html(title),
        spec = spec
    ))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
