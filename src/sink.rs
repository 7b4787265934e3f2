// src/sink.rs
//
// Where rendered artifacts land, plus the one status line per artifact.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::render::workbook::{write_workbook, SheetSpec};
use crate::render::{draw, slider, ArtifactKind, ArtifactSpec, ChartData};
use crate::source::ResultSet;

/// A file written by one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Rows of the producing result set (sum over sheets for a workbook).
    pub rows: usize,
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub about: String,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[OK] rows={} | type={} | file={} | about={}",
            self.rows,
            self.kind,
            self.path.display(),
            self.about
        )
    }
}

/// Output directories for charts and spreadsheets. Each is created the first
/// time something is written into it.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    charts_dir: PathBuf,
    exports_dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(charts_dir: impl Into<PathBuf>, exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
            exports_dir: exports_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.charts_dir, &config.exports_dir)
    }

    pub fn charts_dir(&self) -> &Path {
        &self.charts_dir
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// Draw `data` as a PNG named `spec.output` under the charts directory.
    pub fn save_chart(
        &self,
        spec: &ArtifactSpec,
        rs: &ResultSet,
        data: &ChartData,
    ) -> Result<Artifact> {
        let path = prepare_dir(&self.charts_dir)?.join(spec.output);
        draw::draw_png(&path, spec, data)?;
        Ok(record(Artifact {
            rows: rs.row_count(),
            kind: spec.kind,
            path,
            about: spec.about.to_string(),
        }))
    }

    /// Write the time-slider page for `rs` under the charts directory.
    pub fn save_slider(&self, spec: &ArtifactSpec, rs: &ResultSet) -> Result<Artifact> {
        let html = slider::render(spec, rs)?;
        let path = prepare_dir(&self.charts_dir)?.join(spec.output);
        fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
        Ok(record(Artifact {
            rows: rs.row_count(),
            kind: spec.kind,
            path,
            about: spec.about.to_string(),
        }))
    }

    /// Write `sheets` into one workbook under the exports directory.
    pub fn save_workbook(&self, file: &str, about: &str, sheets: &[SheetSpec]) -> Result<Artifact> {
        let path = prepare_dir(&self.exports_dir)?.join(file);
        let summary = write_workbook(&path, sheets)?;
        info!(
            file = %path.display(),
            sheets = summary.sheets,
            rows = summary.rows,
            "workbook created"
        );
        Ok(record(Artifact {
            rows: summary.rows,
            kind: ArtifactKind::Spreadsheet,
            path,
            about: about.to_string(),
        }))
    }
}

fn prepare_dir(dir: &Path) -> Result<&Path> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

fn record(artifact: Artifact) -> Artifact {
    info!(
        rows = artifact.rows,
        kind = %artifact.kind,
        file = %artifact.path.display(),
        about = %artifact.about,
        "[OK]"
    );
    artifact
}
