// src/render/workbook.rs
//
// Multi-sheet XLSX export: header row, typed cells, frozen header row and
// first column, auto-filter over the populated range and a red/yellow/green
// colour scale on the selected numeric columns.

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Color, ConditionalFormat3ColorScale, ConditionalFormatType, Format, Workbook, Worksheet,
};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::source::result::excel_serial;
use crate::source::{ResultSet, Scalar};

const SCALE_MIN: u32 = 0xAA0000;
const SCALE_MID: u32 = 0xFFFF00;
const SCALE_MAX: u32 = 0x00AA00;
const SCALE_MID_PERCENTILE: i32 = 50;

/// Which columns of a sheet get the colour scale. Only numeric columns are
/// ever coloured.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientRule {
    None,
    /// Every numeric column from this zero-based index on.
    FromColumn(usize),
    /// Numeric columns with these names.
    Columns(Vec<String>),
}

impl Default for GradientRule {
    fn default() -> Self {
        GradientRule::FromColumn(2)
    }
}

/// One worksheet to write.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSpec {
    pub name: String,
    pub data: ResultSet,
    pub gradient: GradientRule,
}

impl SheetSpec {
    pub fn new(name: impl Into<String>, data: ResultSet) -> Self {
        Self {
            name: name.into(),
            data,
            gradient: GradientRule::default(),
        }
    }

    pub fn with_gradient(mut self, gradient: GradientRule) -> Self {
        self.gradient = gradient;
        self
    }
}

/// Inclusive, zero-based cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.first_col),
            self.first_row + 1,
            column_letters(self.last_col),
            self.last_row + 1
        )
    }
}

fn column_letters(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Formatting decisions for one sheet, computed before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    /// First unfrozen (row, column).
    pub freeze: (u32, u16),
    /// Header plus data; `None` only for a sheet with no columns.
    pub filter: Option<CellRange>,
    /// One colour-scale range per selected column, data rows only.
    pub gradients: Vec<CellRange>,
}

impl SheetLayout {
    pub fn plan(data: &ResultSet, rule: &GradientRule) -> Self {
        let rows = data.row_count() as u32;
        let cols = data.column_count();

        let filter = (cols > 0).then(|| CellRange {
            first_row: 0,
            first_col: 0,
            last_row: rows,
            last_col: (cols - 1) as u16,
        });

        // header + at least one data row, and at least three columns
        let gradients = if rows + 1 >= 2 && cols >= 3 {
            data.columns()
                .iter()
                .enumerate()
                .filter(|(idx, col)| {
                    let selected = match rule {
                        GradientRule::None => false,
                        GradientRule::FromColumn(first) => idx >= first,
                        GradientRule::Columns(names) => names.iter().any(|n| *n == col.name),
                    };
                    selected && col.is_numeric()
                })
                .map(|(idx, _)| CellRange {
                    first_row: 1,
                    first_col: idx as u16,
                    last_row: rows,
                    last_col: idx as u16,
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            freeze: (1, 1),
            filter,
            gradients,
        }
    }
}

/// What a written workbook contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkbookSummary {
    pub sheets: usize,
    /// Data rows across all sheets, headers excluded.
    pub rows: usize,
}

/// Write every sheet to a new workbook at `path`.
pub fn write_workbook(path: &Path, sheets: &[SheetSpec]) -> Result<WorkbookSummary> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let timestamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut rows = 0;
    for sheet in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(&sheet.name)
            .with_context(|| format!("invalid sheet name `{}`", sheet.name))?;

        write_cells(ws, &sheet.data, &header, &date, &timestamp)
            .with_context(|| format!("writing sheet `{}`", sheet.name))?;

        let layout = SheetLayout::plan(&sheet.data, &sheet.gradient);
        apply_layout(ws, &layout).with_context(|| format!("formatting sheet `{}`", sheet.name))?;
        ws.autofit();

        debug!(
            sheet = %sheet.name,
            rows = sheet.data.row_count(),
            gradients = layout.gradients.len(),
            "sheet written"
        );
        rows += sheet.data.row_count();
    }

    workbook
        .save(path)
        .with_context(|| format!("saving workbook {}", path.display()))?;

    Ok(WorkbookSummary {
        sheets: sheets.len(),
        rows,
    })
}

fn write_cells(
    ws: &mut Worksheet,
    data: &ResultSet,
    header: &Format,
    date: &Format,
    timestamp: &Format,
) -> Result<()> {
    for (c, column) in data.columns().iter().enumerate() {
        let col = c as u16;
        ws.write_string_with_format(0, col, &column.name, header)?;

        for (r, value) in column.values.iter().enumerate() {
            let row = r as u32 + 1;
            match value {
                Scalar::Null => {}
                Scalar::Bool(b) => {
                    ws.write_boolean(row, col, *b)?;
                }
                Scalar::Int(i) => {
                    ws.write_number(row, col, *i as f64)?;
                }
                Scalar::Float(f) if f.is_finite() => {
                    ws.write_number(row, col, *f)?;
                }
                Scalar::Float(f) => {
                    ws.write_string(row, col, f.to_string())?;
                }
                Scalar::Text(s) => {
                    ws.write_string(row, col, s)?;
                }
                Scalar::Date(d) => {
                    let serial = d.and_hms_opt(0, 0, 0).map(excel_serial).unwrap_or(0.0);
                    ws.write_number_with_format(row, col, serial, date)?;
                }
                Scalar::Timestamp(ts) => {
                    ws.write_number_with_format(row, col, excel_serial(*ts), timestamp)?;
                }
            }
        }
    }
    Ok(())
}

fn apply_layout(ws: &mut Worksheet, layout: &SheetLayout) -> Result<()> {
    ws.set_freeze_panes(layout.freeze.0, layout.freeze.1)?;

    if let Some(f) = layout.filter {
        ws.autofilter(f.first_row, f.first_col, f.last_row, f.last_col)?;
    }

    for g in &layout.gradients {
        let scale = ConditionalFormat3ColorScale::new()
            .set_minimum_color(Color::RGB(SCALE_MIN))
            .set_midpoint(ConditionalFormatType::Percentile, SCALE_MID_PERCENTILE)
            .set_midpoint_color(Color::RGB(SCALE_MID))
            .set_maximum_color(Color::RGB(SCALE_MAX));
        ws.add_conditional_format(g.first_row, g.first_col, g.last_row, g.last_col, &scale)?;
    }
    Ok(())
}
