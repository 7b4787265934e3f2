use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use prettytable::{format, Cell, Row, Table};
use std::fmt;

/// One typed cell of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    /// Numeric view of the cell; `None` for nulls and non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Calendar date of the cell. Text is accepted in `YYYY-MM-DD` form.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Scalar::Date(d) => Some(*d),
            Scalar::Timestamp(ts) => Some(ts.date()),
            Scalar::Text(s) => NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Scalar::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(v: NaiveDate) -> Self {
        Scalar::Date(v)
    }
}

/// Excel serial day number (days since 1899-12-30, fractional for time).
pub fn excel_serial(ts: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    match epoch {
        Some(epoch) => (ts - epoch).num_milliseconds() as f64 / 86_400_000.0,
        None => f64::from(ts.num_days_from_ce()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True when every non-null value is numeric and at least one is present.
    pub fn is_numeric(&self) -> bool {
        let mut seen = false;
        for v in &self.values {
            match v {
                Scalar::Null => {}
                v if v.is_numeric() => seen = true,
                _ => return false,
            }
        }
        seen
    }
}

/// Tabular output of one query execution.
///
/// Columns are kept in select order. The row count is stored separately so a
/// zero-column result still knows how many rows it had.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Vec<Column>,
    row_count: usize,
}

impl ResultSet {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for c in &columns {
            if c.values.len() != row_count {
                bail!(
                    "column `{}` has {} values, expected {}",
                    c.name,
                    c.values.len(),
                    row_count
                );
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Build from row-major data, the shape most fixtures are written in.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Scalar>>) -> Result<Self> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new(*n, Vec::with_capacity(rows.len())))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                bail!("row {} has {} cells, expected {}", i, row.len(), names.len());
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.values.push(value);
            }
        }
        Ok(Self {
            row_count: columns.first().map(|c| c.values.len()).unwrap_or(0),
            columns,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Value at (`row`, `col`), if in range.
    pub fn value(&self, row: usize, col: usize) -> Option<&Scalar> {
        self.columns.get(col).and_then(|c| c.values.get(row))
    }

    /// Box-drawn table of the first `limit` rows, numbers right-aligned.
    pub fn preview(&self, limit: usize) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(Row::new(
            self.columns
                .iter()
                .map(|c| Cell::new(&c.name).style_spec("b"))
                .collect(),
        ));
        for r in 0..self.row_count.min(limit) {
            let cells = self
                .columns
                .iter()
                .map(|c| {
                    let v = &c.values[r];
                    let cell = Cell::new(&v.to_string());
                    if v.is_numeric() {
                        cell.style_spec("r")
                    } else {
                        cell
                    }
                })
                .collect();
            table.add_row(Row::new(cells));
        }
        table
    }
}
