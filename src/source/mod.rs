// src/source/mod.rs
//
// Data source adapter: one DuckDB engine opened at startup, a scoped
// connection per unit of work.

pub mod bind;
pub mod connection;
pub mod demo;
pub mod result;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use duckdb::types::{TimeUnit, ToSqlOutput, Value, ValueRef};
use duckdb::{params_from_iter, Connection, ToSql};
use std::time::Instant;
use tracing::{debug, info, warn};

pub use bind::{bind_named, Params};
pub use connection::{parse_connection_string, ConnectionInfo};
pub use result::{Column, ResultSet, Scalar};

use crate::catalog::QuerySpec;
use crate::config::Config;
use crate::error::ReportError;

/// Catalog name the PostgreSQL database is attached under.
const PG_CATALOG: &str = "shop";

/// Handle to the shop database.
///
/// Created once, passed by reference to every report, closed explicitly with
/// [`DataSource::close`]. Each call opens its own connection from the shared
/// engine and drops it before returning, on success or failure.
pub struct DataSource {
    conn: Connection,
    info: ConnectionInfo,
}

impl DataSource {
    /// Open the database named by `config.database_url`.
    pub fn open(config: &Config) -> Result<Self> {
        let url = config.database_url()?;
        Self::from_connection_string(url)
    }

    pub fn from_connection_string(uri: &str) -> Result<Self> {
        let info = parse_connection_string(uri)?;

        let conn = match &info {
            ConnectionInfo::DuckDbMemory => {
                Connection::open_in_memory().context("failed to open in-memory DuckDB")?
            }
            ConnectionInfo::DuckDbFile(path) => Connection::open(path)
                .with_context(|| format!("failed to open DuckDB file `{}`", path))?,
            ConnectionInfo::Postgres(url) => {
                let conn =
                    Connection::open_in_memory().context("failed to open in-memory DuckDB")?;
                attach_postgres(&conn, url)?;
                conn
            }
        };

        info!(backend = info.kind(), "data source open");
        Ok(Self { conn, info })
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Schema the shop tables live in.
    pub fn default_schema(&self) -> &'static str {
        match self.info {
            ConnectionInfo::Postgres(_) => "public",
            _ => "main",
        }
    }

    /// Run a read query and collect every row.
    pub fn fetch(&self, query: &QuerySpec) -> Result<ResultSet> {
        let start = Instant::now();
        let conn = self.scoped()?;
        let rs = fetch_on(&conn, query).map_err(|e| ReportError::Query {
            name: query.name.to_string(),
            message: format!("{:#}", e),
        })?;
        debug!(query = query.name, rows = rs.row_count(), elapsed = ?start.elapsed(), "fetched");
        Ok(rs)
    }

    /// Run raw SQL (setup scripts, DDL). No parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.scoped()?;
        conn.execute_batch(sql).context("executing SQL batch")?;
        Ok(())
    }

    /// Run `work` inside one transaction on a fresh connection.
    ///
    /// Commits when `work` returns `Ok`; otherwise rolls back. Either a failed
    /// `work` or a failed commit is reported as [`ReportError::Transaction`]
    /// naming `name`.
    pub fn transaction<T>(
        &self,
        name: &str,
        work: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.scoped()?;
        let tx = conn
            .transaction()
            .with_context(|| format!("beginning transaction `{}`", name))?;

        match work(&*tx) {
            Ok(value) => {
                tx.commit().map_err(|e| ReportError::Transaction {
                    name: name.to_string(),
                    message: format!("commit failed: {}", e),
                })?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    warn!(transaction = name, "rollback failed: {}", rb);
                }
                Err(ReportError::Transaction {
                    name: name.to_string(),
                    message: format!("{:#}", e),
                }
                .into())
            }
        }
    }

    /// Release the engine. Connections handed out by earlier calls are
    /// already closed.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("closing data source")?;
        info!("data source closed");
        Ok(())
    }

    fn scoped(&self) -> Result<Connection> {
        let conn = self
            .conn
            .try_clone()
            .context("opening scoped connection")?;
        if let ConnectionInfo::Postgres(_) = self.info {
            // catalog selection is per connection
            conn.execute_batch(&format!("USE {}.public;", PG_CATALOG))
                .context("selecting attached PostgreSQL catalog")?;
        }
        Ok(conn)
    }
}

fn attach_postgres(conn: &Connection, url: &str) -> Result<()> {
    let sql = format!(
        "INSTALL postgres; LOAD postgres; ATTACH '{}' AS {} (TYPE postgres);",
        url.replace('\'', "''"),
        PG_CATALOG
    );
    conn.execute_batch(&sql)
        .context("attaching PostgreSQL through DuckDB's postgres extension")
}

/// Run a read query on an already open connection (or transaction).
pub fn fetch_on(conn: &Connection, query: &QuerySpec) -> Result<ResultSet> {
    let (sql, binds) = bind_named(query.name, query.sql, &query.params)?;
    let mut stmt = conn.prepare(&sql).context("preparing statement")?;
    let mut rows = stmt
        .query(params_from_iter(binds))
        .context("executing statement")?;

    let names: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names())
        .unwrap_or_default();
    let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); names.len()];

    while let Some(row) = rows.next().context("reading row")? {
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(scalar_from_ref(row.get_ref(idx)?));
        }
    }

    ResultSet::new(
        names
            .into_iter()
            .zip(values)
            .map(|(name, vals)| Column::new(name, vals))
            .collect(),
    )
}

/// Run a write statement; returns the affected row count.
pub fn execute_on(conn: &Connection, query: &QuerySpec) -> Result<usize> {
    let (sql, binds) = bind_named(query.name, query.sql, &query.params)?;
    let n = conn
        .execute(&sql, params_from_iter(binds))
        .with_context(|| format!("executing `{}`", query.name))?;
    Ok(n)
}

/// Run a statement that yields one integer (e.g. `INSERT … RETURNING id`).
pub fn query_i64_on(conn: &Connection, query: &QuerySpec) -> Result<i64> {
    let (sql, binds) = bind_named(query.name, query.sql, &query.params)?;
    let value = conn
        .query_row(&sql, params_from_iter(binds), |row| {
            row.get_ref(0).map(scalar_from_ref)
        })
        .with_context(|| format!("executing `{}`", query.name))?;
    value.as_i64().ok_or_else(|| {
        anyhow::anyhow!("`{}` returned {:?}, expected an integer", query.name, value)
    })
}

impl ToSql for Scalar {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Boolean(*b),
            Scalar::Int(i) => Value::BigInt(*i),
            Scalar::Float(f) => Value::Double(*f),
            Scalar::Text(s) => return Ok(ToSqlOutput::from(s.as_str())),
            Scalar::Date(d) => return d.to_sql(),
            Scalar::Timestamp(ts) => return ts.to_sql(),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Convert one DuckDB cell into an owned [`Scalar`].
fn scalar_from_ref(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Boolean(b) => Scalar::Bool(b),
        ValueRef::TinyInt(i) => Scalar::Int(i.into()),
        ValueRef::SmallInt(i) => Scalar::Int(i.into()),
        ValueRef::Int(i) => Scalar::Int(i.into()),
        ValueRef::BigInt(i) => Scalar::Int(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(i as f64)),
        ValueRef::UTinyInt(i) => Scalar::Int(i.into()),
        ValueRef::USmallInt(i) => Scalar::Int(i.into()),
        ValueRef::UInt(i) => Scalar::Int(i.into()),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(i as f64)),
        ValueRef::Float(f) => Scalar::Float(f.into()),
        ValueRef::Double(f) => Scalar::Float(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Scalar::Float)
            .unwrap_or(Scalar::Null),
        ValueRef::Text(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => date_from_days(days)
            .map(Scalar::Date)
            .unwrap_or(Scalar::Null),
        ValueRef::Timestamp(unit, v) => timestamp_from(unit, v)
            .map(Scalar::Timestamp)
            .unwrap_or(Scalar::Null),
        ValueRef::Time64(unit, v) => time_from(unit, v)
            .map(|t| Scalar::Text(t.to_string()))
            .unwrap_or(Scalar::Null),
        ValueRef::Interval {
            months,
            days,
            nanos,
        } => Scalar::Text(interval_text(months, days, nanos)),
        ValueRef::Enum(..) => value
            .as_str()
            .map(|s| Scalar::Text(s.to_string()))
            .unwrap_or(Scalar::Null),
        ValueRef::Blob(bytes) => Scalar::Text(format!("<{} bytes>", bytes.len())),
        // nested values keep DuckDB's debug rendering
        other => Scalar::Text(format!("{:?}", other)),
    }
}

fn time_from(unit: TimeUnit, value: i64) -> Option<NaiveTime> {
    let nanos = match unit {
        TimeUnit::Second => value.checked_mul(1_000_000_000)?,
        TimeUnit::Millisecond => value.checked_mul(1_000_000)?,
        TimeUnit::Microsecond => value.checked_mul(1_000)?,
        TimeUnit::Nanosecond => value,
    };
    let secs = u32::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let frac = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, frac)
}

/// `1 year 2 months 3 days 04:05:06`, leaving out zero parts.
fn interval_text(months: i32, days: i32, nanos: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        if n.abs() == 1 {
            format!("{} {}", n, name)
        } else {
            format!("{} {}s", n, name)
        }
    }

    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        parts.push(unit(years.into(), "year"));
    }
    if months != 0 {
        parts.push(unit(months.into(), "month"));
    }
    if days != 0 {
        parts.push(unit(days.into(), "day"));
    }
    if nanos != 0 || parts.is_empty() {
        let sign = if nanos < 0 { "-" } else { "" };
        let total = nanos.unsigned_abs();
        let secs = total / 1_000_000_000;
        let micros = (total % 1_000_000_000) / 1_000;
        let mut clock = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if micros != 0 {
            clock.push_str(&format!(".{:06}", micros));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::days(days.into()))
}

fn timestamp_from(unit: TimeUnit, value: i64) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => value.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => value.checked_mul(1_000)?,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    };
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
