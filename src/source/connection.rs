//! Connection string parsing for the shop database
//!
//! Parses URI-style connection strings to decide how the DuckDB engine is
//! opened.

use crate::error::ReportError;

/// Parsed connection information
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionInfo {
    /// DuckDB in-memory database
    DuckDbMemory,
    /// DuckDB file-based database
    DuckDbFile(String),
    /// PostgreSQL database, attached through DuckDB's postgres extension
    Postgres(String),
}

impl ConnectionInfo {
    /// Short backend name, safe to log (no credentials).
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionInfo::DuckDbMemory => "duckdb-memory",
            ConnectionInfo::DuckDbFile(_) => "duckdb-file",
            ConnectionInfo::Postgres(_) => "postgres",
        }
    }
}

/// Parse a connection string into connection information
///
/// # Supported Formats
///
/// - `duckdb://memory` - DuckDB in-memory database
/// - `duckdb:///absolute/path/file.db` - DuckDB file (absolute path)
/// - `duckdb://relative/file.db` - DuckDB file (relative path)
/// - `postgres://...` / `postgresql://...` - PostgreSQL connection string
pub fn parse_connection_string(uri: &str) -> Result<ConnectionInfo, ReportError> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(ReportError::Config(
            "connection string is empty".to_string(),
        ));
    }

    if uri == "duckdb://memory" {
        return Ok(ConnectionInfo::DuckDbMemory);
    }

    if let Some(path) = uri.strip_prefix("duckdb://") {
        if path.is_empty() || path.trim_start_matches('/').is_empty() {
            return Err(ReportError::Config(
                "DuckDB file path cannot be empty".to_string(),
            ));
        }
        // keep one leading slash so `duckdb:///tmp/x.db` stays absolute
        let path = if path.starts_with('/') {
            format!("/{}", path.trim_start_matches('/'))
        } else {
            path.to_string()
        };
        return Ok(ConnectionInfo::DuckDbFile(path));
    }

    if uri.starts_with("postgres://") || uri.starts_with("postgresql://") {
        return Ok(ConnectionInfo::Postgres(uri.to_string()));
    }

    Err(ReportError::Config(format!(
        "unsupported connection string `{}`; expected duckdb:// or postgres://",
        redact(uri)
    )))
}

/// Drop everything between `://` and `@` so passwords never reach the log.
fn redact(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &uri[..scheme_end], &uri[at..])
        }
        _ => uri.to_string(),
    }
}
