use thiserror::Error;

/// Failure classes of a report run.
///
/// Library functions return `anyhow::Result`; these variants sit at the
/// bottom of the chain so callers can `downcast_ref::<ReportError>()` to tell
/// a missing connection string from a broken query.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown report `{0}`")]
    UnknownReport(String),

    #[error("query `{name}` has no value bound for `:{param}`")]
    MissingParam { name: String, param: String },

    #[error("query `{name}` failed: {message}")]
    Query { name: String, message: String },

    #[error("cannot render `{output}`: {message}")]
    Shape { output: String, message: String },

    #[error("transaction `{name}` rolled back: {message}")]
    Transaction { name: String, message: String },
}
