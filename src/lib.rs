//! Analytical reports over an e-commerce database: named SQL queries feed
//! PNG charts, an interactive monthly page and an XLSX export.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod report;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::ReportError;
