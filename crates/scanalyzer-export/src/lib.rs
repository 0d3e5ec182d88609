//! scanalyzer-export: Pure record serializers (sans-IO)
//!
//! Converts per-cell [`Record`](scanalyzer_pipeline::Record)s into output
//! formats. Currently supports CSV.

pub mod records;

pub use records::{COLUMNS, ExportError, MISSING, to_csv, write_csv};
