//! CSV serializer for the per-cell record stream.
//!
//! One header row followed by one row per grid cell, in the order the
//! records are given. Areas withheld by the minimum-leaf-area policy are
//! written as [`MISSING`] so downstream R scripts read them as `NA`.
//!
//! Chlorotic areas are written in the shortest decimal form that parses
//! back to the same value, always with a decimal point (`81.0`, `12.5`).

use std::io::Write;

use scanalyzer_pipeline::Record;

/// Column names, in output order.
pub const COLUMNS: [&str; 10] = [
    "column",
    "row",
    "bioassay",
    "dpi",
    "genotype",
    "pathogen",
    "treatment",
    "leaf_area",
    "bacteria_area",
    "chlorotic_area",
];

/// Text written for an area that is not reported.
pub const MISSING: &str = "NA";

/// Errors from record serialization.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The CSV writer rejected a record.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the underlying writer failed.
    #[error("CSV flush failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize records into a CSV string.
///
/// # Errors
///
/// Returns [`ExportError`] if a record cannot be written. With an
/// in-memory buffer this only happens on malformed field data.
///
/// # Examples
///
/// ```
/// use scanalyzer_pipeline::Record;
///
/// let record = Record {
///     column: 1,
///     row: 7,
///     bioassay: "B17".to_owned(),
///     dpi: "3".to_owned(),
///     genotype: "Col-0".to_owned(),
///     pathogen: "Pst".to_owned(),
///     treatment: "mock".to_owned(),
///     leaf_area: 120,
///     bacteria_area: None,
///     chlorotic_area: None,
/// };
/// let csv = scanalyzer_export::to_csv(&[record]).unwrap();
/// assert_eq!(csv.lines().nth(1), Some("1,7,B17,3,Col-0,Pst,mock,120,NA,NA"));
/// ```
pub fn to_csv(records: &[Record]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Serialize records as CSV into any writer.
///
/// # Errors
///
/// Returns [`ExportError`] if writing or flushing fails.
pub fn write_csv<W: Write>(records: &[Record], out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(fields(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn fields(record: &Record) -> [String; 10] {
    [
        record.column.to_string(),
        record.row.to_string(),
        record.bioassay.clone(),
        record.dpi.clone(),
        record.genotype.clone(),
        record.pathogen.clone(),
        record.treatment.clone(),
        record.leaf_area.to_string(),
        optional(record.bacteria_area, |v| v.to_string()),
        optional(record.chlorotic_area, |v| format!("{v:?}")),
    ]
}

fn optional<T>(value: Option<T>, show: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| MISSING.to_owned(), show)
}
