//! Experiment metadata: parsing the sample sheet and aligning it with
//! grid cells.
//!
//! # Sample sheet layout
//!
//! A comma-separated file, rows counted from zero by physical line:
//!
//! | rows          | content                                   |
//! |---------------|-------------------------------------------|
//! | 0, 1, 2       | `key,value` for bioassay id, dpi, date    |
//! | 3             | separator                                 |
//! | 4 ..          | genotype block                            |
//! | then          | pathogen, treatment, bioassay, dpi blocks |
//!
//! Every block is `n2 + 1` rows: a header row followed by one row per
//! physical grid row, top to bottom. The first column of every block row
//! is a label. One separator row sits between blocks. For the default
//! 7-row grid the blocks are rows 4–11, 13–20, 22–29, 31–38, and 40–47.
//!
//! # Orientation
//!
//! Tables are authored with the bottom physical row last. Cell
//! `(outer, inner)` therefore reads table row `n2 - inner - 1` and table
//! column `outer`, and is labelled column `outer + 1`, row `n2 - inner`.

use serde::{Deserialize, Serialize};

use crate::config::GridGeometry;
use crate::types::{CellIndex, PipelineError};

/// Row of the first block's header.
const FIRST_BLOCK_ROW: usize = 4;

/// Rows between the end of one block and the start of the next.
const BLOCK_SEPARATOR_ROWS: usize = 1;

/// The single key/value pairs at the top of the sample sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataHeader {
    /// Bioassay id of the run.
    pub bioassay: String,
    /// Days post inoculation of the run.
    pub dpi: String,
    /// Sampling date, as written.
    pub sampling_date: String,
}

/// One labelled 2-D table, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTable {
    rows: usize,
    columns: usize,
    cells: Vec<String>,
}

impl MetadataTable {
    /// Build a table from equal-length rows.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MetadataFormat`] if rows differ in length.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, PipelineError> {
        let columns = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(PipelineError::MetadataFormat(format!(
                "table row {i} has {} entries, expected {columns}",
                row.len()
            )));
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// `(rows, columns)`.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Entry at `(row, column)`, if in range.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        if row < self.rows && column < self.columns {
            self.cells.get(row * self.columns + column).map(String::as_str)
        } else {
            None
        }
    }
}

/// The full sample sheet: header plus the five per-cell tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Run-level header values.
    pub header: MetadataHeader,
    /// Genotype per cell.
    pub genotype: MetadataTable,
    /// Pathogen per cell.
    pub pathogen: MetadataTable,
    /// Treatment per cell.
    pub treatment: MetadataTable,
    /// Bioassay id per cell.
    pub bioassay: MetadataTable,
    /// Days post inoculation per cell.
    pub dpi: MetadataTable,
}

/// Table coordinates for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TablePosition {
    /// Table row (0 is the top physical row).
    pub row: usize,
    /// Table column.
    pub column: usize,
}

/// Human-facing 1-based labels for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalLabels {
    /// Column label, `outer + 1`.
    pub column: u32,
    /// Row label counted from the bottom, `n2 - inner`.
    pub row: u32,
}

/// Metadata values for one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMetadata {
    /// Physical labels of the cell.
    pub labels: PhysicalLabels,
    /// Bioassay id.
    pub bioassay: String,
    /// Days post inoculation.
    pub dpi: String,
    /// Genotype.
    pub genotype: String,
    /// Pathogen.
    pub pathogen: String,
    /// Treatment.
    pub treatment: String,
}

/// Table coordinates of a cell, or `None` if the cell is outside the grid.
#[must_use]
pub fn table_position(cell: CellIndex, grid: &GridGeometry) -> Option<TablePosition> {
    if cell.outer >= grid.n1 {
        return None;
    }
    let row = grid.n2.checked_sub(cell.inner)?.checked_sub(1)?;
    Some(TablePosition {
        row: row as usize,
        column: cell.outer as usize,
    })
}

/// Physical labels of a cell, or `None` if the cell is outside the grid.
#[must_use]
pub fn physical_labels(cell: CellIndex, grid: &GridGeometry) -> Option<PhysicalLabels> {
    if cell.outer >= grid.n1 || cell.inner >= grid.n2 {
        return None;
    }
    Some(PhysicalLabels {
        column: cell.outer + 1,
        row: grid.n2 - cell.inner,
    })
}

/// Header row index of block `k` for a grid with `n2` physical rows.
const fn block_start(k: usize, n2: usize) -> usize {
    FIRST_BLOCK_ROW + k * (n2 + 1 + BLOCK_SEPARATOR_ROWS)
}

impl Metadata {
    /// Parse a sample sheet for the given grid.
    ///
    /// Every data row yields exactly `n1` entries after its label. Entries
    /// missing at the end of a row read as empty strings, so an unused
    /// well at the grid edge may be left blank, and spreadsheet exports
    /// padded with commas parse the same as tight files.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MetadataFormat`] if the CSV cannot be read,
    /// a header value is missing, any block is short in rows, or a row has
    /// non-empty entries beyond column `n1`.
    pub fn parse(bytes: &[u8], grid: &GridGeometry) -> Result<Self, PipelineError> {
        let lines = read_lines(bytes)?;
        let n2 = grid.n2 as usize;

        let header = MetadataHeader {
            bioassay: header_value(&lines, 0, "bioassay")?,
            dpi: header_value(&lines, 1, "dpi")?,
            sampling_date: header_value(&lines, 2, "sampling date")?,
        };

        let metadata = Self {
            header,
            genotype: read_block(&lines, "genotype", block_start(0, n2), grid)?,
            pathogen: read_block(&lines, "pathogen", block_start(1, n2), grid)?,
            treatment: read_block(&lines, "treatment", block_start(2, n2), grid)?,
            bioassay: read_block(&lines, "bioassay", block_start(3, n2), grid)?,
            dpi: read_block(&lines, "dpi", block_start(4, n2), grid)?,
        };
        metadata.check_grid(grid)?;
        Ok(metadata)
    }

    /// The five tables with their names, in file order.
    fn tables(&self) -> [(&'static str, &MetadataTable); 5] {
        [
            ("genotype", &self.genotype),
            ("pathogen", &self.pathogen),
            ("treatment", &self.treatment),
            ("bioassay", &self.bioassay),
            ("dpi", &self.dpi),
        ]
    }

    /// Check that all five tables share one shape and that it is `n2 x n1`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MetadataFormat`] describing the first
    /// mismatch found.
    pub fn check_grid(&self, grid: &GridGeometry) -> Result<(), PipelineError> {
        let tables = self.tables();
        let (first_name, first) = tables[0];
        for (name, table) in &tables[1..] {
            if table.shape() != first.shape() {
                let (r0, c0) = first.shape();
                let (r, c) = table.shape();
                return Err(PipelineError::MetadataFormat(format!(
                    "{name} table is {r}x{c} but {first_name} table is {r0}x{c0}"
                )));
            }
        }
        let expected = (grid.n2 as usize, grid.n1 as usize);
        if first.shape() != expected {
            let (r, c) = first.shape();
            return Err(PipelineError::MetadataFormat(format!(
                "tables are {r}x{c} but the grid needs {}x{}",
                expected.0, expected.1
            )));
        }
        Ok(())
    }

    /// Metadata for one cell.
    ///
    /// Returns `None` if the cell lies outside the grid or outside the
    /// tables.
    #[must_use]
    pub fn for_cell(&self, cell: CellIndex, grid: &GridGeometry) -> Option<CellMetadata> {
        let labels = physical_labels(cell, grid)?;
        let TablePosition { row, column } = table_position(cell, grid)?;
        let lookup = |table: &MetadataTable| table.get(row, column).map(str::to_owned);
        Some(CellMetadata {
            labels,
            bioassay: lookup(&self.bioassay)?,
            dpi: lookup(&self.dpi)?,
            genotype: lookup(&self.genotype)?,
            pathogen: lookup(&self.pathogen)?,
            treatment: lookup(&self.treatment)?,
        })
    }
}

/// Read all records, placing each at its physical line index so that
/// blank lines still occupy a row.
fn read_lines(bytes: &[u8]) -> Result<Vec<Vec<String>>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut lines: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result
            .map_err(|e| PipelineError::MetadataFormat(format!("unreadable sample sheet: {e}")))?;
        let line = record
            .position()
            .and_then(|p| usize::try_from(p.line().saturating_sub(1)).ok())
            .unwrap_or(lines.len());
        if line > lines.len() {
            lines.resize(line, Vec::new());
        }
        let mut cells: Vec<String> = record.iter().map(str::to_owned).collect();
        while cells.last().is_some_and(String::is_empty) {
            cells.pop();
        }
        lines.push(cells);
    }
    Ok(lines)
}

fn header_value(lines: &[Vec<String>], row: usize, name: &str) -> Result<String, PipelineError> {
    lines
        .get(row)
        .and_then(|cells| cells.get(1))
        .cloned()
        .ok_or_else(|| {
            PipelineError::MetadataFormat(format!("header row {row} has no {name} value"))
        })
}

fn read_block(
    lines: &[Vec<String>],
    name: &str,
    start: usize,
    grid: &GridGeometry,
) -> Result<MetadataTable, PipelineError> {
    let (n1, n2) = (grid.n1 as usize, grid.n2 as usize);
    let end = start + n2 + 1;
    let block = lines.get(start..end).ok_or_else(|| {
        PipelineError::MetadataFormat(format!(
            "{name} block needs rows {start}..{end} but the sheet has {} rows",
            lines.len()
        ))
    })?;

    let rows = block[1..]
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            table_row(cells, n1).map_err(|column| {
                PipelineError::MetadataFormat(format!(
                    "{name} block: table row {i} has an entry in column {column}, \
                     beyond the {n1} grid columns"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    MetadataTable::from_rows(rows)
}

/// The `n1` entries after a row's label, padded with empty strings.
///
/// Fails with the 1-based table column of the first non-empty entry past
/// `n1`.
fn table_row(cells: &[String], n1: usize) -> Result<Vec<String>, usize> {
    let values = cells.get(1..).unwrap_or_default();
    if let Some(extra) = values
        .get(n1..)
        .and_then(|rest| rest.iter().position(|c| !c.is_empty()))
    {
        return Err(n1 + extra + 1);
    }
    let mut row: Vec<String> = values.iter().take(n1).cloned().collect();
    row.resize(n1, String::new());
    Ok(row)
}
