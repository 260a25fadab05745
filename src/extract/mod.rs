//! Positional extraction of (identifier, quantity) records from an export.
//!
//! The export layout is fixed: the first row is a header, identifiers live in
//! column D and quantities in column F. Missing values are dropped from each
//! column independently and the two columns are then aligned by truncating
//! the longer one, which is lossy when gaps are not symmetric.

mod table;

pub use table::Table;

use std::path::Path;

use tracing::{debug, warn};

use crate::error::ZeroEntryError;

/// Zero-based column holding the identifier (column D).
pub const IDENTIFIER_COLUMN: usize = 3;
/// Zero-based column holding the quantity (column F).
pub const QUANTITY_COLUMN: usize = 5;
/// Narrowest table that still has an identifier column.
pub const MIN_COLUMNS: usize = IDENTIFIER_COLUMN + 1;

/// One aligned (identifier, quantity) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub identifier: String,
    pub quantity: f64,
}

impl Record {
    pub fn is_zero_quantity(&self) -> bool {
        self.quantity == 0.0
    }
}

/// Aligned records plus the column counts seen before alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub identifier_count: usize,
    pub quantity_count: usize,
}

impl Extraction {
    /// Whether alignment had to truncate one of the columns.
    pub fn is_misaligned(&self) -> bool {
        self.identifier_count != self.quantity_count
    }

    /// Identifiers of the records whose quantity is exactly zero, in row order.
    pub fn zero_quantity(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_zero_quantity())
            .map(|r| r.identifier.clone())
            .collect()
    }
}

/// Parses a quantity cell; thousands separators are ignored and anything
/// non-numeric counts as missing.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|q| q.is_finite())
}

/// Turns a parsed table into aligned records.
pub fn records_from_table(table: &Table) -> Result<Extraction, ZeroEntryError> {
    if table.is_empty() {
        return Err(ZeroEntryError::MalformedInput("export contains no rows".into()));
    }
    if table.width() < MIN_COLUMNS {
        return Err(ZeroEntryError::MalformedInput(format!(
            "export has {} columns, need at least {MIN_COLUMNS} to read identifiers from column D",
            table.width()
        )));
    }

    let identifiers: Vec<String> = table
        .column(IDENTIFIER_COLUMN, 1)
        .flatten()
        .map(str::to_string)
        .collect();
    let quantities: Vec<f64> = table
        .column(QUANTITY_COLUMN, 1)
        .flatten()
        .filter_map(parse_quantity)
        .collect();

    let identifier_count = identifiers.len();
    let quantity_count = quantities.len();
    if identifier_count != quantity_count {
        warn!(
            identifier_count,
            quantity_count,
            "identifier and quantity columns differ in length; truncating the longer one"
        );
    }

    let records: Vec<Record> = identifiers
        .into_iter()
        .zip(quantities)
        .map(|(identifier, quantity)| Record {
            identifier,
            quantity,
        })
        .collect();
    debug!(records = records.len(), "aligned records");

    Ok(Extraction {
        records,
        identifier_count,
        quantity_count,
    })
}

/// Loads `path` and extracts its aligned records.
pub fn extract(path: &Path) -> Result<Extraction, ZeroEntryError> {
    let table = Table::load(path)?;
    debug!(rows = table.len(), columns = table.width(), "loaded export");
    records_from_table(&table)
}
