//! Reference table: consecutive id → canonical record number
//!
//! The reference is the first worksheet of a spreadsheet workbook
//! (`.xlsx`, `.xls` or `.ods`, read with calamine). Layout is fixed:
//!
//! - row 1 is a header and is skipped
//! - column A holds the consecutive id (positive integer)
//! - column B holds the record number (any cell, read as trimmed text)
//! - other columns are ignored, blank rows are skipped
//!
//! A duplicated id keeps the value of its last row. Overrides are logged
//! and listed by [`ReferenceTable::overridden_ids`].

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Read-only lookup built once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    entries: HashMap<u32, String>,
    overridden: Vec<u32>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table from raw workbook bytes
    ///
    /// Any failure here is fatal for the run: the payload is not a workbook,
    /// has no worksheet, has fewer than two columns, or holds a row whose id
    /// or record number cannot be coerced.
    pub fn from_workbook_bytes(bytes: &[u8]) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| malformed(format!("not a readable workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| malformed("workbook has no worksheets"))?
            .map_err(|e| malformed(format!("cannot read first worksheet: {}", e)))?;

        let Some((first_row, first_col)) = range.start() else {
            debug!("reference worksheet is empty");
            return Ok(Self::new());
        };

        if first_col != 0 {
            return Err(malformed("column A (consecutive id) is empty"));
        }

        Self::from_rows_at(range.rows(), first_row as usize + 1)
    }

    /// Build the table from already-read rows, the first being the header
    pub fn from_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        Self::from_rows_at(rows, 1)
    }

    fn from_rows_at<'a, I>(rows: I, first_row_number: usize) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        let mut table = Self::new();

        for (idx, row) in rows.into_iter().enumerate() {
            let row_number = first_row_number + idx;

            if row.len() < 2 {
                return Err(malformed(format!(
                    "row {} has {} column(s), expected at least 2",
                    row_number,
                    row.len()
                )));
            }

            // Header
            if idx == 0 || row.iter().all(is_blank) {
                continue;
            }

            let id = id_from_cell(&row[0]).ok_or_else(|| {
                malformed(format!(
                    "row {}: consecutive id {:?} is not a positive integer",
                    row_number,
                    cell_text(&row[0])
                ))
            })?;

            let record = cell_text(&row[1]);
            if record.is_empty() {
                return Err(malformed(format!(
                    "row {}: record number for consecutive {} is empty",
                    row_number, id
                )));
            }

            if let Some(previous) = table.insert(id, record.clone()) {
                warn!(
                    consecutive = id,
                    row = row_number,
                    previous = %previous,
                    current = %record,
                    "duplicate consecutive in reference table, keeping the later row"
                );
            }
        }

        debug!(entries = table.len(), "reference table loaded");
        Ok(table)
    }

    /// Insert or replace an entry, returning the replaced record number
    pub fn insert(&mut self, id: u32, record: impl Into<String>) -> Option<String> {
        let previous = self.entries.insert(id, record.into());
        if previous.is_some() {
            self.overridden.push(id);
        }
        previous
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Record number for `id`, or [`Error::UnresolvedConsecutive`]
    pub fn resolve(&self, id: u32) -> Result<&str> {
        self.get(id).ok_or(Error::UnresolvedConsecutive { id })
    }

    /// Ids that appeared more than once, in the order they were overridden
    pub fn overridden_ids(&self) -> &[u32] {
        &self.overridden
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for ReferenceTable {
    fn from_iter<T: IntoIterator<Item = (u32, S)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (id, record) in iter {
            table.insert(id, record);
        }
        table
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::ReferenceTableMalformed(reason.into())
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn id_from_cell(cell: &Data) -> Option<u32> {
    let id = match cell {
        Data::Int(v) => u32::try_from(*v).ok(),
        Data::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64 => Some(*v as u32),
        Data::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    };
    id.filter(|id| *id > 0)
}

/// Text form of a cell; integral floats lose their `.0`
fn cell_text(cell: &Data) -> String {
    let text = match cell {
        Data::Empty => String::new(),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
        other => other.to_string(),
    };
    text.trim().to_string()
}
