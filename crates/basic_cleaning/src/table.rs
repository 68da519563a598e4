//! Table - CSV rows as raw text cells
//!
//! Cells are kept verbatim so passthrough columns leave the stage byte-for-byte
//! as they arrived.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use contracts::ContractError;
use csv::{ReaderBuilder, WriterBuilder};

/// In-memory table: header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, in file order
    pub headers: Vec<String>,
    /// Each data row, one string per column
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV file with a header row
    pub fn read_csv(path: &Path) -> Result<Self, ContractError> {
        let file = File::open(path)?;
        Self::from_reader(file)
            .map_err(|e| ContractError::table(format!("{}: {e}", path.display())))
    }

    /// Read CSV with a header row from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Write the table as CSV
    pub fn write_csv(&self, path: &Path) -> Result<(), ContractError> {
        let file = File::create(path)?;
        self.to_writer(file)
            .map_err(|e| ContractError::table(format!("{}: {e}", path.display())))
    }

    /// Write CSV (header row first) to any writer
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Position of a required column
    ///
    /// # Errors
    /// [`ContractError::Schema`] when the column is absent
    pub fn column_index(&self, name: &str) -> Result<usize, ContractError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| ContractError::schema(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
