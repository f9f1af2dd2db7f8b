// src/source.rs

//! CSV row source.
//!
//! The validator only needs "next record, end of input, or error", so the
//! source is a small trait over `csv::Reader`. Records are returned as owned
//! strings because each row is consumed once and dropped.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Ordered record reader.
pub trait RowSource {
    /// Read the next record, `Ok(None)` at end of input.
    fn read_row(&mut self) -> Result<Option<Vec<String>>>;
}

/// Row source backed by a CSV reader.
pub struct CsvRows<R> {
    reader: csv::Reader<R>,
    record: StringRecord,
}

impl<R: Read> CsvRows<R> {
    /// Wrap any reader.
    ///
    /// With `with_header == false` the first record is discarded; otherwise
    /// every record is a data row. Records may differ in width; widths are
    /// checked per row by the validator.
    pub fn new(rdr: R, with_header: bool) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(!with_header)
            .flexible(true)
            .from_reader(rdr);

        Self {
            reader,
            record: StringRecord::new(),
        }
    }
}

impl CsvRows<File> {
    /// Open a CSV file from disk.
    pub fn open(path: &Path, with_header: bool) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("could not open csv file {:?}", path))?;
        Ok(Self::new(file, with_header))
    }
}

impl<R: Read> RowSource for CsvRows<R> {
    fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }

        Ok(Some(self.record.iter().map(str::to_string).collect()))
    }
}
