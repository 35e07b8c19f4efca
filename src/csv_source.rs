//! Reading the semicolon-delimited input file.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::errors::EtlError;

pub const DELIMITER: u8 = b';';

/// Parsed CSV contents with normalized column names.
#[derive(Debug, Clone)]
pub struct CsvData {
    pub columns: Vec<String>,
    pub records: Vec<StringRecord>,
}

impl CsvData {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `<project_root>/data/processed/<table>.csv`
pub fn csv_path(project_root: &Path, table: &str) -> PathBuf {
    project_root
        .join("data")
        .join("processed")
        .join(format!("{}.csv", table))
}

/// Trims and lower-cases a header so it can be matched against column names.
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reads a `;`-delimited CSV with a header row.
///
/// A missing file yields [`EtlError::FileNotFound`]; a file without a header
/// row yields [`EtlError::MissingHeader`].
pub fn read_csv(path: &Path) -> Result<CsvData, EtlError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EtlError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(EtlError::Csv(csv::Error::from(e))),
    };
    read_csv_from(file)
}

pub fn read_csv_from<R: Read>(reader: R) -> Result<CsvData, EtlError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(reader);

    let columns = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(EtlError::MissingHeader);
    }

    let records = csv_reader
        .records()
        .collect::<Result<Vec<_>, csv::Error>>()?;

    Ok(CsvData { columns, records })
}
