use crate::core::tables::{InputsSummary, Table};
use crate::core::theory::TableKey;
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const SECTION_EXTENSION: &str = ".csv";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("Result container error for '{path}': {source}")]
    Zip { path: String, source: ZipError },
    #[error("CSV error in section '{section}': {source}")]
    Csv { section: String, source: csv::Error },
    #[error("Section '{section}' not found in '{path}'")]
    MissingSection { path: String, section: String },
    #[error("Malformed section '{section}': {reason}")]
    Malformed { section: String, reason: String },
}

/// A result file: a zip container holding one CSV entry per named section.
///
/// One-dimensional tables are a single column headed `0`; two-dimensional tables have
/// one column per Matsubara index headed `0..n`. The inputs summary is a single row
/// with named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    path: PathBuf,
}

impl ResultFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Creates the file holding exactly `sections`, truncating any previous content.
    pub fn create(&self, sections: &[(TableKey, Table)]) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), sections = sections.len(), "Creating result file.");
        let entries = sections
            .iter()
            .map(|(key, table)| Ok((entry_name(*key), encode(*key, table)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        self.write_entries(&entries)
    }

    /// Adds `sections` to an existing file.
    ///
    /// Sections with other names are carried over byte for byte; a section with the
    /// same name as a new one is replaced.
    pub fn append(&self, sections: &[(TableKey, Table)]) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), sections = sections.len(), "Appending to result file.");
        let mut new_entries = sections
            .iter()
            .map(|(key, table)| Ok((entry_name(*key), encode(*key, table)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut entries: Vec<(String, Vec<u8>)> = self
            .read_entries()?
            .into_iter()
            .filter(|(name, _)| !new_entries.iter().any(|(new, _)| new == name))
            .collect();
        entries.append(&mut new_entries);
        self.write_entries(&entries)
    }

    /// Names of the sections stored in the file, in storage order.
    pub fn section_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read_entries()?
            .into_iter()
            .map(|(name, _)| {
                name.strip_suffix(SECTION_EXTENSION)
                    .map(str::to_string)
                    .unwrap_or(name)
            })
            .collect())
    }

    pub fn has_section(&self, key: TableKey) -> Result<bool, StoreError> {
        Ok(self.section_names()?.iter().any(|name| name == key.name()))
    }

    pub fn read_summary(&self) -> Result<InputsSummary, StoreError> {
        let bytes = self.read_entry(TableKey::Inputs)?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        reader
            .deserialize::<InputsSummary>()
            .next()
            .ok_or_else(|| malformed(TableKey::Inputs, "no summary row"))?
            .map_err(|source| csv_error(TableKey::Inputs, source))
    }

    /// Reads a one-dimensional table; for two-dimensional data the first column is
    /// returned.
    pub fn read_vector(&self, key: TableKey) -> Result<Vec<f64>, StoreError> {
        let matrix = self.read_matrix(key)?;
        if matrix.ncols() == 0 {
            return Ok(Vec::new());
        }
        Ok(matrix.column(0).iter().copied().collect())
    }

    pub fn read_matrix(&self, key: TableKey) -> Result<DMatrix<f64>, StoreError> {
        let bytes = self.read_entry(key)?;
        decode_matrix(key, &bytes)
    }

    fn read_entry(&self, key: TableKey) -> Result<Vec<u8>, StoreError> {
        let wanted = entry_name(key);
        let mut archive = self.open_archive()?;
        let mut entry = match archive.by_name(&wanted) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(StoreError::MissingSection {
                    path: self.display_path(),
                    section: key.name().to_string(),
                });
            }
            Err(source) => return Err(self.zip_error(source)),
        };
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| self.io_error(source))?;
        Ok(bytes)
    }

    fn read_entries(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let mut archive = self.open_archive()?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|source| self.zip_error(source))?;
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|source| self.io_error(source))?;
            entries.push((name, bytes));
        }
        Ok(entries)
    }

    fn open_archive(&self) -> Result<ZipArchive<File>, StoreError> {
        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;
        ZipArchive::new(file).map_err(|source| self.zip_error(source))
    }

    /// Writes the container next to its final location and renames it into place, so
    /// readers never observe a half-written file.
    fn write_entries(&self, entries: &[(String, Vec<u8>)]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staged = NamedTempFile::new_in(&dir).map_err(|source| self.io_error(source))?;
        let mut writer = ZipWriter::new(staged);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, bytes) in entries {
            writer
                .start_file(name.as_str(), options)
                .map_err(|source| self.zip_error(source))?;
            writer
                .write_all(bytes)
                .map_err(|source| self.io_error(source))?;
        }
        let staged = writer.finish().map_err(|source| self.zip_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }

    fn display_path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.display_path(),
            source,
        }
    }

    fn zip_error(&self, source: ZipError) -> StoreError {
        StoreError::Zip {
            path: self.display_path(),
            source,
        }
    }
}

fn entry_name(key: TableKey) -> String {
    format!("{}{}", key.name(), SECTION_EXTENSION)
}

fn csv_error(key: TableKey, source: csv::Error) -> StoreError {
    StoreError::Csv {
        section: key.name().to_string(),
        source,
    }
}

fn malformed(key: TableKey, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        section: key.name().to_string(),
        reason: reason.into(),
    }
}

fn encode(key: TableKey, table: &Table) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let result = match table {
        Table::Summary(summary) => writer.serialize(summary),
        Table::Vector(values) => writer.write_record(["0"]).and_then(|_| {
            values
                .iter()
                .try_for_each(|value| writer.write_record([value.to_string()]))
        }),
        Table::Matrix(matrix) => {
            let header: Vec<String> = (0..matrix.ncols()).map(|i| i.to_string()).collect();
            writer.write_record(&header).and_then(|_| {
                matrix.row_iter().try_for_each(|row| {
                    writer.write_record(row.iter().map(|value| value.to_string()))
                })
            })
        }
    };
    result.map_err(|source| csv_error(key, source))?;
    writer
        .into_inner()
        .map_err(|err| csv_error(key, csv::Error::from(err.into_error())))
}

fn decode_matrix(key: TableKey, bytes: &[u8]) -> Result<DMatrix<f64>, StoreError> {
    let mut reader = csv::Reader::from_reader(bytes);
    // A table without columns is written as a lone empty field per line.
    let ncols = match reader.headers().map_err(|source| csv_error(key, source))? {
        headers if is_empty_record(headers) => 0,
        headers => headers.len(),
    };
    let mut values = Vec::new();
    let mut nrows = 0;
    for record in reader.records() {
        let record = record.map_err(|source| csv_error(key, source))?;
        if ncols == 0 {
            if !is_empty_record(&record) {
                return Err(malformed(
                    key,
                    format!("row {} has values but the table has no columns", nrows),
                ));
            }
            nrows += 1;
            continue;
        }
        if record.len() != ncols {
            return Err(malformed(
                key,
                format!("row {} has {} columns, expected {}", nrows, record.len(), ncols),
            ));
        }
        for field in record.iter() {
            let value = field
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed(key, format!("'{}' is not a number", field)))?;
            values.push(value);
        }
        nrows += 1;
    }
    Ok(DMatrix::from_row_slice(nrows, ncols, &values))
}

fn is_empty_record(record: &csv::StringRecord) -> bool {
    record.len() == 1 && record[0].trim().is_empty()
}
