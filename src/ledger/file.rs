//! Ledger file I/O
//!
//! Raw table access shared by the writer, reader and compactor. Reads
//! return every record as raw bytes (malformed rows and invalid UTF-8
//! included) so that a rewrite never drops data it did not understand.
//!
//! # Write Protocol
//!
//! 1. Create the data directory if needed
//! 2. Write header + all rows to `<file>.tmp`
//! 3. Flush (and fsync when `sync_on_write`)
//! 4. Atomic rename over the ledger file
//!
//! A failure at any step leaves the previous ledger file untouched.

use super::codec;
use crate::error::LedgerError;
use csv::ByteRecord;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// A record together with its 1-based line number in the file
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: u64,
    pub record: ByteRecord,
}

/// Everything read from the ledger file
#[derive(Debug, Default)]
pub struct Table {
    /// Whether the first row was the header
    pub has_header: bool,
    pub rows: Vec<RawRow>,
}

#[derive(Debug)]
pub struct LedgerFile {
    path: PathBuf,
    sync_on_write: bool,
}

impl LedgerFile {
    pub fn new(path: impl AsRef<Path>, sync_on_write: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_on_write,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the whole table. `Ok(None)` when the file does not exist.
    pub fn read_table(&self) -> Result<Option<Table>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LedgerError::FileAccess {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut table = Table::default();
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result.map_err(|e| LedgerError::Load {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

            if idx == 0 && codec::is_header(&record) {
                table.has_header = true;
                continue;
            }

            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(idx as u64 + 1);
            table.rows.push(RawRow { line, record });
        }

        Ok(Some(table))
    }

    /// Replace the ledger with the header followed by `records`.
    pub fn replace<'a, I>(&self, records: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = &'a ByteRecord>,
    {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LedgerError::FileAccess {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp_path = self.tmp_path();
        let result = self.write_tmp(&tmp_path, records).and_then(|_| {
            fs::rename(&tmp_path, &self.path).map_err(|source| LedgerError::FileAccess {
                path: self.path.clone(),
                source,
            })
        });

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn write_tmp<'a, I>(&self, tmp_path: &Path, records: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = &'a ByteRecord>,
    {
        let file = File::create(tmp_path).map_err(|source| LedgerError::FileAccess {
            path: tmp_path.to_path_buf(),
            source,
        })?;

        let write_err = |source: io::Error| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(BufWriter::new(file));

        writer
            .write_byte_record(codec::header_record().as_byte_record())
            .map_err(|e| write_err(io::Error::other(e)))?;
        for record in records {
            writer
                .write_byte_record(record)
                .map_err(|e| write_err(io::Error::other(e)))?;
        }

        let buffered = writer
            .into_inner()
            .map_err(|e| write_err(io::Error::other(e.to_string())))?;
        let file = buffered
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;

        if self.sync_on_write {
            file.sync_all().map_err(write_err)?;
        }
        Ok(())
    }
}
