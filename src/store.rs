//! Line-oriented flat files.
//!
//! One record per line, `;` between fields. Every mutation reads the whole
//! file, transforms it and writes it back. There is no locking; two writers
//! racing on the same file will lose updates.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackerError};

pub const FIELD_SEPARATOR: char = ';';

/// Splits a record on `;`, dropping trailing empty fields.
pub fn split_record(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Outcome of [`FlatFile::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Updated,
    Appended,
}

#[derive(Debug, Clone)]
pub struct FlatFile {
    path: PathBuf,
    atomic: bool,
}

impl FlatFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            atomic: false,
        }
    }

    /// Writes go through a sibling temp file and a rename.
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All lines for display and lookups. A missing or unreadable file
    /// reads as empty; bytes that are not UTF-8 are replaced.
    pub fn read_lines(&self) -> Vec<String> {
        match self.try_read_raw() {
            Ok(raw) => raw
                .iter()
                .map(|line| String::from_utf8_lossy(line).into_owned())
                .collect(),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to read data file");
                Vec::new()
            }
        }
    }

    /// Raw lines for the rewrite paths. Only a missing file reads as empty;
    /// any other failure is returned so the rewrite is abandoned.
    fn try_read_raw(&self) -> Result<Vec<Vec<u8>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Data file does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(TrackerError::io(&self.path, e)),
        };

        let mut lines: Vec<Vec<u8>> = bytes
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
            .collect();
        // content ending in a newline leaves one empty piece behind
        if lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        Ok(lines)
    }

    /// Parsed records for read-only lookups. Blank lines are skipped and
    /// trailing empty fields dropped.
    pub fn records(&self) -> Vec<Vec<String>> {
        let mut reader = match csv::ReaderBuilder::new()
            .delimiter(FIELD_SEPARATOR as u8)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(&self.path)
        {
            Ok(reader) => reader,
            Err(e) => {
                if is_not_found(&e) {
                    tracing::info!(path = %self.path.display(), "Data file does not exist yet");
                } else {
                    tracing::error!(path = %self.path.display(), error = %e, "Failed to open data file");
                }
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for result in reader.byte_records() {
            match result {
                Ok(row) => {
                    let mut fields: Vec<String> = row
                        .iter()
                        .map(|field| String::from_utf8_lossy(field).into_owned())
                        .collect();
                    while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
                        fields.pop();
                    }
                    if fields.iter().all(|f| f.is_empty()) {
                        continue;
                    }
                    records.push(fields);
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Skipping unreadable record");
                }
            }
        }
        records
    }

    /// First record whose leading field equals `key`, with at least
    /// `min_fields` fields.
    pub fn find(&self, key: &str, min_fields: usize) -> Option<Vec<String>> {
        self.records()
            .into_iter()
            .find(|fields| fields.len() >= min_fields && fields[0] == key)
    }

    /// Replaces the whole file with `lines`, one per line.
    pub fn write_lines(&self, lines: &[String]) -> Result<()> {
        let raw: Vec<Vec<u8>> = lines.iter().map(|line| line.clone().into_bytes()).collect();
        self.write_raw(&raw)
    }

    fn write_raw(&self, lines: &[Vec<u8>]) -> Result<()> {
        let mut content: Vec<u8> = Vec::new();
        for line in lines {
            content.extend_from_slice(line);
            content.push(b'\n');
        }

        let outcome = if self.atomic {
            self.write_atomic(&content)
        } else {
            self.ensure_parent().and_then(|_| fs::write(&self.path, &content))
        };

        outcome.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write data file");
            TrackerError::io(&self.path, e)
        })
    }

    /// Appends one line, creating the file if needed.
    pub fn append_line(&self, line: &str) -> Result<()> {
        let outcome = self.ensure_parent().and_then(|_| {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            writeln!(file, "{}", line)
        });

        outcome.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to append to data file");
            TrackerError::io(&self.path, e)
        })
    }

    /// Rewrites every line keyed by `key` through `edit`, or appends
    /// `fresh()` when no line matches.
    ///
    /// Blank lines and lines with fewer than `min_fields` fields pass
    /// through byte for byte. If the file cannot be read nothing is written.
    pub fn upsert<E, F>(&self, key: &str, min_fields: usize, edit: E, fresh: F) -> Result<Upsert>
    where
        E: FnMut(&[&str]) -> String,
        F: FnOnce() -> String,
    {
        let (mut lines, found) = self.rewrite_matching(key, min_fields, edit)?;
        if !found {
            lines.push(fresh().into_bytes());
        }
        self.write_raw(&lines)?;

        Ok(if found { Upsert::Updated } else { Upsert::Appended })
    }

    /// Rewrites lines keyed by `key` through `edit`; other lines pass
    /// through. Returns whether any line matched. Nothing is appended.
    pub fn update<E>(&self, key: &str, edit: E) -> Result<bool>
    where
        E: FnMut(&[&str]) -> String,
    {
        let (lines, found) = self.rewrite_matching(key, 1, edit)?;
        self.write_raw(&lines)?;
        Ok(found)
    }

    fn rewrite_matching<E>(&self, key: &str, min_fields: usize, mut edit: E) -> Result<(Vec<Vec<u8>>, bool)>
    where
        E: FnMut(&[&str]) -> String,
    {
        let mut found = false;
        let mut lines: Vec<Vec<u8>> = Vec::new();

        for raw in self.try_read_raw()? {
            let edited = {
                let line = String::from_utf8_lossy(&raw);
                let fields = split_record(&line);
                if line.trim().is_empty() || fields.len() < min_fields || fields[0] != key {
                    None
                } else {
                    Some(edit(&fields))
                }
            };
            match edited {
                Some(line) => {
                    found = true;
                    lines.push(line.into_bytes());
                }
                None => lines.push(raw),
            }
        }

        Ok((lines, found))
    }

    fn ensure_parent(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }

    fn write_atomic(&self, content: &[u8]) -> std::io::Result<()> {
        self.ensure_parent()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)
    }
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}
