//! Source line lookup.
//!
//! The renderer never reads files itself: it asks a [`LineSource`] for line *N* of file *F*.
//! [`LineCache`] reads from disk and memoizes whole files; [`SourceMap`] serves sources the host
//! already holds in memory (REPL input, `exec` strings, tests).
//!
//! Lines are returned as raw bytes without their line terminator so that column offsets, which
//! interpreters report in bytes, can be normalized against exactly what was executed. Missing
//! files and out-of-range lines return `None` rather than an error.

use std::{
    collections::HashMap,
    fs,
    sync::{Arc, Mutex, PoisonError},
};

/// Provides the text of source lines by file name and 1-based line number.
pub trait LineSource {
    /// Returns the bytes of line `lineno` of `file`, without the trailing newline.
    fn line_bytes(&self, file: &str, lineno: usize) -> Option<Vec<u8>>;

    /// Returns line `lineno` of `file` decoded lossily.
    fn line(&self, file: &str, lineno: usize) -> Option<String> {
        self.line_bytes(file, lineno)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

type Lines = Arc<[Vec<u8>]>;

/// Disk-backed [`LineSource`] caching every file it reads, including failed reads.
#[derive(Debug, Default)]
pub struct LineCache {
    files: Mutex<HashMap<String, Option<Lines>>>,
}

impl LineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every cached file.
    pub fn clear(&self) {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn lines(&self, file: &str) -> Option<Lines> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files
            .entry(file.to_owned())
            .or_insert_with(|| load_source_lines(file))
            .clone()
    }
}

impl LineSource for LineCache {
    fn line_bytes(&self, file: &str, lineno: usize) -> Option<Vec<u8>> {
        if lineno == 0 || file.is_empty() {
            return None;
        }
        self.lines(file)?.get(lineno - 1).cloned()
    }
}

fn load_source_lines(file: &str) -> Option<Lines> {
    match fs::read(file) {
        Ok(source) => Some(split_lines(&source).into()),
        Err(err) => {
            tracing::debug!(file, %err, "source file unavailable");
            None
        }
    }
}

/// Splits source bytes on `\n`, dropping the terminators (and a preceding `\r`).
fn split_lines(source: &[u8]) -> Vec<Vec<u8>> {
    if source.is_empty() {
        return Vec::new();
    }
    let source = source.strip_suffix(b"\n").unwrap_or(source);
    source
        .split(|byte| *byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect()
}

/// In-memory [`LineSource`] keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: HashMap<String, Vec<Vec<u8>>>,
}

impl SourceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the full source text of `file`.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>, source: impl AsRef<[u8]>) -> Self {
        self.insert(file, source);
        self
    }

    /// Registers or replaces the full source text of `file`.
    pub fn insert(&mut self, file: impl Into<String>, source: impl AsRef<[u8]>) {
        self.files.insert(file.into(), split_lines(source.as_ref()));
    }
}

impl LineSource for SourceMap {
    fn line_bytes(&self, file: &str, lineno: usize) -> Option<Vec<u8>> {
        let index = lineno.checked_sub(1)?;
        self.files.get(file)?.get(index).cloned()
    }
}
