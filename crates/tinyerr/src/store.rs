//! Persistence of the most recently rendered error, so a later invocation can show it again.
//!
//! The record is the full [`RenderedError`] chain (frames, cause, context) encoded with postcard
//! behind a short magic header. Only the last error is kept; each save overwrites the file.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use crate::{frame::FrameFormatter, trace::RenderedError};

/// Header identifying a trace record, followed by the format version.
const TRACE_MAGIC: &[u8] = b"TINYERR\x01";

/// Name of the record file inside the store directory.
const TRACE_FILE_NAME: &str = "last_traceback";

/// Shown by [`TraceStore::last_traceback`] when nothing was saved yet.
pub const NO_TRACE_MESSAGE: &str = "no trace was found";

/// Shown by [`TraceStore::last_traceback`] when the record cannot be read back.
pub const LOAD_ERROR_MESSAGE: &str = "error loading trace";

/// Location of the persisted last trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStore {
    path: PathBuf,
}

impl Default for TraceStore {
    /// Stores the record in the user cache directory, or the temp directory when there is none.
    fn default() -> Self {
        let dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("tinyerr");
        Self::new(dir.join(TRACE_FILE_NAME))
    }
}

impl TraceStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes an error to the record format.
    pub fn encode(error: &RenderedError) -> Result<Vec<u8>, StoreError> {
        let encoded = postcard::to_allocvec(error).map_err(StoreError::Encode)?;
        let mut out = Vec::with_capacity(TRACE_MAGIC.len() + encoded.len());
        out.extend_from_slice(TRACE_MAGIC);
        out.extend_from_slice(&encoded);
        Ok(out)
    }

    /// Parses a record produced by [`Self::encode`].
    pub fn decode(data: &[u8]) -> Result<RenderedError, StoreError> {
        let Some(payload) = data.strip_prefix(TRACE_MAGIC) else {
            return Err(StoreError::BadHeader);
        };
        postcard::from_bytes(payload).map_err(StoreError::Decode)
    }

    /// Overwrites the record with `error`, creating the directory if needed.
    pub fn save(&self, error: &RenderedError) -> Result<(), StoreError> {
        let data = Self::encode(error)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(StoreError::Io)?;
        }
        fs::write(&self.path, data).map_err(StoreError::Io)?;
        tracing::debug!(path = %self.path.display(), "saved last trace");
        Ok(())
    }

    /// Reads the record back.
    pub fn load(&self) -> Result<RenderedError, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(StoreError::Missing),
            Err(err) => return Err(StoreError::Io(err)),
        };
        Self::decode(&data)
    }

    /// Renders the saved error with every frame, or a short notice when there is none or it
    /// cannot be read. Never fails.
    #[must_use]
    pub fn last_traceback(&self, formatter: &FrameFormatter<'_>) -> String {
        match self.load() {
            Ok(error) => error.trace(formatter, 0),
            Err(StoreError::Missing) => NO_TRACE_MESSAGE.to_owned(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "could not load last trace");
                LOAD_ERROR_MESSAGE.to_owned()
            }
        }
    }
}

/// Failure to save or load the persisted trace.
#[derive(Debug)]
pub enum StoreError {
    /// No trace has been saved.
    Missing,
    /// The file exists but is not a trace record.
    BadHeader,
    /// The record could not be serialized.
    Encode(postcard::Error),
    /// The record is truncated or corrupted.
    Decode(postcard::Error),
    /// Reading or writing the file failed.
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no trace has been saved"),
            Self::BadHeader => write!(f, "not a trace record"),
            Self::Encode(err) => write!(f, "failed to serialize trace: {err}"),
            Self::Decode(err) => write!(f, "trace record was truncated or corrupted: {err}"),
            Self::Io(err) => write!(f, "trace store i/o error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Missing | Self::BadHeader => None,
        }
    }
}
