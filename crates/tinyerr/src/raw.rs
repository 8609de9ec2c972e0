//! The host-neutral description of an uncaught exception handed to the engine.
//!
//! Hosts (an embedding interpreter, or a shim dumping `sys.excepthook` arguments as JSON)
//! describe the exception, its stack, and the exceptions it is chained to. Every field except
//! `type_name` is optional in JSON:
//!
//! ```json
//! {
//!   "type_name": "TypeError",
//!   "bases": ["Exception", "BaseException", "object"],
//!   "message": "unsupported operand type(s) for +: 'int' and 'str'",
//!   "frames": [
//!     {"file_path": "main.py", "line_number": 3, "column": 9, "end_column": 14, "scope_name": "<module>"}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::{exc_type::ExcCategory, frame::Frame};

/// An exception as reported by the host at the moment it reached the top level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawException {
    /// Class name of the exception, e.g. `ValueError`.
    pub type_name: String,
    /// Base class names, nearest first (the class MRO without the class itself).
    #[serde(default)]
    pub bases: Vec<String>,
    /// `str()` of the exception value.
    #[serde(default)]
    pub message: String,
    /// Traceback frames, oldest call first.
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Exception explicitly chained with `raise ... from ...`.
    #[serde(default)]
    pub cause: Option<Box<RawException>>,
    /// Exception being handled when this one was raised.
    #[serde(default)]
    pub context: Option<Box<RawException>>,
    /// Set by `raise ... from ...`; hides `context` from the rendered chain.
    #[serde(default)]
    pub suppress_context: bool,
    /// Location recorded by syntax errors about the offending source.
    #[serde(default)]
    pub syntax: Option<SyntaxLocation>,
}

impl RawException {
    /// Creates an exception with a builtin-style name and message and no frames.
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets the frames, oldest call first.
    #[must_use]
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    /// Sets the base class names.
    #[must_use]
    pub fn with_bases(mut self, bases: Vec<String>) -> Self {
        self.bases = bases;
        self
    }

    /// Chains `cause` as the explicit cause, suppressing the context as `raise ... from` does.
    #[must_use]
    pub fn with_cause(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self.suppress_context = true;
        self
    }

    /// Chains `context` as the exception that was being handled.
    #[must_use]
    pub fn with_context(mut self, context: Self) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Attaches the location recorded by a syntax error.
    #[must_use]
    pub fn with_syntax(mut self, syntax: SyntaxLocation) -> Self {
        self.syntax = Some(syntax);
        self
    }

    /// The runtime category of this exception.
    #[must_use]
    pub fn category(&self) -> ExcCategory {
        ExcCategory::new(self.type_name.clone(), self.bases.clone())
    }

    /// Parses a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Location a `SyntaxError` records about the offending source.
///
/// Offsets are 1-based character offsets into `text`, as Python stores them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyntaxLocation {
    pub filename: String,
    pub lineno: usize,
    #[serde(default)]
    pub end_lineno: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub end_offset: Option<usize>,
    #[serde(default)]
    pub text: Option<String>,
}
