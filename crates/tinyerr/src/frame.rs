//! Stack frames and their rendering as a location line plus an underlined code block:
//!
//! ```text
//! app/main.py:12 in compute
//!
//!     result = x + y
//!              ~~^~~
//! ```

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use ruff_python_ast::Stmt;
use ruff_python_parser::parse_module;
use serde::{Deserialize, Serialize};

use crate::{
    anchor::Anchor,
    config::{Config, TemplateField},
    linecache::LineSource,
    offset::{byte_offset, char_offset},
    raw::SyntaxLocation,
    textwrap::{dedent, indent},
};

/// Shown in place of optional location fields a frame does not carry.
const MISSING_FIELD: &str = "?";

/// Scope name given to frames synthesized from a syntax error.
const MODULE_SCOPE: &str = "<module>";

/// One level of the call stack at the moment of failure.
///
/// Columns are 0-based byte offsets into the UTF-8 encoding of the line, which is what the
/// interpreter records. `source_text` is the full (unstripped) line as captured by the host and
/// is only used when the [`LineSource`] cannot provide the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub file_path: String,
    pub line_number: usize,
    #[serde(default)]
    pub end_line_number: Option<usize>,
    #[serde(default)]
    pub column: Option<usize>,
    #[serde(default)]
    pub end_column: Option<usize>,
    pub scope_name: String,
    #[serde(default)]
    pub source_text: Option<String>,
}

impl Frame {
    /// Creates a frame without column information.
    #[must_use]
    pub fn new(file_path: impl Into<String>, line_number: usize, scope_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            end_line_number: None,
            column: None,
            end_column: None,
            scope_name: scope_name.into(),
            source_text: None,
        }
    }

    /// Sets the byte column range of the failing expression.
    #[must_use]
    pub fn with_columns(mut self, column: usize, end_column: usize) -> Self {
        self.column = Some(column);
        self.end_column = Some(end_column);
        self
    }

    /// Sets the last line of the failing expression.
    #[must_use]
    pub fn with_end_line(mut self, end_line_number: usize) -> Self {
        self.end_line_number = Some(end_line_number);
        self
    }

    /// Attaches the captured source line.
    #[must_use]
    pub fn with_source(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }

    /// Builds the frame a syntax error records about itself.
    ///
    /// Syntax errors carry 1-based character offsets; they are converted to byte columns against
    /// the recorded text so the frame follows the same convention as every other frame. A missing
    /// end offset yields a single-character span.
    #[must_use]
    pub fn from_syntax_error(location: &SyntaxLocation) -> Self {
        let text = location
            .text
            .as_deref()
            .map(|text| text.trim_end_matches(['\n', '\r']));
        let to_column = |offset: usize| {
            let index = offset.saturating_sub(1);
            text.map_or(index, |text| byte_offset(text, index))
        };
        let column = location.offset.filter(|offset| *offset > 0);
        let end_column = column.map(|start| match location.end_offset {
            Some(end) if end > start => end,
            _ => start + 1,
        });
        Self {
            file_path: location.filename.clone(),
            line_number: location.lineno,
            end_line_number: Some(location.end_lineno.unwrap_or(location.lineno)),
            column: column.map(to_column),
            end_column: end_column.map(to_column),
            scope_name: MODULE_SCOPE.to_owned(),
            source_text: text.map(ToOwned::to_owned),
        }
    }

    /// The last line of the failing expression, never before the first.
    #[must_use]
    pub fn end_lineno(&self) -> usize {
        self.end_line_number.unwrap_or(self.line_number).max(self.line_number)
    }

    /// Whether the failing expression spans several physical lines.
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.end_lineno() != self.line_number
    }
}

/// Renders frames according to a [`Config`], reading source through a [`LineSource`].
#[derive(Clone, Copy)]
pub struct FrameFormatter<'a> {
    config: &'a Config,
    lines: &'a dyn LineSource,
}

impl<'a> FrameFormatter<'a> {
    #[must_use]
    pub fn new(config: &'a Config, lines: &'a dyn LineSource) -> Self {
        Self { config, lines }
    }

    #[must_use]
    pub fn config(&self) -> &'a Config {
        self.config
    }

    #[must_use]
    pub fn lines(&self) -> &'a dyn LineSource {
        self.lines
    }

    /// Formats the location line of a frame with the configured template.
    #[must_use]
    pub fn location(&self, frame: &Frame) -> String {
        let optional = |value: Option<usize>| value.map_or_else(|| MISSING_FIELD.to_owned(), |v| v.to_string());
        self.config.frame_template.render(|field| match field {
            TemplateField::File => short_path(&frame.file_path),
            TemplateField::Name => frame.scope_name.clone(),
            TemplateField::Lineno => frame.line_number.to_string(),
            TemplateField::EndLineno => optional(frame.end_line_number),
            TemplateField::Colno => optional(frame.column),
            TemplateField::EndColno => optional(frame.end_column),
        })
    }

    /// Formats the stripped source line of a frame and, when the frame has columns, the underline
    /// beneath it. Both lines are indented by the configured width.
    ///
    /// Returns an empty string when the line is unavailable or blank.
    #[must_use]
    pub fn code_block(&self, frame: &Frame) -> String {
        let Some(raw) = self.raw_line(frame) else {
            return String::new();
        };
        let line = String::from_utf8_lossy(&raw);
        let display = line.trim();
        if display.is_empty() {
            return String::new();
        }

        let mut block = display.to_owned();
        if let Some(anchor) = self.anchor(frame, &raw, &line) {
            if anchor.is_empty() {
                tracing::trace!(file = %frame.file_path, line = frame.line_number, "empty anchor omitted");
            } else if anchor.width() > display.chars().count() {
                tracing::debug!(
                    file = %frame.file_path,
                    line = frame.line_number,
                    "underline wider than the source line, omitted"
                );
            } else {
                block.push('\n');
                block.push_str(&anchor.to_string());
            }
        }
        indent(&block, &" ".repeat(self.config.code_indent))
    }

    /// Formats a frame as its location, a blank line, and its code block.
    #[must_use]
    pub fn format(&self, frame: &Frame) -> String {
        let location = self.location(frame);
        let code = self.code_block(frame);
        if code.is_empty() {
            location
        } else {
            format!("{location}\n\n{code}")
        }
    }

    /// Computes the underline anchor of a frame from its normalized column range.
    ///
    /// `raw` is the line exactly as executed and `line` its lossy decoding.
    #[must_use]
    pub fn anchor(&self, frame: &Frame, raw: &[u8], line: &str) -> Option<Anchor> {
        let (column, end_column) = (frame.column?, frame.end_column?);
        let start = char_offset(raw, column) + 1;
        if frame.is_multiline() {
            let end = line.trim_end().chars().count() + 1;
            Some(Anchor::from_line(line, start, end))
        } else {
            let end = char_offset(raw, end_column) + 1;
            Some(Anchor::from_segment(line, start, end))
        }
    }

    /// Whether the frame's statement is nothing but a `raise`, i.e. a frame that only re-signals
    /// an error. Lines that cannot be read or parsed are never considered pure raises.
    #[must_use]
    pub fn is_pure_raise(&self, frame: &Frame) -> bool {
        let Some(source) = self.statement_source(frame) else {
            return false;
        };
        match parse_module(&dedent(&source)) {
            Ok(parsed) => matches!(parsed.syntax().body.as_slice(), [Stmt::Raise(_)]),
            Err(_) => false,
        }
    }

    fn raw_line(&self, frame: &Frame) -> Option<Vec<u8>> {
        self.lines
            .line_bytes(&frame.file_path, frame.line_number)
            .or_else(|| frame.source_text.as_ref().map(|text| text.as_bytes().to_vec()))
    }

    fn statement_source(&self, frame: &Frame) -> Option<String> {
        let mut source = String::new();
        for lineno in frame.line_number..=frame.end_lineno() {
            let line = match self.lines.line(&frame.file_path, lineno) {
                Some(line) => line,
                None if lineno == frame.line_number => frame.source_text.clone()?,
                None => return None,
            };
            source.push_str(&line);
            source.push('\n');
        }
        Some(source)
    }
}

/// Resolves a path to an absolute form, following symlinks when the file exists.
pub(crate) fn resolve_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Returns `file` relative to the current directory when possible, otherwise absolute.
///
/// Pseudo files such as `<stdin>` or `<string>` are returned unchanged.
fn short_path(file: &str) -> String {
    if file.starts_with('<') && file.ends_with('>') {
        return file.to_owned();
    }
    let absolute = resolve_path(Path::new(file));
    // files that do not exist are only made absolute, against the unresolved current directory
    let relative = env::current_dir().ok().and_then(|cwd| {
        [resolve_path(&cwd), cwd]
            .iter()
            .find_map(|base| absolute.strip_prefix(base).ok().map(Path::to_path_buf))
    });
    relative.unwrap_or(absolute).display().to_string()
}
