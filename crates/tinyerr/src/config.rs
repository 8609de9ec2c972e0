use std::{fmt, path::PathBuf, str::FromStr};

use strum::{Display, EnumString, IntoStaticStr};

/// Template used for frame location lines when none is configured.
pub const DEFAULT_FRAME_TEMPLATE: &str = "{file}:{lineno} in {name}";

/// Default indentation (in spaces) of the source line and underline beneath a location.
pub const DEFAULT_CODE_INDENT: usize = 4;

/// Rendering configuration, built once before any exception is handled and never mutated after.
///
/// Components receive it by reference. Use the builder methods to derive a configuration from
/// [`Config::default`]:
///
/// ```
/// use tinyerr::Config;
///
/// let config = Config::default().traceback_limit(3).color(true);
/// assert_eq!(config.traceback_limit, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Template for the location line of each frame.
    pub frame_template: FrameTemplate,
    /// Indentation of the code block beneath each location line.
    pub code_indent: usize,
    /// Wrap the rendered trace in a red ANSI escape.
    pub color: bool,
    /// Number of innermost frames shown per error, `0` for all of them.
    pub traceback_limit: usize,
    /// Hide frames whose statement is nothing but a `raise`.
    pub suppress_raise: bool,
    /// Only frames strictly after the first frame in this file are shown.
    pub boundary: Option<PathBuf>,
    /// What to show when `boundary` is set but never appears in a stack.
    pub missing_boundary: MissingBoundary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_template: FrameTemplate::default(),
            code_indent: DEFAULT_CODE_INDENT,
            color: false,
            traceback_limit: 0,
            suppress_raise: true,
            boundary: None,
            missing_boundary: MissingBoundary::default(),
        }
    }
}

impl Config {
    /// Parses and sets the frame location template.
    pub fn frame_template(mut self, template: &str) -> Result<Self, ConfigError> {
        self.frame_template = template.parse()?;
        Ok(self)
    }

    /// Sets the indentation of code blocks.
    #[must_use]
    pub fn code_indent(mut self, indent: usize) -> Self {
        self.code_indent = indent;
        self
    }

    /// Enables or disables colored output.
    #[must_use]
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Sets the number of innermost frames shown per error (`0` shows all).
    #[must_use]
    pub fn traceback_limit(mut self, limit: usize) -> Self {
        self.traceback_limit = limit;
        self
    }

    /// Enables or disables hiding of pure `raise` frames.
    #[must_use]
    pub fn suppress_raise(mut self, suppress: bool) -> Self {
        self.suppress_raise = suppress;
        self
    }

    /// Sets the boundary file above which frames are hidden.
    #[must_use]
    pub fn boundary(mut self, file: impl Into<PathBuf>) -> Self {
        self.boundary = Some(file.into());
        self
    }

    /// Sets the policy applied when the boundary file is absent from a stack.
    #[must_use]
    pub fn missing_boundary(mut self, policy: MissingBoundary) -> Self {
        self.missing_boundary = policy;
        self
    }
}

/// Behavior of the frame filter when the boundary file never appears in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum MissingBoundary {
    /// Drop every frame. This is the historical behavior.
    #[default]
    HideAll,
    /// Keep the stack untouched.
    ShowAll,
}

/// Placeholders understood by [`FrameTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TemplateField {
    File,
    Name,
    Lineno,
    EndLineno,
    Colno,
    EndColno,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(TemplateField),
}

/// A parsed frame location template such as `"{file}:{lineno} in {name}"`.
///
/// Placeholders are validated when the template is parsed; `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl Default for FrameTemplate {
    fn default() -> Self {
        DEFAULT_FRAME_TEMPLATE
            .parse()
            .expect("default frame template is valid")
    }
}

impl FrameTemplate {
    /// The template text as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Renders the template, asking `value` for the text of each placeholder.
    #[must_use]
    pub fn render(&self, mut value: impl FnMut(TemplateField) -> String) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&value(*field)),
            }
        }
        out
    }
}

impl FromStr for FrameTemplate {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();
        while let Some((position, ch)) = chars.next() {
            match ch {
                '{' if chars.next_if(|(_, next)| *next == '{').is_some() => text.push('{'),
                '}' if chars.next_if(|(_, next)| *next == '}').is_some() => text.push('}'),
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, next) in chars.by_ref() {
                        if next == '}' {
                            closed = true;
                            break;
                        }
                        name.push(next);
                    }
                    if !closed {
                        return Err(ConfigError::UnclosedPlaceholder { position });
                    }
                    let field = name
                        .parse()
                        .map_err(|_| ConfigError::UnknownPlaceholder { name: name.clone() })?;
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(ConfigError::UnmatchedBrace { position }),
                _ => text.push(ch),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }
}

impl fmt::Display for FrameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Invalid configuration, reported before any exception is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A `{name}` placeholder the template language does not know.
    UnknownPlaceholder { name: String },
    /// A `{` with no closing `}`.
    UnclosedPlaceholder { position: usize },
    /// A lone `}` outside a placeholder.
    UnmatchedBrace { position: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlaceholder { name } => write!(
                f,
                "unknown placeholder {{{name}}} in frame template, expected one of \
                 {{file}} {{name}} {{lineno}} {{end_lineno}} {{colno}} {{end_colno}}"
            ),
            Self::UnclosedPlaceholder { position } => {
                write!(f, "unclosed placeholder at position {position} in frame template")
            }
            Self::UnmatchedBrace { position } => {
                write!(f, "unmatched '}}' at position {position} in frame template")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
