use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Python builtin exception classes the classifier knows how to reason about.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the Python class name exactly (e.g., `ValueError` -> "ValueError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// Root of the hierarchy, catches everything.
    BaseException,
    /// Primary exception class - parent of every non-exit exception.
    Exception,
    SystemExit,
    KeyboardInterrupt,
    GeneratorExit,

    // --- ArithmeticError hierarchy ---
    ArithmeticError,
    FloatingPointError,
    OverflowError,
    ZeroDivisionError,

    // --- LookupError hierarchy ---
    LookupError,
    IndexError,
    KeyError,

    // --- RuntimeError hierarchy ---
    RuntimeError,
    NotImplementedError,
    RecursionError,

    // --- NameError hierarchy ---
    NameError,
    /// Accessing a local variable before assignment.
    UnboundLocalError,

    // --- ValueError hierarchy ---
    ValueError,
    UnicodeError,
    UnicodeDecodeError,
    UnicodeEncodeError,

    // --- ImportError hierarchy ---
    ImportError,
    ModuleNotFoundError,

    // --- OSError hierarchy ---
    OSError,
    FileNotFoundError,
    FileExistsError,
    IsADirectoryError,
    NotADirectoryError,
    PermissionError,
    TimeoutError,

    // --- SyntaxError hierarchy ---
    SyntaxError,
    IndentationError,
    TabError,

    // --- Direct subclasses of Exception ---
    AssertionError,
    AttributeError,
    BufferError,
    EOFError,
    MemoryError,
    ReferenceError,
    StopAsyncIteration,
    StopIteration,
    TypeError,
}

impl ExcType {
    /// The direct base class, `None` for `BaseException`.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        let parent = match self {
            Self::BaseException => return None,
            Self::Exception | Self::SystemExit | Self::KeyboardInterrupt | Self::GeneratorExit => {
                Self::BaseException
            }
            Self::FloatingPointError | Self::OverflowError | Self::ZeroDivisionError => Self::ArithmeticError,
            Self::IndexError | Self::KeyError => Self::LookupError,
            Self::NotImplementedError | Self::RecursionError => Self::RuntimeError,
            Self::UnboundLocalError => Self::NameError,
            Self::UnicodeError => Self::ValueError,
            Self::UnicodeDecodeError | Self::UnicodeEncodeError => Self::UnicodeError,
            Self::ModuleNotFoundError => Self::ImportError,
            Self::FileNotFoundError
            | Self::FileExistsError
            | Self::IsADirectoryError
            | Self::NotADirectoryError
            | Self::PermissionError
            | Self::TimeoutError => Self::OSError,
            Self::IndentationError => Self::SyntaxError,
            Self::TabError => Self::IndentationError,
            Self::ArithmeticError
            | Self::LookupError
            | Self::RuntimeError
            | Self::NameError
            | Self::ValueError
            | Self::ImportError
            | Self::OSError
            | Self::SyntaxError
            | Self::AssertionError
            | Self::AttributeError
            | Self::BufferError
            | Self::EOFError
            | Self::MemoryError
            | Self::ReferenceError
            | Self::StopAsyncIteration
            | Self::StopIteration
            | Self::TypeError => Self::Exception,
        };
        Some(parent)
    }

    /// Returns true if `self` would be caught by `except handler_type:`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        std::iter::successors(Some(self), |exc_type| exc_type.parent()).any(|ancestor| ancestor == handler_type)
    }
}

/// The runtime category of an exception: its class name plus the names of its base classes.
///
/// Hosts report user-defined exception classes by name, so the category keeps the raw names and
/// resolves builtin ancestry lazily. `bases` is the class MRO without the class itself, nearest
/// first, e.g. `["ValueError", "Exception", "BaseException", "object"]` for `class E(ValueError)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExcCategory {
    name: String,
    bases: Vec<String>,
}

impl ExcCategory {
    #[must_use]
    pub fn new(name: impl Into<String>, bases: Vec<String>) -> Self {
        Self {
            name: name.into(),
            bases,
        }
    }

    /// The class name shown on the final `Category: message` line.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// The builtin type this category names directly, if any.
    #[must_use]
    pub fn builtin(&self) -> Option<ExcType> {
        self.name.parse().ok()
    }

    /// Is-a test: true when the class itself or any of its bases is `exc_type` or one of its subclasses.
    #[must_use]
    pub fn is_a(&self, exc_type: ExcType) -> bool {
        std::iter::once(&self.name)
            .chain(&self.bases)
            .filter_map(|name| name.parse::<ExcType>().ok())
            .any(|known| known.is_subclass_of(exc_type))
    }
}

impl From<ExcType> for ExcCategory {
    fn from(exc_type: ExcType) -> Self {
        Self::new(exc_type.to_string(), Vec::new())
    }
}

impl fmt::Display for ExcCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
