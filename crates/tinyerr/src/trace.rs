//! Assembly of the final diagnostic from a chain of linked errors.
//!
//! A [`RenderedError`] is built once from a [`RawException`]: its message is classified and its
//! explicit cause and implicit context are converted recursively. Links are owned boxes that
//! always point at earlier failures, so the chain is acyclic and its depth is that of the
//! original exception chain.
//!
//! Rendering prints linked errors first, oldest at the top, each followed by a connective line:
//!
//! ```text
//! main.py:2 in <module>
//!
//!     value = int(text)
//!             ^^^^^^^^^
//!
//! ValueError: cannot convert 'abc' to int (base 10)
//!
//! the following occurred while handling the above exception:
//!
//! main.py:4 in <module>
//!
//!     print(undefined)
//!           ^^^^^^^^^
//!
//! NameError: 'undefined' is not defined
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    classify::{Groups, RuleSet},
    exc_type::ExcCategory,
    filter::filter_frames,
    frame::{Frame, FrameFormatter},
    raw::RawException,
};

/// Connective printed after an error that explicitly caused the next one.
pub const CAUSE_CONNECTIVE: &str = "the above exception caused the following:";

/// Connective printed after an error whose handling raised the next one.
pub const CONTEXT_CONNECTIVE: &str = "the following occurred while handling the above exception:";

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// An uncaught exception prepared for display.
///
/// Immutable once built; frames are stored unfiltered and filtered on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedError {
    category: ExcCategory,
    original_message: String,
    rule: Option<String>,
    groups: Groups,
    message: String,
    frames: Vec<Frame>,
    cause: Option<Box<RenderedError>>,
    context: Option<Box<RenderedError>>,
    suppress_context: bool,
}

impl RenderedError {
    /// Classifies `raw` and converts its whole chain.
    ///
    /// Syntax errors get an extra frame synthesized from the location they record, appended
    /// after the call stack.
    #[must_use]
    pub fn from_exception(raw: &RawException, rules: &RuleSet) -> Self {
        let category = raw.category();
        let classification = rules.classify(&category, &raw.message);

        let mut frames = raw.frames.clone();
        if let Some(location) = &raw.syntax {
            frames.push(Frame::from_syntax_error(location));
        }

        Self {
            category,
            original_message: raw.message.clone(),
            rule: classification.rule.map(ToOwned::to_owned),
            groups: classification.groups,
            message: classification.message,
            frames,
            cause: raw
                .cause
                .as_deref()
                .map(|cause| Box::new(Self::from_exception(cause, rules))),
            context: raw
                .context
                .as_deref()
                .map(|context| Box::new(Self::from_exception(context, rules))),
            suppress_context: raw.suppress_context,
        }
    }

    #[must_use]
    pub fn category(&self) -> &ExcCategory {
        &self.category
    }

    /// The message as the interpreter phrased it.
    #[must_use]
    pub fn original_message(&self) -> &str {
        &self.original_message
    }

    /// Name of the classification rule that produced [`Self::message`], if any.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    #[must_use]
    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    /// The message shown to the user: classified, or the original when no rule matched.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The unfiltered stack, oldest call first.
    #[must_use]
    pub fn raw_frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }

    #[must_use]
    pub fn context(&self) -> Option<&Self> {
        self.context.as_deref()
    }

    #[must_use]
    pub fn suppress_context(&self) -> bool {
        self.suppress_context
    }

    /// The frames to display, after raise-suppression and boundary filtering.
    #[must_use]
    pub fn frames<'s>(&'s self, formatter: &FrameFormatter<'_>) -> Vec<&'s Frame> {
        filter_frames(&self.frames, formatter)
    }

    /// The final `Category: message` line; just the category when the message is empty.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.category.name().to_owned()
        } else {
            format!("{}: {}", self.category, self.message)
        }
    }

    /// Renders the whole chain. `limit` caps the frames shown per error to the innermost ones,
    /// `0` shows all of them.
    #[must_use]
    pub fn trace(&self, formatter: &FrameFormatter<'_>, limit: usize) -> String {
        let mut parts = Vec::new();

        if let Some(cause) = self.cause() {
            parts.push(cause.trace(formatter, limit));
            parts.push(CAUSE_CONNECTIVE.to_owned());
        } else if let Some(context) = self.context().filter(|_| !self.suppress_context) {
            parts.push(context.trace(formatter, limit));
            parts.push(CONTEXT_CONNECTIVE.to_owned());
        }

        let frames = self.frames(formatter);
        let skip = if limit == 0 {
            0
        } else {
            frames.len().saturating_sub(limit)
        };
        parts.extend(frames[skip..].iter().map(|frame| formatter.format(frame)));
        parts.push(self.summary());

        parts.retain(|part| !part.is_empty());
        parts.join("\n\n")
    }

    /// Renders the chain the way it is shown at the top level: with the configured limit, and
    /// wrapped in color when enabled.
    #[must_use]
    pub fn display(&self, formatter: &FrameFormatter<'_>) -> String {
        let config = formatter.config();
        let trace = self.trace(formatter, config.traceback_limit);
        if config.color {
            format!("{RED}{trace}{RESET}")
        } else {
            trace
        }
    }
}
