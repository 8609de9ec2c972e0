//! The exception handler hosts call for uncaught exceptions.
//!
//! An [`Engine`] bundles everything a render needs. One engine at a time can be installed
//! process-wide with [`activate`]; [`excepthook`] then routes every uncaught exception through it.
//! While no engine is installed, `excepthook` falls back to the classic interpreter layout.

use std::{
    io::{self, Write},
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    classify::RuleSet,
    config::Config,
    frame::{Frame, FrameFormatter},
    linecache::{LineCache, LineSource},
    raw::RawException,
    store::{NO_TRACE_MESSAGE, TraceStore},
    trace::RenderedError,
};

const DEFAULT_CAUSE_CONNECTIVE: &str = "The above exception was the direct cause of the following exception:";
const DEFAULT_CONTEXT_CONNECTIVE: &str = "During handling of the above exception, another exception occurred:";

/// Engine installed by [`activate`], read by [`excepthook`].
static ACTIVE: RwLock<Option<Arc<Engine>>> = RwLock::new(None);

/// A configured renderer: rules, source lines and an optional store for the last trace.
pub struct Engine {
    config: Config,
    rules: RuleSet,
    lines: Box<dyn LineSource + Send + Sync>,
    store: Option<TraceStore>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("rules", &self.rules.rules().len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine with the builtin rules, a disk-backed line cache and the default store.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rules: RuleSet::builtin(),
            lines: Box::new(LineCache::new()),
            store: Some(TraceStore::default()),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the source of code lines, e.g. with an in-memory [`crate::SourceMap`].
    #[must_use]
    pub fn with_lines(mut self, lines: impl LineSource + Send + Sync + 'static) -> Self {
        self.lines = Box::new(lines);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: TraceStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Disables persistence of handled errors.
    #[must_use]
    pub fn without_store(mut self) -> Self {
        self.store = None;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn store(&self) -> Option<&TraceStore> {
        self.store.as_ref()
    }

    #[must_use]
    pub fn formatter(&self) -> FrameFormatter<'_> {
        FrameFormatter::new(&self.config, self.lines.as_ref())
    }

    #[must_use]
    pub fn build_error(&self, raw: &RawException) -> RenderedError {
        RenderedError::from_exception(raw, &self.rules)
    }

    /// Renders an error as it is shown at the top level.
    #[must_use]
    pub fn render(&self, error: &RenderedError) -> String {
        error.display(&self.formatter())
    }

    /// Renders `raw` to `out` and persists it.
    ///
    /// Only write failures are reported; a failed save is logged and otherwise ignored.
    pub fn handle(&self, raw: &RawException, out: &mut dyn Write) -> io::Result<RenderedError> {
        let error = self.build_error(raw);
        tracing::debug!(category = %error.category(), rule = ?error.rule(), "handling uncaught exception");
        writeln!(out, "{}", self.render(&error))?;
        out.flush()?;
        if let Some(store) = &self.store
            && let Err(err) = store.save(&error)
        {
            tracing::warn!(path = %store.path().display(), %err, "could not save last trace");
        }
        Ok(error)
    }

    /// The last persisted trace with every frame, or a notice when there is none.
    #[must_use]
    pub fn last_trace(&self) -> String {
        match &self.store {
            Some(store) => store.last_traceback(&self.formatter()),
            None => NO_TRACE_MESSAGE.to_owned(),
        }
    }
}

/// Installs an engine built from `config` as the process-wide handler.
#[must_use]
pub fn activate(config: Config) -> Arc<Engine> {
    activate_engine(Engine::new(config))
}

/// Installs `engine` as the process-wide handler, replacing any previous one.
#[must_use]
pub fn activate_engine(engine: Engine) -> Arc<Engine> {
    let engine = Arc::new(engine);
    *ACTIVE.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&engine));
    tracing::debug!("engine activated");
    engine
}

/// Uninstalls the process-wide handler, restoring the default layout. Returns the removed engine.
pub fn deactivate() -> Option<Arc<Engine>> {
    let previous = ACTIVE.write().unwrap_or_else(PoisonError::into_inner).take();
    if previous.is_some() {
        tracing::debug!("engine deactivated");
    }
    previous
}

#[must_use]
pub fn is_active() -> bool {
    ACTIVE.read().unwrap_or_else(PoisonError::into_inner).is_some()
}

/// The currently installed engine, if any.
#[must_use]
pub fn active_engine() -> Option<Arc<Engine>> {
    ACTIVE.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Handles an uncaught exception: renders it to stderr through the active engine, or in the
/// default layout when none is installed.
pub fn excepthook(raw: &RawException) {
    let result = match active_engine() {
        Some(engine) => engine.handle(raw, &mut io::stderr().lock()).map(|_| ()),
        None => write!(io::stderr().lock(), "{}", default_render(raw)),
    };
    if let Err(err) = result {
        tracing::warn!(%err, "could not write exception to stderr");
    }
}

/// Renders an exception chain the way the interpreter does without an engine.
#[must_use]
pub fn default_render(raw: &RawException) -> String {
    let mut out = String::new();
    if let Some(cause) = &raw.cause {
        out.push_str(&default_render(cause));
        out.push('\n');
        out.push_str(DEFAULT_CAUSE_CONNECTIVE);
        out.push_str("\n\n");
    } else if let Some(context) = raw.context.as_deref().filter(|_| !raw.suppress_context) {
        out.push_str(&default_render(context));
        out.push('\n');
        out.push_str(DEFAULT_CONTEXT_CONNECTIVE);
        out.push_str("\n\n");
    }

    if !raw.frames.is_empty() {
        out.push_str("Traceback (most recent call last):\n");
        for frame in &raw.frames {
            out.push_str(&default_frame_line(frame));
        }
    }
    if raw.message.is_empty() {
        out.push_str(&raw.type_name);
    } else {
        out.push_str(&format!("{}: {}", raw.type_name, raw.message));
    }
    out.push('\n');
    out
}

fn default_frame_line(frame: &Frame) -> String {
    let mut rendered = format!(
        "  File \"{}\", line {}, in {}\n",
        frame.file_path, frame.line_number, frame.scope_name
    );
    let line = frame.source_text.as_deref().map(str::trim).unwrap_or_default();
    if !line.is_empty() {
        rendered.push_str("    ");
        rendered.push_str(line);
        rendered.push('\n');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_render_matches_interpreter_layout() {
        let raw = RawException::new("ZeroDivisionError", "division by zero")
            .with_frames(vec![Frame::new("main.py", 2, "<module>").with_source("  1 / 0\n")]);
        assert_eq!(
            default_render(&raw),
            "Traceback (most recent call last):\n  File \"main.py\", line 2, in <module>\n    1 / 0\nZeroDivisionError: division by zero\n"
        );
    }

    #[test]
    fn default_render_without_frames_or_message() {
        assert_eq!(default_render(&RawException::new("KeyboardInterrupt", "")), "KeyboardInterrupt\n");
    }
}
