use std::fs;

use pretty_assertions::assert_eq;
use tinyerr::{
    Config, Frame, FrameFormatter, LOAD_ERROR_MESSAGE, NO_TRACE_MESSAGE, RawException, RenderedError, RuleSet,
    SourceMap, StoreError, SyntaxLocation, TraceStore,
};

fn chained_error() -> RenderedError {
    let raw = RawException::new("TypeError", "unsupported operand type(s) for +: 'int' and 'str'")
        .with_frames(vec![
            Frame::new("<main>", 3, "<module>"),
            Frame::new("<main>", 1, "add").with_columns(11, 16).with_source("    return a + b"),
        ])
        .with_context(RawException::new("KeyError", "'total'"));
    RenderedError::from_exception(&raw, &RuleSet::builtin())
}

/// A cause raised from inside a handler: both links are kept, the cause is a syntax error.
fn caused_error() -> RenderedError {
    let syntax = SyntaxLocation {
        filename: "<config>".to_owned(),
        lineno: 1,
        offset: Some(5),
        end_offset: Some(6),
        text: Some("x = = 1\n".to_owned()),
        ..SyntaxLocation::default()
    };
    let raw = RawException::new("RuntimeError", "config could not be loaded")
        .with_frames(vec![Frame::new("<main>", 7, "load").with_source("    raise RuntimeError(msg) from err")])
        .with_context(RawException::new("KeyError", "'total'"))
        .with_cause(RawException::new("SyntaxError", "invalid syntax (<config>, line 1)").with_syntax(syntax));
    RenderedError::from_exception(&raw, &RuleSet::builtin())
}

#[test]
fn saved_trace_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("last"));
    let error = chained_error();

    store.save(&error).unwrap();
    assert_eq!(store.load().unwrap(), error);
}

#[test]
fn cause_with_syntax_location_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("last"));
    let error = caused_error();

    store.save(&error).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, error);

    assert!(loaded.suppress_context());
    assert_eq!(loaded.context().unwrap().message(), "key 'total' not found");
    let cause = loaded.cause().unwrap();
    assert_eq!(cause.rule(), Some("syntax"));
    assert_eq!(cause.groups().get("file"), "<config>");
    assert_eq!(cause.groups().get("line"), "1");
    let syntax_frame = &cause.raw_frames()[0];
    assert_eq!(syntax_frame.source_text.as_deref(), Some("x = = 1"));
    assert_eq!(syntax_frame.end_line_number, Some(1));
    assert_eq!((syntax_frame.column, syntax_frame.end_column), (Some(4), Some(5)));

    let config = Config::default();
    let lines = SourceMap::new();
    let formatter = FrameFormatter::new(&config, &lines);
    assert_eq!(loaded.trace(&formatter, 0), error.trace(&formatter, 0));
    assert_eq!(store.last_traceback(&formatter), error.trace(&formatter, 0));
}

#[test]
fn save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("cache").join("tinyerr").join("last"));
    store.save(&chained_error()).unwrap();
    assert!(store.path().is_file());
}

#[test]
fn save_overwrites_the_previous_trace() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("last"));
    store.save(&chained_error()).unwrap();

    let second = RenderedError::from_exception(&RawException::new("KeyError", "'b'"), &RuleSet::builtin());
    store.save(&second).unwrap();
    assert_eq!(store.load().unwrap().message(), "key 'b' not found");
}

#[test]
fn missing_trace() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("never-written"));
    assert!(matches!(store.load(), Err(StoreError::Missing)));

    let config = Config::default();
    let lines = SourceMap::new();
    assert_eq!(store.last_traceback(&FrameFormatter::new(&config, &lines)), NO_TRACE_MESSAGE);
}

#[test]
fn foreign_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("last"));
    fs::write(store.path(), b"Traceback (most recent call last):").unwrap();
    assert!(matches!(store.load(), Err(StoreError::BadHeader)));

    let config = Config::default();
    let lines = SourceMap::new();
    assert_eq!(store.last_traceback(&FrameFormatter::new(&config, &lines)), LOAD_ERROR_MESSAGE);
}

#[test]
fn truncated_record_is_rejected() {
    let encoded = TraceStore::encode(&chained_error()).unwrap();
    let truncated = &encoded[..encoded.len() / 2];
    let err = TraceStore::decode(truncated).unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)));
    assert!(err.to_string().starts_with("trace record was truncated or corrupted"), "{err}");
}

/// The last trace is shown in full regardless of the configured limit.
#[test]
fn last_traceback_shows_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("last"));
    store.save(&chained_error()).unwrap();

    let config = Config::default().traceback_limit(1);
    let lines = SourceMap::new();
    let formatter = FrameFormatter::new(&config, &lines);
    let last = store.last_traceback(&formatter);
    assert_eq!(last, chained_error().trace(&formatter, 0));
    assert!(last.contains("<main>:3 in <module>"));
    assert!(last.ends_with("<main>:1 in add\n\n    return a + b\n           ~~^~~\n\nTypeError: cannot do `<int> + <str>`"));
}
