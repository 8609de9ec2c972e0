use std::fs;

use pretty_assertions::assert_eq;
use tinyerr::{Config, Engine, Frame, NO_TRACE_MESSAGE, RawException, SourceMap, TraceStore};

fn sources() -> SourceMap {
    SourceMap::new().with_file("<main>", "numbers = [1, 2]\nprint(numbers[5])\n")
}

fn index_failure() -> RawException {
    RawException::new("IndexError", "list index out of range")
        .with_frames(vec![Frame::new("<main>", 2, "<module>").with_columns(6, 16)])
}

#[test]
fn handle_writes_the_trace_and_persists_it() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(Config::default())
        .with_lines(sources())
        .with_store(TraceStore::new(dir.path().join("last")));

    let mut out = Vec::new();
    let error = engine.handle(&index_failure(), &mut out).unwrap();

    let expected = "<main>:2 in <module>\n\n    print(numbers[5])\n          ~~~~~~~^^^\n\n\
                    IndexError: index out of range for this list";
    assert_eq!(String::from_utf8(out).unwrap(), format!("{expected}\n"));
    assert_eq!(engine.render(&error), expected);
    assert_eq!(engine.last_trace(), expected);
}

#[test]
fn engine_without_store_has_no_last_trace() {
    let engine = Engine::new(Config::default()).with_lines(sources()).without_store();
    let mut out = Vec::new();
    engine.handle(&index_failure(), &mut out).unwrap();
    assert!(engine.store().is_none());
    assert_eq!(engine.last_trace(), NO_TRACE_MESSAGE);
}

/// A store that cannot be written must not prevent the error from being shown.
#[test]
fn store_failure_does_not_interrupt_the_hook() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "not a directory").unwrap();
    let engine = Engine::new(Config::default())
        .with_lines(sources())
        .with_store(TraceStore::new(blocker.join("last")));

    let mut out = Vec::new();
    engine.handle(&index_failure(), &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("IndexError"));
}

#[test]
fn limit_applies_to_live_rendering() {
    let raw = RawException::new("ZeroDivisionError", "division by zero").with_frames(vec![
        Frame::new("<a>", 1, "outer"),
        Frame::new("<b>", 2, "inner"),
    ]);
    let engine = Engine::new(Config::default().traceback_limit(1)).without_store();
    let error = engine.build_error(&raw);
    assert_eq!(engine.render(&error), "<b>:2 in inner\n\nZeroDivisionError: cannot divide by zero");
}

/// The only test touching the process-wide engine, so tests running in parallel cannot race on it.
#[test]
fn activation_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::new(dir.path().join("last"));

    tinyerr::deactivate();
    assert!(!tinyerr::is_active());

    let engine = tinyerr::activate_engine(
        Engine::new(Config::default())
            .with_lines(sources())
            .with_store(store.clone()),
    );
    assert!(tinyerr::is_active());
    assert!(std::sync::Arc::ptr_eq(&engine, &tinyerr::active_engine().unwrap()));

    tinyerr::excepthook(&index_failure());
    assert_eq!(store.load().unwrap().message(), "index out of range for this list");

    let removed = tinyerr::deactivate().unwrap();
    assert!(std::sync::Arc::ptr_eq(&engine, &removed));
    assert!(!tinyerr::is_active());
    assert!(tinyerr::deactivate().is_none());
}

#[test]
fn default_render_chains_like_the_interpreter() {
    let raw = RawException::new("RuntimeError", "wrapped").with_cause(
        RawException::new("KeyError", "'a'").with_frames(vec![Frame::new("main.py", 4, "load").with_source("    return d['a']\n")]),
    );
    assert_eq!(
        tinyerr::default_render(&raw),
        "Traceback (most recent call last):\n  File \"main.py\", line 4, in load\n    return d['a']\nKeyError: 'a'\n\n\
         The above exception was the direct cause of the following exception:\n\n\
         RuntimeError: wrapped\n"
    );
}
