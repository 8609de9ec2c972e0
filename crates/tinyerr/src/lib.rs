#![doc = include_str!("../../../README.md")]

mod anchor;
mod classify;
mod config;
mod exc_type;
mod filter;
mod frame;
mod hook;
mod linecache;
mod offset;
mod raw;
mod store;
mod textwrap;
mod trace;

pub use crate::{
    anchor::{Anchor, PRIMARY_CHAR, SECONDARY_CHAR},
    classify::{Classification, Groups, GroupsIter, Renderer, Rule, RuleSet, user_type_name},
    config::{
        Config, ConfigError, DEFAULT_CODE_INDENT, DEFAULT_FRAME_TEMPLATE, FrameTemplate, MissingBoundary,
        TemplateField,
    },
    exc_type::{ExcCategory, ExcType},
    filter::{filter_frames, trim_to_boundary},
    frame::{Frame, FrameFormatter},
    hook::{Engine, activate, activate_engine, active_engine, deactivate, default_render, excepthook, is_active},
    linecache::{LineCache, LineSource, SourceMap},
    offset::{byte_offset, char_offset},
    raw::{RawException, SyntaxLocation},
    store::{LOAD_ERROR_MESSAGE, NO_TRACE_MESSAGE, StoreError, TraceStore},
    trace::{CAUSE_CONNECTIVE, CONTEXT_CONNECTIVE, RenderedError},
};
