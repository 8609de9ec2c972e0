//! Removal of uninformative frames from a stack.
//!
//! Two passes, applied lazily each time an error's frames are requested:
//! 1. frames whose statement is a bare `raise` are dropped when `suppress_raise` is set,
//! 2. with a boundary file configured, every frame up to and including the first frame in that
//!    file is dropped, so only frames strictly inside the boundary remain. This hides the frames
//!    of a runner that executes user code.

use std::path::Path;

use crate::{
    config::MissingBoundary,
    frame::{Frame, FrameFormatter, resolve_path},
};

/// Returns the frames of `stack` (oldest call first) that should be displayed.
#[must_use]
pub fn filter_frames<'f>(stack: &'f [Frame], formatter: &FrameFormatter<'_>) -> Vec<&'f Frame> {
    let config = formatter.config();
    let frames: Vec<&Frame> = if config.suppress_raise {
        stack.iter().filter(|frame| !formatter.is_pure_raise(frame)).collect()
    } else {
        stack.iter().collect()
    };

    match &config.boundary {
        Some(boundary) => trim_to_boundary(frames, boundary, config.missing_boundary),
        None => frames,
    }
}

/// Keeps only the frames after the first frame located in `boundary`.
#[must_use]
pub fn trim_to_boundary<'f>(frames: Vec<&'f Frame>, boundary: &Path, missing: MissingBoundary) -> Vec<&'f Frame> {
    let boundary = resolve_path(boundary);
    let position = frames
        .iter()
        .position(|frame| resolve_path(Path::new(&frame.file_path)) == boundary);
    match (position, missing) {
        (Some(index), _) => frames[index + 1..].to_vec(),
        (None, MissingBoundary::ShowAll) => frames,
        (None, MissingBoundary::HideAll) => {
            tracing::debug!(boundary = %boundary.display(), "boundary file not in stack, hiding all frames");
            Vec::new()
        }
    }
}
