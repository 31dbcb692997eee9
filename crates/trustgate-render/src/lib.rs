//! Rendering utilities for human-facing surfaces (Markdown reports, terminal summaries).
//!
//! Output never includes wall-clock timing, so rendering the same decision twice is
//! byte-identical.

#![forbid(unsafe_code)]

mod markdown;
mod summary;

pub use markdown::render_markdown;
pub use summary::render_summary;
