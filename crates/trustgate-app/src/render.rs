//! Render use cases: Markdown and JSON from in-memory decisions.

use anyhow::Context;
use camino::Utf8Path;
use serde::Serialize;
use trustgate_types::Decision;

pub fn render_markdown(decision: &Decision) -> String {
    trustgate_render::render_markdown(decision)
}

pub fn render_summary(decision: &Decision) -> String {
    trustgate_render::render_summary(decision)
}

/// Pretty JSON with a trailing newline.
pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(value).context("serialize json")?;
    out.push('\n');
    Ok(out)
}

/// Write `text` to `path`, creating parent directories.
pub fn write_text(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("write {path}"))
}
