//! One-shot JSONL export of every transcript.
//!
//! Each line is `{"chat_id": <id>, "messages": [{"role", "content"}, ...]}`,
//! one line per transcript in registration order. The file is rewritten in
//! full on every export.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::conversation::{ChatId, Message, Registry};
use crate::error::AppError;

#[derive(Serialize)]
struct ExportRecord<'a> {
    chat_id: &'a ChatId,
    messages: &'a [Message],
}

/// Render the registry as JSONL, newline-terminated.
pub fn render(registry: &Registry) -> Result<String, AppError> {
    let mut out = String::new();
    for transcript in registry.all() {
        let record = ExportRecord {
            chat_id: transcript.chat_id(),
            messages: transcript.snapshot(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| AppError::Export(format!("serialise {}: {e}", transcript.chat_id())))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Overwrite `path` with the JSONL rendering of `registry`. Returns the number
/// of transcripts written.
pub fn export_all(registry: &Registry, path: &Path) -> Result<usize, AppError> {
    let data = render(registry)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Export(format!("cannot create {}: {e}", parent.display())))?;
    }
    fs::write(path, data)
        .map_err(|e| AppError::Export(format!("cannot write {}: {e}", path.display())))?;

    info!(path = %path.display(), conversations = registry.len(), "conversations exported");
    Ok(registry.len())
}
