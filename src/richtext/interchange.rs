// Interchange Format
// JSON save/load of the run sequence: {"elements": [{"text", "font"}], "cursor"?}
// Newlines inside text are stored as the two characters `\n`.

use super::runs::RunRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("saved cursor refers to run {index} but the document has {len} runs")]
    CursorOutOfRange { index: usize, len: usize },
}

/// Cursor stored alongside the runs, as a run index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCursor {
    pub index: usize,
    pub offset: usize,
}

/// A parsed document, ready to replace the current one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedDocument {
    pub records: Vec<RunRecord>,
    pub cursor: Option<SavedCursor>,
}

#[derive(Serialize, Deserialize)]
struct SavedDocument {
    elements: Vec<RunRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cursor: Option<SavedCursor>,
}

/// Escape newlines (and the escape character itself) for storage
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_text`]; unknown escapes are kept verbatim
pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Serialize runs, optionally with the cursor
pub fn save_runs(
    records: &[RunRecord],
    cursor: Option<SavedCursor>,
) -> Result<String, InterchangeError> {
    let document = SavedDocument {
        elements: records
            .iter()
            .map(|r| RunRecord::new(escape_text(&r.text), r.font.clone()))
            .collect(),
        cursor,
    };
    Ok(serde_json::to_string(&document)?)
}

/// Parse and validate saved data without touching any live document
pub fn load_runs(data: &str) -> Result<LoadedDocument, InterchangeError> {
    let document: SavedDocument = serde_json::from_str(data)?;
    let records: Vec<RunRecord> = document
        .elements
        .into_iter()
        .map(|r| RunRecord::new(unescape_text(&r.text), r.font))
        .collect();

    if let Some(cursor) = document.cursor {
        if cursor.index >= records.len() {
            return Err(InterchangeError::CursorOutOfRange {
                index: cursor.index,
                len: records.len(),
            });
        }
    }

    debug!(runs = records.len(), "parsed saved document");
    Ok(LoadedDocument {
        records,
        cursor: document.cursor,
    })
}
