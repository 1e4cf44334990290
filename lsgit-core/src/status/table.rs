//! Status table construction from raw probe output

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use unicode_width::UnicodeWidthStr;

use super::record::{normalize_path, path_key, DirectoryStatusRecord, Field};
use crate::error::PipelineError;

/// Status records of one probe, keyed by normalized directory path
///
/// Built once per refresh and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    records: HashMap<String, DirectoryStatusRecord>,
}

impl StatusTable {
    /// Look up the record for a directory; the path is normalized first
    pub fn get(&self, path: &str) -> Option<&DirectoryStatusRecord> {
        self.records.get(&normalize_path(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys of the table, in no particular order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectoryStatusRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Widest display width of each field across a [`StatusTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldWidths {
    pub branch: usize,
    pub remote: usize,
    pub fast_forward: usize,
}

impl FieldWidths {
    pub fn get(&self, field: Field) -> usize {
        match field {
            Field::Branch => self.branch,
            Field::Remote => self.remote,
            Field::FastForward => self.fast_forward,
        }
    }

    fn widen(&mut self, record: &DirectoryStatusRecord) {
        for field in Field::ALL {
            let width = record.field(field).width();
            let slot = match field {
                Field::Branch => &mut self.branch,
                Field::Remote => &mut self.remote,
                Field::FastForward => &mut self.fast_forward,
            };
            *slot = (*slot).max(width);
        }
    }
}

/// Parse probe output into a table and its field widths
///
/// The input is a whitespace-separated stream of JSON objects. Unknown fields
/// are ignored and missing ones default to empty; a later record for the same
/// path replaces an earlier one. Records without a path are dropped.
pub fn parse_records(raw: &str) -> Result<(StatusTable, FieldWidths), PipelineError> {
    collect(raw, None)
}

/// [`parse_records`] for output whose paths are relative to `root`
///
/// Relative paths are joined onto `root` so the keys match the paths the
/// listing shows, even when `root` goes through a symlink. Absolute paths are
/// kept as they are.
pub fn parse_records_in(
    raw: &str,
    root: &Path,
) -> Result<(StatusTable, FieldWidths), PipelineError> {
    collect(raw, Some(root))
}

fn collect(raw: &str, root: Option<&Path>) -> Result<(StatusTable, FieldWidths), PipelineError> {
    let mut records = HashMap::new();

    for item in serde_json::Deserializer::from_str(raw).into_iter::<DirectoryStatusRecord>() {
        let mut record = item.map_err(|e| PipelineError::Parse {
            raw_text: raw.to_string(),
            reason: e.to_string(),
        })?;

        if record.path.trim().is_empty() {
            tracing::debug!(?record, "Skipping status record without a path");
            continue;
        }

        record.path = match root {
            Some(root) => path_key(&root.join(&record.path)),
            None => normalize_path(&record.path),
        };
        records.insert(record.path.clone(), record);
    }

    // Widths are taken after deduplication so replaced records do not count.
    let mut widths = FieldWidths::default();
    for record in records.values() {
        widths.widen(record);
    }

    Ok((StatusTable { records }, widths))
}

/// Build a status table off the async runtime's worker threads
///
/// Record paths are resolved against `root`, the directory that was probed.
pub async fn build(
    raw: String,
    root: PathBuf,
) -> Result<(StatusTable, FieldWidths), PipelineError> {
    let len = raw.len();
    tracing::debug!(bytes = len, root = %root.display(), "Building status table");

    // Keep a copy so a panicked worker can still report the input.
    let raw_for_error = raw.clone();
    match tokio::task::spawn_blocking(move || parse_records_in(&raw, &root)).await {
        Ok(result) => result,
        Err(e) => Err(PipelineError::Parse {
            raw_text: raw_for_error,
            reason: format!("parser task failed: {}", e),
        }),
    }
}
