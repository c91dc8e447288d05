//! Fix-it application: deleting unused directives and inserting missing
//! ones.
//!
//! Never panics: malformed edits are skipped and counted, I/O errors are
//! reported per file, and a failing file does not abort the batch. Edits
//! within one file are applied bottom-up (descending start offset) so
//! earlier offsets stay valid; overlapping edits after the first are
//! skipped.

use std::collections::BTreeMap;
use std::fs;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, FixIt};
use crate::frontend::TranslationUnit;
use crate::source::{FileId, SourceMap};

/// Result of a fix application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixResult {
    /// Edits applied to text.
    pub edits_applied: usize,
    /// Edits skipped (overlap or out-of-bounds).
    pub edits_skipped: usize,
    /// Files written back to disk (empty for in-memory / dry-run use).
    pub files_rewritten: Vec<String>,
    /// Per-file I/O errors, as messages.
    pub errors: Vec<String>,
}

#[derive(Debug)]
struct Edit {
    start: u32,
    end: u32,
    replacement: String,
}

fn edits_by_file(diagnostics: &[Diagnostic]) -> BTreeMap<FileId, Vec<Edit>> {
    let mut by_file: BTreeMap<FileId, Vec<Edit>> = BTreeMap::new();
    for diag in diagnostics {
        let (file, edit) = match &diag.fix {
            FixIt::Delete { span } => (
                span.start.file,
                Edit {
                    start: span.start.offset,
                    end: span.end.offset,
                    replacement: String::new(),
                },
            ),
            FixIt::Insert { at, text } => (
                at.file,
                Edit {
                    start: at.offset,
                    end: at.offset,
                    replacement: text.clone(),
                },
            ),
        };
        if file.is_valid() {
            by_file.entry(file).or_default().push(edit);
        }
    }
    for edits in by_file.values_mut() {
        // Descending start: apply bottom-up.
        edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    }
    by_file
}

fn apply_edits(text: &mut String, edits: &[Edit], result: &mut FixResult) {
    let mut lowest_applied_start = u32::MAX;
    for edit in edits {
        let (start, end) = (edit.start as usize, edit.end as usize);
        if end > text.len()
            || edit.end > lowest_applied_start
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            warn!(start, end, "fix-it skipped (overlap or out of bounds)");
            result.edits_skipped += 1;
            continue;
        }
        text.replace_range(start..end, &edit.replacement);
        lowest_applied_start = edit.start;
        result.edits_applied += 1;
    }
}

/// Apply a batch of fix-its to in-memory sources. Files not present in
/// `sources` are skipped with their edits counted as skipped.
pub fn apply_fixits(sources: &mut BTreeMap<FileId, String>, diagnostics: &[Diagnostic]) -> FixResult {
    let mut result = FixResult::default();
    for (file, edits) in edits_by_file(diagnostics) {
        match sources.get_mut(&file) {
            Some(text) => apply_edits(text, &edits, &mut result),
            None => result.edits_skipped += edits.len(),
        }
    }
    result
}

/// Apply fix-its to the real files behind a translation unit.
///
/// In dry-run mode nothing is written; each planned rewrite is printed
/// instead.
pub fn apply_fixits_to_disk(
    unit: &TranslationUnit,
    diagnostics: &[Diagnostic],
    dry_run: bool,
) -> FixResult {
    let mut result = FixResult::default();
    for (file, edits) in edits_by_file(diagnostics) {
        let path = unit.canonical_path(file);
        let Some(original) = unit.text(file) else {
            result.edits_skipped += edits.len();
            continue;
        };
        let mut text = original.to_string();
        let applied_before = result.edits_applied;
        apply_edits(&mut text, &edits, &mut result);
        if result.edits_applied == applied_before {
            continue;
        }
        if dry_run {
            println!(
                "[DRY-RUN] Would rewrite {} ({} edit(s))",
                path,
                result.edits_applied - applied_before
            );
            continue;
        }
        match fs::write(path, &text) {
            Ok(()) => {
                debug!(path, "fixes written");
                result.files_rewritten.push(path.to_string());
            }
            Err(err) => {
                result.errors.push(format!("{}: {}", path, err));
            }
        }
    }
    result
}
