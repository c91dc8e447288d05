//! Per-file inclusion and usage state.
//!
//! One [`FileRecord`] exists per file seen in the translation unit. It is
//! owned by the [`Registry`](crate::registry::Registry) and accumulates three
//! kinds of evidence during the analysis:
//!
//! - every inclusion directive the file issues ([`FileRecord::includes`])
//! - every defining file a full use resolved to ([`FileRecord::used_imports`])
//! - every name mentioned only as a forward declaration
//!   ([`FileRecord::forward_uses`], observability only)
//!
//! All containers are ordered so the decision pass iterates deterministically.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::source::{FileId, SourceLoc};

/// The target of an inclusion directive.
///
/// Module imports (`@import Foundation;`) are recorded for completeness but
/// are never diagnosed: no usage evidence can attach to a module key, and the
/// decision pass only scans file-keyed entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncludeTarget {
    /// A resolved (or stubbed) file.
    File(FileId),
    /// A named module import.
    Module(String),
}

impl IncludeTarget {
    /// The file handle, if this target is a file.
    pub fn as_file(&self) -> Option<FileId> {
        match self {
            Self::File(f) => Some(*f),
            Self::Module(_) => None,
        }
    }
}

/// Accumulated inclusion and usage state for one file.
///
/// Lifecycle: `Unseen -> Populated (lexing/traversal) -> Processed (terminal)`.
/// Records only grow until the decision pass marks them processed; re-entry
/// into a processed record is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// The file this record describes.
    pub file: FileId,

    /// Every place this file issues an inclusion of a target, by the exact
    /// location of the inclusion directive.
    pub includes: BTreeMap<IncludeTarget, BTreeSet<SourceLoc>>,

    /// Evidence that a full use required a defining file's inclusion. The
    /// locations stored are line starts of the include directive responsible,
    /// not the reference sites.
    pub used_imports: BTreeMap<FileId, BTreeSet<SourceLoc>>,

    /// Names mentioned only as forward declarations, by reference site.
    /// Never consulted by the decision pass.
    pub forward_uses: BTreeMap<String, BTreeSet<SourceLoc>>,

    /// Files considered logically part of the same component. Edges hold
    /// file handles, not references: the registry is the sole owner of
    /// records and every edge is resolved through it.
    pub associations: BTreeSet<FileId>,

    /// Whether the decision pass has finalized this record.
    pub processed: bool,
}

impl FileRecord {
    /// Create an empty record for `file`.
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            includes: BTreeMap::new(),
            used_imports: BTreeMap::new(),
            forward_uses: BTreeMap::new(),
            associations: BTreeSet::new(),
            processed: false,
        }
    }

    /// Record an inclusion directive of `target` at `at`.
    pub fn record_include(&mut self, target: IncludeTarget, at: SourceLoc) {
        self.includes.entry(target).or_default().insert(at);
    }

    /// Record full-use evidence: `defining` was required, supplied by the
    /// include directive starting at `directive_line`.
    pub fn record_used_import(&mut self, defining: FileId, directive_line: SourceLoc) {
        self.used_imports
            .entry(defining)
            .or_default()
            .insert(directive_line);
    }

    /// Record a forward-declaration mention of `name` at `at`.
    pub fn record_forward_use(&mut self, name: &str, at: SourceLoc) {
        self.forward_uses
            .entry(name.to_string())
            .or_default()
            .insert(at);
    }

    /// Whether this file directly includes `target`.
    pub fn includes_file(&self, target: FileId) -> bool {
        self.includes.contains_key(&IncludeTarget::File(target))
    }

    /// The directive locations at which this file includes `target`.
    pub fn include_locations(&self, target: FileId) -> Option<&BTreeSet<SourceLoc>> {
        self.includes.get(&IncludeTarget::File(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_include_absorbs_duplicates() {
        let mut rec = FileRecord::new(FileId(0));
        let at = SourceLoc::new(FileId(0), 10);
        rec.record_include(IncludeTarget::File(FileId(1)), at);
        rec.record_include(IncludeTarget::File(FileId(1)), at);
        assert_eq!(rec.include_locations(FileId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_includes_file_ignores_modules() {
        let mut rec = FileRecord::new(FileId(0));
        rec.record_include(
            IncludeTarget::Module("Foundation".into()),
            SourceLoc::new(FileId(0), 0),
        );
        assert!(!rec.includes_file(FileId(1)));
        assert_eq!(rec.includes.len(), 1);
    }

    #[test]
    fn test_used_import_accumulates_locations() {
        let mut rec = FileRecord::new(FileId(0));
        rec.record_used_import(FileId(2), SourceLoc::new(FileId(0), 0));
        rec.record_used_import(FileId(2), SourceLoc::new(FileId(0), 40));
        assert_eq!(rec.used_imports[&FileId(2)].len(), 2);
        // BTreeSet keeps the earliest location first.
        assert_eq!(
            rec.used_imports[&FileId(2)].iter().next().copied(),
            Some(SourceLoc::new(FileId(0), 0))
        );
    }

    #[test]
    fn test_forward_use_keyed_by_name() {
        let mut rec = FileRecord::new(FileId(0));
        rec.record_forward_use("Widget", SourceLoc::new(FileId(0), 5));
        rec.record_forward_use("Widget", SourceLoc::new(FileId(0), 5));
        assert_eq!(rec.forward_uses["Widget"].len(), 1);
        assert!(rec.used_imports.is_empty(), "forward use is not full use");
    }
}
