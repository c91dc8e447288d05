//! Registry of per-file records for one translation unit.
//!
//! The registry is the sole owner of every [`FileRecord`]; other components
//! hold file handles and resolve them through it. It is constructed fresh per
//! translation unit, populated during lexing and traversal, consumed once by
//! the decision pass, then discarded. No removal operation exists.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::record::{FileRecord, IncludeTarget};
use crate::source::{FileId, SourceLoc, SourceMap};

/// Owns all file records for the current translation unit.
#[derive(Debug)]
pub struct Registry {
    main: FileId,
    records: HashMap<FileId, FileRecord>,
}

impl Registry {
    /// Create a registry for a unit whose main file is `main`. The main
    /// file's record is created eagerly.
    pub fn new(main: FileId) -> Self {
        let mut records = HashMap::new();
        records.insert(main, FileRecord::new(main));
        Self { main, records }
    }

    /// The translation unit's main file.
    pub fn main_file(&self) -> FileId {
        self.main
    }

    /// The main file's record.
    pub fn main_record(&self) -> &FileRecord {
        &self.records[&self.main]
    }

    /// Number of files seen so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no file has been seen. Never true in practice: the main
    /// file's record exists from construction.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the record for `file`.
    pub fn record(&self, file: FileId) -> Option<&FileRecord> {
        self.records.get(&file)
    }

    /// Mutable lookup of the record for `file`.
    pub fn record_mut(&mut self, file: FileId) -> Option<&mut FileRecord> {
        self.records.get_mut(&file)
    }

    /// The record for `file`, created empty on first sight.
    pub fn get_or_create(&mut self, file: FileId) -> &mut FileRecord {
        self.records
            .entry(file)
            .or_insert_with(|| FileRecord::new(file))
    }

    /// Iterate over all records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// The record for whichever file textually contains `loc`, lazily
    /// created. `None` for invalid or synthetic locations.
    pub fn owner_of(&mut self, sm: &dyn SourceMap, loc: SourceLoc) -> Option<&mut FileRecord> {
        let file = sm.owner_file(loc)?;
        Some(self.get_or_create(file))
    }

    /// Handle one inclusion event: resolve the including file from `at` and
    /// append `at` to its record's direct includes of `target`. A file
    /// target also gets a record of its own on first sight, so the registry
    /// accounts for every file that entered the unit, leaf headers included.
    ///
    /// Called once per inclusion directive, in lexical order, as the unit is
    /// preprocessed. Events at synthetic locations are dropped.
    pub fn record_inclusion(&mut self, sm: &dyn SourceMap, at: SourceLoc, target: IncludeTarget) {
        let Some(owner) = sm.owner_file(at) else {
            trace!(at = %at, ?target, "inclusion at synthetic location dropped");
            return;
        };
        trace!(at = %at, ?target, "inclusion recorded");
        let included = match &target {
            IncludeTarget::File(file) if file.is_valid() => Some(*file),
            _ => None,
        };
        self.get_or_create(owner).record_include(target, at);
        if let Some(file) = included {
            self.get_or_create(file);
        }
    }

    /// Whether `target` is reachable for `from` through an associated file:
    /// some association of `from` that `from` also directly includes either
    /// directly includes `target` or itself imports it transitively.
    ///
    /// The walk runs depth-first over the (already pruned) association set
    /// with a visited guard, since association edges are derived data and a
    /// malformed project could otherwise induce unbounded recursion.
    pub fn imports_transitively(&self, from: FileId, target: FileId) -> bool {
        let mut visited = HashSet::new();
        self.imports_transitively_guarded(from, target, &mut visited)
    }

    fn imports_transitively_guarded(
        &self,
        from: FileId,
        target: FileId,
        visited: &mut HashSet<FileId>,
    ) -> bool {
        let Some(rec) = self.records.get(&from) else {
            return false;
        };
        for &assoc in &rec.associations {
            if !visited.insert(assoc) {
                continue;
            }
            if !rec.includes_file(assoc) {
                continue;
            }
            let Some(assoc_rec) = self.records.get(&assoc) else {
                continue;
            };
            if assoc_rec.includes_file(target)
                || self.imports_transitively_guarded(assoc, target, visited)
            {
                return true;
            }
        }
        false
    }
}
