//! Source identity and location primitives, plus the `SourceMap` seam to the
//! host front-end.
//!
//! The analysis core never reads source text itself: every question about a
//! location (owning file, include site, line geometry, printable position)
//! goes through the [`SourceMap`] service. The driver owns the concrete map
//! and passes it by reference to each component that needs it — no component
//! stores the reference, so the map may keep growing while records are being
//! populated.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle to a physical source file within one translation unit.
///
/// Assigned by the front-end; two handles are equal iff they denote the same
/// file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Sentinel for locations that belong to no real file.
    pub const INVALID: FileId = FileId(u32::MAX);

    /// Check that this handle denotes a real file.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "file_{}", self.0)
        } else {
            write!(f, "file_<invalid>")
        }
    }
}

/// A position within the translation unit's source stream.
///
/// Locations are totally ordered by (file, byte offset), so "earliest" is
/// well defined wherever a single representative must be picked from a set.
/// The invalid sentinel sorts after every valid location, which keeps it out
/// of the way when the minimum of a mixed set is taken.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourceLoc {
    pub file: FileId,
    pub offset: u32,
}

impl SourceLoc {
    /// Sentinel for synthesized or unresolvable locations.
    pub const INVALID: SourceLoc = SourceLoc {
        file: FileId::INVALID,
        offset: u32::MAX,
    };

    /// Create a location at `offset` bytes into `file`.
    pub fn new(file: FileId, offset: u32) -> Self {
        Self { file, offset }
    }

    /// Check that this location lies in a real file.
    pub fn is_valid(self) -> bool {
        self.file.is_valid()
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}@{}", self.file, self.offset)
        } else {
            write!(f, "<invalid loc>")
        }
    }
}

/// Half-open byte range `[start, end)` within a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLoc,
    pub end: SourceLoc,
}

impl SourceSpan {
    /// Create a span.
    ///
    /// # Panics
    /// Panics if the endpoints lie in different files or `start > end`.
    pub fn new(start: SourceLoc, end: SourceLoc) -> Self {
        assert_eq!(start.file, end.file, "span endpoints must share a file");
        assert!(start.offset <= end.offset, "span start must be <= end");
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Check whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A resolved 1-based line/column position, for rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

/// Location-resolution and canonical-path services provided by the host
/// front-end's source manager.
///
/// Implementations must answer every query without failing: unknown or
/// synthetic inputs map to `None` / the invalid sentinel, never to a panic.
pub trait SourceMap {
    /// The translation unit's main file.
    fn main_file(&self) -> FileId;

    /// The file that lexically contains `loc`, or `None` for invalid or
    /// synthesized locations.
    fn owner_file(&self, loc: SourceLoc) -> Option<FileId>;

    /// The location of the inclusion directive that first brought `file`
    /// into the translation unit. `None` for the main file (it was never
    /// included) and for unknown handles.
    fn include_site(&self, file: FileId) -> Option<SourceLoc>;

    /// The location of the first byte of the line containing `loc`.
    /// Invalid input maps to the invalid location.
    fn line_start(&self, loc: SourceLoc) -> SourceLoc;

    /// The full span of the line containing `loc`, including its line
    /// terminator. Invalid input maps to an empty span at the invalid
    /// location.
    fn line_span(&self, loc: SourceLoc) -> SourceSpan;

    /// The text of the line containing `loc`, including its line terminator
    /// when present.
    fn line_text(&self, loc: SourceLoc) -> Option<String>;

    /// Canonical path of `file` (the identity key the front-end resolved).
    fn canonical_path(&self, file: FileId) -> &str;

    /// Basename of `file`, used as the human-readable diagnostic subject.
    fn display_name(&self, file: FileId) -> &str;

    /// Basename with the extension and any `+variant` suffix stripped; the
    /// component name used for association matching (`Widget.m`,
    /// `Widget.h` and `Widget+Private.h` all yield `Widget`).
    fn component_stem(&self, file: FileId) -> &str;

    /// 1-based line/column of `loc`, or `None` when it cannot be resolved.
    fn position(&self, loc: SourceLoc) -> Option<Position>;
}

/// Walk the inclusion chain of `loc`'s file upward and return the inclusion
/// location at main-file level, i.e. the directive in the main file through
/// which `loc` is (transitively) reachable.
///
/// Returns [`SourceLoc::INVALID`] when `loc` is invalid, already lies in the
/// main file, or the chain is broken. Include chains cannot cycle in a
/// well-formed unit, but a visited guard bounds the walk anyway since the
/// chain is front-end-supplied data.
pub fn include_loc_in_main_file(sm: &dyn SourceMap, loc: SourceLoc) -> SourceLoc {
    let main = sm.main_file();
    let mut visited: HashSet<FileId> = HashSet::new();
    let mut cursor = loc;
    let mut at_main_level = SourceLoc::INVALID;

    while let Some(owner) = sm.owner_file(cursor) {
        if owner == main {
            return at_main_level;
        }
        if !visited.insert(owner) {
            return SourceLoc::INVALID;
        }
        match sm.include_site(owner) {
            Some(site) => {
                at_main_level = site;
                cursor = site;
            }
            None => return SourceLoc::INVALID,
        }
    }

    SourceLoc::INVALID
}
