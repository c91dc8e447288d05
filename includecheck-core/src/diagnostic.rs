//! Diagnostics and fix-its emitted by the decision pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::{SourceLoc, SourceSpan};

/// What kind of include problem was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A direct inclusion no full use ever required.
    UnusedInclusion,
    /// A file whose definitions are used without a direct inclusion.
    MissingInclusion,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnusedInclusion => write!(f, "unused"),
            Self::MissingInclusion => write!(f, "missing"),
        }
    }
}

/// A machine-applicable source edit attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixIt {
    /// Delete the character range spanning a source line.
    Delete { span: SourceSpan },
    /// Insert `text` at a location.
    Insert { at: SourceLoc, text: String },
}

/// One detected include problem, reported once by the decision pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Basename of the target file, the human-readable subject.
    pub subject: String,
    /// Where the warning is anchored: the offending directive line for an
    /// unused inclusion, the computed insertion line for a missing one.
    pub anchor: SourceLoc,
    pub fix: FixIt,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is {}", self.subject, self.kind)
    }
}

/// Renderer seam: the decision engine reports each problem exactly once.
pub trait DiagnosticConsumer {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Vec-backed consumer, the default collection used by the driver.
#[derive(Debug, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics flagging unused inclusions.
    pub fn unused(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnusedInclusion)
    }

    /// Diagnostics flagging missing inclusions.
    pub fn missing(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MissingInclusion)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticConsumer for DiagnosticCollection {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileId;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            kind: DiagnosticKind::UnusedInclusion,
            subject: "Foo.h".into(),
            anchor: SourceLoc::new(FileId(0), 0),
            fix: FixIt::Insert {
                at: SourceLoc::new(FileId(0), 0),
                text: String::new(),
            },
        };
        assert_eq!(d.to_string(), "'Foo.h' is unused");
    }

    #[test]
    fn test_collection_partitions_by_kind() {
        let mut coll = DiagnosticCollection::new();
        for kind in [DiagnosticKind::UnusedInclusion, DiagnosticKind::MissingInclusion] {
            coll.report(Diagnostic {
                kind,
                subject: "X.h".into(),
                anchor: SourceLoc::new(FileId(0), 0),
                fix: FixIt::Insert {
                    at: SourceLoc::new(FileId(0), 0),
                    text: "#import \"X.h\"\n".into(),
                },
            });
        }
        assert_eq!(coll.len(), 2);
        assert_eq!(coll.unused().count(), 1);
        assert_eq!(coll.missing().count(), 1);
    }
}
