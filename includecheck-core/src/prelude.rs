//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use includecheck_core::prelude::*;
//! ```

// Core analysis types
pub use crate::error::{IncludeCheckError, IncludeCheckResult};
pub use crate::record::{FileRecord, IncludeTarget};
pub use crate::registry::Registry;
pub use crate::source::{FileId, SourceLoc, SourceMap, SourceSpan};

// Association resolution
pub use crate::associate::{resolve_associations, AssociatedSet};

// Usage classification
pub use crate::classify::{EntityRef, Node, UsageClassifier};

// Decision pass and diagnostics
pub use crate::diagnostic::{Diagnostic, DiagnosticCollection, DiagnosticKind, FixIt};
pub use crate::engine::DecisionEngine;

// Reference front-end
pub use crate::frontend::{TranslationUnit, TranslationUnitBuilder};

// Scanning
pub use crate::scan::gather_source_files;

// Configuration
pub use crate::config::{load_config, IncludeCheckConfig};

// Builder API
pub use crate::builder::{AnalysisResult, IncludeCheck};

// Fix functionality
#[cfg(feature = "fix")]
pub use crate::fix::{apply_fixits, apply_fixits_to_disk, FixResult};
