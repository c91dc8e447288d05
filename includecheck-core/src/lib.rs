//! includecheck-core: unused and missing include analysis for Objective-C
//! translation units
//!
//! This library analyzes one translation unit at a time and determines, for
//! each file that participates in it, which direct `#import`/`#include`
//! directives are never exercised by a use and which externally defined
//! types are used without a direct inclusion.
//!
//! # Features
//!
//! - **Unused-include detection**: flag directives no full use ever required
//! - **Missing-include detection**: flag defining files used without a
//!   direct inclusion, with transitive coverage through associated files
//! - **Association grouping**: an implementation file, its interface header,
//!   and `+Category` variants are analyzed as one logical component
//! - **Full vs forward uses**: forward declarations are tracked but never
//!   trigger missing-include diagnostics
//! - **Fix-its**: machine-applicable deletions and insertions per finding
//! - **Reference front-end**: in-memory preprocessing and node traversal for
//!   a small Objective-C subset, usable from text or from disk
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use includecheck_core::prelude::*;
//!
//! let result = IncludeCheck::from_file("Sources/Widget.m")?.analyze();
//!
//! for diag in &result.diagnostics {
//!     println!("{}", diag); // 'Foo.h' is unused
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`source`]: file identity, locations, and the `SourceMap` seam
//! - [`record`]: per-file inclusion and usage state
//! - [`registry`]: per-unit owner of all file records
//! - [`associate`]: association graph construction
//! - [`classify`]: full-use / forward-use classification
//! - [`engine`]: the decision pass emitting diagnostics
//! - [`frontend`]: reference Objective-C front-end
//! - [`fix`]: fix-it application
//! - [`builder`]: fluent builder API
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `fix` (default): Enable fix-it application

// Core modules (always available)
pub mod associate;
pub mod builder;
pub mod classify;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod logging;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod report;
pub mod scan;
pub mod source;

// Feature-gated modules
#[cfg(feature = "fix")]
pub mod fix;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{IncludeCheckError, IncludeCheckResult, IoResultExt};

// Builder API
pub use builder::{AnalysisResult, IncludeCheck};

// Source model
pub use source::{include_loc_in_main_file, FileId, Position, SourceLoc, SourceMap, SourceSpan};

// Usage-tracking model
pub use record::{FileRecord, IncludeTarget};
pub use registry::Registry;

// Association resolution
pub use associate::{belongs_together, resolve_associations, AssociatedSet};

// Usage classification
pub use classify::{responsible_directive, ClassifiedRef, EntityRef, Node, UsageClassifier};

// Decision pass
pub use engine::DecisionEngine;

// Diagnostics
pub use diagnostic::{
    Diagnostic, DiagnosticCollection, DiagnosticConsumer, DiagnosticKind, FixIt,
};

// Reference front-end
pub use frontend::{PpEvent, TranslationUnit, TranslationUnitBuilder};

// Configuration
pub use config::{load_config, IncludeCheckConfig, OutputConfig};

// Logging
pub use logging::init_structured_logging;

// Reporting
pub use report::{diagnostics_json, print_json, print_plain};

// File scanning
pub use scan::{gather_source_files, SourceTree};

// Feature-gated re-exports
#[cfg(feature = "fix")]
pub use fix::{apply_fixits, apply_fixits_to_disk, FixResult};
