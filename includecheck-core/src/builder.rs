//! Builder pattern API for include analysis.
//!
//! Provides a fluent interface for configuring and running the analysis of
//! one translation unit:
//!
//! ```rust,ignore
//! use includecheck_core::prelude::*;
//!
//! let result = IncludeCheck::from_file("Sources/Widget.m")?
//!     .ignore_patterns(["*Generated.h"])
//!     .analyze();
//!
//! for diag in &result.diagnostics {
//!     println!("{}", diag);
//! }
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::associate::{resolve_associations, AssociatedSet};
use crate::classify::UsageClassifier;
use crate::config::IncludeCheckConfig;
use crate::diagnostic::{Diagnostic, DiagnosticCollection, DiagnosticKind};
use crate::engine::DecisionEngine;
use crate::error::IncludeCheckResult;
use crate::frontend::TranslationUnit;
use crate::registry::Registry;
use crate::source::SourceMap;

/// Configured analysis of one translation unit.
pub struct IncludeCheck {
    unit: TranslationUnit,
    ignore_patterns: Vec<String>,
}

impl IncludeCheck {
    /// Analyze an already-built translation unit.
    pub fn new(unit: TranslationUnit) -> Self {
        Self {
            unit,
            ignore_patterns: Vec::new(),
        }
    }

    /// Read and preprocess `path` from disk, resolving includes against the
    /// file's own directory.
    pub fn from_file(path: impl AsRef<Path>) -> IncludeCheckResult<Self> {
        let path = path.as_ref();
        let search: Vec<PathBuf> = path.parent().map(Path::to_path_buf).into_iter().collect();
        Self::from_file_with_search(path, &search)
    }

    /// Read and preprocess `path` from disk with explicit include search
    /// directories.
    pub fn from_file_with_search(
        path: impl AsRef<Path>,
        search_dirs: &[PathBuf],
    ) -> IncludeCheckResult<Self> {
        let unit = TranslationUnit::from_file(path, search_dirs)?;
        Ok(Self::new(unit))
    }

    /// Add subject patterns to suppress (prefix `*`, suffix `*`, or
    /// substring).
    pub fn ignore_patterns(
        mut self,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.ignore_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Merge ignore patterns from a loaded configuration.
    pub fn with_config(mut self, config: &IncludeCheckConfig) -> Self {
        if let Some(ignore) = &config.ignore {
            self.ignore_patterns.extend(ignore.iter().cloned());
        }
        self
    }

    /// The underlying translation unit (for rendering and fix application).
    pub fn unit(&self) -> &TranslationUnit {
        &self.unit
    }

    /// Run the sequential analysis pipeline: replay inclusion events into a
    /// fresh registry, resolve associations, classify every node, then run
    /// the decision pass from the main record.
    pub fn analyze(&self) -> AnalysisResult {
        let unit = &self.unit;

        // 1. Inclusion events, in lexical order
        let mut registry = Registry::new(unit.main_file());
        for event in unit.pp_events() {
            registry.record_inclusion(unit, event.at, event.target.clone());
        }

        // 2. Association groups, main file outward
        resolve_associations(&mut registry, unit);
        let associated = AssociatedSet::build(&registry);

        // 3. Usage classification over the whole traversal
        let classifier = UsageClassifier::new(&associated);
        for node in unit.nodes() {
            classifier.visit(&mut registry, unit, &node);
        }

        // 4. Decision pass
        let mut collection = DiagnosticCollection::new();
        DecisionEngine::new(unit, &self.ignore_patterns).process(&mut registry, &mut collection);

        debug!(
            files = registry.len(),
            associated = associated.len(),
            diagnostics = collection.len(),
            "analysis finished"
        );

        AnalysisResult {
            diagnostics: collection.into_vec(),
            files_seen: registry.len(),
            associated_files: associated.len(),
        }
    }
}

/// Result of analyzing one translation unit.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Every detected problem, in decision-pass order.
    pub diagnostics: Vec<Diagnostic>,

    /// Number of files seen in the unit.
    pub files_seen: usize,

    /// Size of the associated closure (main file included).
    pub associated_files: usize,
}

impl AnalysisResult {
    /// Check if any include problem was found.
    pub fn has_findings(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Number of unused-inclusion findings.
    pub fn unused_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnusedInclusion)
            .count()
    }

    /// Number of missing-inclusion findings.
    pub fn missing_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MissingInclusion)
            .count()
    }
}
