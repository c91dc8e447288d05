//! Decision pass: turning accumulated usage evidence into diagnostics.
//!
//! Runs once over the completed model, depth-first over association edges so
//! dependents are finalized before their dependency. Each record is pruned of
//! associations no full use ever exercised, then checked for unused direct
//! inclusions and for used-but-never-included defining files.

use tracing::{debug, trace};

use crate::diagnostic::{Diagnostic, DiagnosticConsumer, DiagnosticKind, FixIt};
use crate::registry::Registry;
use crate::source::{include_loc_in_main_file, FileId, SourceLoc, SourceMap};

/// Post-processes the association tree and emits diagnostics.
pub struct DecisionEngine<'a> {
    sm: &'a dyn SourceMap,
    ignored: &'a [String],
}

impl<'a> DecisionEngine<'a> {
    /// Create an engine over `sm`, suppressing diagnostics whose subject
    /// matches one of `ignored` (prefix `*`, suffix `*`, or substring).
    pub fn new(sm: &'a dyn SourceMap, ignored: &'a [String]) -> Self {
        Self { sm, ignored }
    }

    /// Run the decision pass from the main file's record.
    pub fn process(&self, registry: &mut Registry, consumer: &mut dyn DiagnosticConsumer) {
        let main = registry.main_file();
        self.process_record(registry, main, consumer);
    }

    fn process_record(
        &self,
        registry: &mut Registry,
        file: FileId,
        consumer: &mut dyn DiagnosticConsumer,
    ) {
        // Snapshot: associations are pruned below while this copy drives
        // both the recursion and the iteration.
        let associations: Vec<FileId> = match registry.record(file) {
            Some(rec) => rec.associations.iter().copied().collect(),
            None => return,
        };
        for assoc in &associations {
            self.process_record(registry, *assoc, consumer);
        }

        if registry.record(file).is_some_and(|r| r.processed) {
            return;
        }
        debug!(file = %self.sm.display_name(file), "processing record");

        // Prune associations never exercised by a full use; they carry no
        // weight in the transitivity check.
        for assoc in &associations {
            let exercised = registry
                .record(file)
                .is_some_and(|r| r.used_imports.contains_key(assoc));
            if !exercised {
                trace!(
                    file = %self.sm.display_name(file),
                    assoc = %self.sm.display_name(*assoc),
                    "pruning unexercised association"
                );
                if let Some(rec) = registry.record_mut(file) {
                    rec.associations.remove(assoc);
                }
            }
        }

        self.report_unused(registry, file, consumer);
        self.report_missing(registry, file, consumer);

        if let Some(rec) = registry.record_mut(file) {
            rec.processed = true;
        }
    }

    /// Flag every directive location with no matching usage evidence.
    fn report_unused(
        &self,
        registry: &Registry,
        file: FileId,
        consumer: &mut dyn DiagnosticConsumer,
    ) {
        let Some(rec) = registry.record(file) else {
            return;
        };
        for (target, locations) in &rec.includes {
            let Some(target_file) = target.as_file() else {
                continue; // module imports are never diagnosed
            };
            let subject = self.sm.display_name(target_file);
            if self.is_ignored(subject) {
                continue;
            }
            let used = rec.used_imports.get(&target_file);
            for &loc in locations {
                let line = self.sm.line_start(loc);
                if used.is_some_and(|set| set.contains(&line)) {
                    continue;
                }
                trace!(subject, at = %loc, "unused inclusion");
                consumer.report(Diagnostic {
                    kind: DiagnosticKind::UnusedInclusion,
                    subject: subject.to_string(),
                    anchor: loc,
                    fix: FixIt::Delete {
                        span: self.sm.line_span(loc),
                    },
                });
            }
        }
    }

    /// Flag every defining file that was used without a direct inclusion and
    /// is not covered transitively through an associated file.
    fn report_missing(
        &self,
        registry: &Registry,
        file: FileId,
        consumer: &mut dyn DiagnosticConsumer,
    ) {
        let Some(rec) = registry.record(file) else {
            return;
        };
        let candidates: Vec<(FileId, SourceLoc)> = rec
            .used_imports
            .iter()
            .filter(|(target, _)| !rec.includes_file(**target))
            // Earliest evidence location is the representative; the invalid
            // sentinel sorts last, so valid evidence wins when mixed.
            .filter_map(|(target, locs)| locs.iter().next().map(|l| (*target, *l)))
            .collect();

        for (target, representative) in candidates {
            let subject = self.sm.display_name(target);
            if self.is_ignored(subject) {
                continue;
            }
            if registry.imports_transitively(file, target) {
                trace!(subject, "missing inclusion covered transitively");
                continue;
            }
            if !representative.is_valid() {
                trace!(subject, "missing inclusion with invalid evidence suppressed");
                continue;
            }
            let anchor = self.insertion_point(representative);
            if !anchor.is_valid() {
                trace!(subject, "missing inclusion with unresolvable anchor suppressed");
                continue;
            }
            trace!(subject, at = %anchor, "missing inclusion");
            consumer.report(Diagnostic {
                kind: DiagnosticKind::MissingInclusion,
                subject: subject.to_string(),
                anchor,
                fix: FixIt::Insert {
                    at: anchor,
                    text: format!("#import \"{}\"\n", subject),
                },
            });
        }
    }

    /// Resolve the insertion line in the main file's inclusion chain for a
    /// piece of evidence. Evidence already at main-file level anchors on its
    /// own line.
    fn insertion_point(&self, evidence: SourceLoc) -> SourceLoc {
        if self.sm.owner_file(evidence) == Some(self.sm.main_file()) {
            return self.sm.line_start(evidence);
        }
        let at_main = include_loc_in_main_file(self.sm, evidence);
        if at_main.is_valid() {
            self.sm.line_start(at_main)
        } else {
            SourceLoc::INVALID
        }
    }

    fn is_ignored(&self, subject: &str) -> bool {
        for pattern in self.ignored {
            if let Some(prefix) = pattern.strip_suffix('*') {
                if subject.starts_with(prefix) {
                    return true;
                }
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                if subject.ends_with(suffix) {
                    return true;
                }
            } else if subject == pattern || subject.contains(pattern.as_str()) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::associate::{resolve_associations, AssociatedSet};
    use crate::classify::UsageClassifier;
    use crate::diagnostic::DiagnosticCollection;
    use crate::frontend::{TranslationUnit, TranslationUnitBuilder};

    fn populate(main: &str, files: &[(&str, &str)]) -> (Registry, TranslationUnit) {
        let mut builder = TranslationUnitBuilder::new();
        for (path, text) in files {
            builder = builder.add_source(*path, *text);
        }
        let tu = builder.build(main).unwrap();
        let mut registry = Registry::new(tu.main_file());
        for event in tu.pp_events() {
            registry.record_inclusion(&tu, event.at, event.target.clone());
        }
        resolve_associations(&mut registry, &tu);
        let associated = AssociatedSet::build(&registry);
        let classifier = UsageClassifier::new(&associated);
        for node in tu.nodes() {
            classifier.visit(&mut registry, &tu, &node);
        }
        (registry, tu)
    }

    fn run(main: &str, files: &[(&str, &str)]) -> (DiagnosticCollection, TranslationUnit) {
        let (mut registry, tu) = populate(main, files);
        let mut diags = DiagnosticCollection::new();
        DecisionEngine::new(&tu, &[]).process(&mut registry, &mut diags);
        (diags, tu)
    }

    #[test]
    fn test_idempotent_processing() {
        let (mut registry, tu) = populate(
            "Widget.m",
            &[("Widget.m", "#import \"Foo.h\"\n"), ("Foo.h", "")],
        );
        let mut diags = DiagnosticCollection::new();
        let engine = DecisionEngine::new(&tu, &[]);
        engine.process(&mut registry, &mut diags);
        engine.process(&mut registry, &mut diags);
        assert_eq!(diags.len(), 1, "second run is a no-op");
    }

    #[test]
    fn test_module_imports_never_diagnosed() {
        let (diags, _tu) = run("Widget.m", &[("Widget.m", "@import Foundation;\n")]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_ignore_patterns_suppress_subjects() {
        let (mut registry, tu) = populate(
            "Widget.m",
            &[("Widget.m", "#import \"Foo.h\"\n"), ("Foo.h", "")],
        );
        let ignored = vec!["Foo*".to_string()];
        let mut diags = DiagnosticCollection::new();
        DecisionEngine::new(&tu, &ignored).process(&mut registry, &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unused_fix_deletes_whole_line() {
        let (diags, tu) = run(
            "Widget.m",
            &[("Widget.m", "#import \"Foo.h\"\nint x;\n"), ("Foo.h", "")],
        );
        let diag = diags.iter().next().unwrap();
        match &diag.fix {
            FixIt::Delete { span } => {
                assert_eq!(span.start, SourceLoc::new(tu.main_file(), 0));
                assert_eq!(span.end.offset, "#import \"Foo.h\"\n".len() as u32);
            }
            other => panic!("expected delete fix, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_include_flags_uncredited_line_only() {
        // Foo.h is imported twice; the first entry holds the include site,
        // so only the second line is unused.
        let src = "#import \"Foo.h\"\n#import \"Foo.h\"\n\n@implementation Widget\n[Foo new]\n@end\n";
        let (diags, tu) = run(
            "Widget.m",
            &[("Widget.m", src), ("Foo.h", "@interface Foo\n@end\n")],
        );
        let unused: Vec<_> = diags.unused().collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(
            unused[0].anchor,
            SourceLoc::new(tu.main_file(), "#import \"Foo.h\"\n".len() as u32)
        );
        assert_eq!(diags.missing().count(), 0);
    }
}
