//! Association resolution: grouping files into logical components.
//!
//! Two files belong together when their component stems match (canonical
//! basename with the extension and any `+variant` suffix stripped), so
//! `Widget.m`, `Widget.h` and `Widget+Private.h` are one component. The
//! relation is matched by naming but built along actual inclusion: a file
//! only associates a name-matched file it directly includes.
//!
//! The closure rooted at the main file is the associated set, the only part
//! of the translation unit the usage classifier inspects.

use std::collections::{HashSet, VecDeque};

use petgraph::graphmap::DiGraphMap;
use tracing::{debug, trace};

use crate::registry::Registry;
use crate::source::{FileId, SourceMap};

/// Whether `a` and `b` are the same logical component by naming.
///
/// Files with an empty stem (stub identities for unresolvable includes)
/// never match anything.
pub fn belongs_together(sm: &dyn SourceMap, a: FileId, b: FileId) -> bool {
    if a == b {
        return false;
    }
    let stem_a = sm.component_stem(a);
    !stem_a.is_empty() && stem_a == sm.component_stem(b)
}

/// Build association edges outward from the main file.
///
/// Depth-first walk over direct-inclusion edges: every name-matched target
/// is associated and becomes a new root. A visited set tolerates include
/// cycles; duplicate edges are absorbed by the association set.
pub fn resolve_associations(registry: &mut Registry, sm: &dyn SourceMap) {
    let main = registry.main_file();
    let mut visited = HashSet::new();
    resolve_from(registry, sm, main, &mut visited);
    debug!(
        files = registry.len(),
        associations = registry.main_record().associations.len(),
        "association resolution finished"
    );
}

fn resolve_from(
    registry: &mut Registry,
    sm: &dyn SourceMap,
    root: FileId,
    visited: &mut HashSet<FileId>,
) {
    if !visited.insert(root) {
        return;
    }
    let targets: Vec<FileId> = match registry.record(root) {
        Some(rec) => rec.includes.keys().filter_map(|t| t.as_file()).collect(),
        None => return,
    };
    for target in targets {
        if belongs_together(sm, root, target) {
            trace!(
                root = %sm.display_name(root),
                target = %sm.display_name(target),
                "associated"
            );
            registry.get_or_create(root).associations.insert(target);
            // Ensure the associated file has a record even if it issues no
            // inclusions of its own, so the decision pass can visit it.
            registry.get_or_create(target);
            resolve_from(registry, sm, target, visited);
        }
    }
}

/// The association closure rooted at the main file, materialized for O(1)
/// containment checks by the usage classifier.
#[derive(Debug)]
pub struct AssociatedSet {
    files: HashSet<FileId>,
}

impl AssociatedSet {
    /// Collect every file reachable from the main file over association
    /// edges. Edges live in the registry's records; a graph is rebuilt here
    /// so the traversal works on a stable snapshot.
    pub fn build(registry: &Registry) -> Self {
        let main = registry.main_file();
        let mut graph: DiGraphMap<FileId, ()> = DiGraphMap::new();
        graph.add_node(main);
        for rec in registry.records() {
            graph.add_node(rec.file);
            for &assoc in &rec.associations {
                graph.add_edge(rec.file, assoc, ());
            }
        }

        let mut files = HashSet::new();
        let mut queue = VecDeque::new();
        files.insert(main);
        queue.push_back(main);
        while let Some(node) = queue.pop_front() {
            for next in graph.neighbors(node) {
                if files.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        Self { files }
    }

    /// Whether `file` belongs to the associated closure.
    pub fn contains(&self, file: FileId) -> bool {
        self.files.contains(&file)
    }

    /// Number of files in the closure (main file included).
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the closure is empty. Never true: the main file is always a
    /// member.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over the member files, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IncludeTarget;
    use crate::source::{Position, SourceLoc, SourceSpan};

    /// Map with fixed stems per file, locations owned by their handle.
    struct StemMap {
        stems: Vec<&'static str>,
    }

    impl SourceMap for StemMap {
        fn main_file(&self) -> FileId {
            FileId(0)
        }
        fn owner_file(&self, loc: SourceLoc) -> Option<FileId> {
            loc.is_valid().then_some(loc.file)
        }
        fn include_site(&self, _file: FileId) -> Option<SourceLoc> {
            None
        }
        fn line_start(&self, loc: SourceLoc) -> SourceLoc {
            loc
        }
        fn line_span(&self, loc: SourceLoc) -> SourceSpan {
            SourceSpan { start: loc, end: loc }
        }
        fn line_text(&self, _loc: SourceLoc) -> Option<String> {
            None
        }
        fn canonical_path(&self, _file: FileId) -> &str {
            ""
        }
        fn display_name(&self, file: FileId) -> &str {
            self.stems.get(file.0 as usize).copied().unwrap_or("")
        }
        fn component_stem(&self, file: FileId) -> &str {
            self.stems.get(file.0 as usize).copied().unwrap_or("")
        }
        fn position(&self, _loc: SourceLoc) -> Option<Position> {
            None
        }
    }

    fn include(reg: &mut Registry, from: u32, to: u32) {
        reg.get_or_create(FileId(from))
            .record_include(IncludeTarget::File(FileId(to)), SourceLoc::new(FileId(from), to));
    }

    #[test]
    fn test_association_requires_both_name_and_inclusion() {
        // 0=Widget.m, 1=Widget.h, 2=Foo.h, 3=Widget+Private.h (not included).
        let sm = StemMap {
            stems: vec!["Widget", "Widget", "Foo", "Widget"],
        };
        let mut reg = Registry::new(FileId(0));
        include(&mut reg, 0, 1);
        include(&mut reg, 0, 2);

        resolve_associations(&mut reg, &sm);

        let assoc = &reg.main_record().associations;
        assert!(assoc.contains(&FileId(1)), "name-matched include associates");
        assert!(!assoc.contains(&FileId(2)), "name mismatch never associates");
        assert!(
            !assoc.contains(&FileId(3)),
            "matching name without inclusion never associates"
        );
    }

    #[test]
    fn test_association_recurses_into_matched_targets() {
        // Widget.m -> Widget.h -> Widget+Private.h, all stem "Widget".
        let sm = StemMap {
            stems: vec!["Widget", "Widget", "Widget"],
        };
        let mut reg = Registry::new(FileId(0));
        include(&mut reg, 0, 1);
        include(&mut reg, 1, 2);

        resolve_associations(&mut reg, &sm);

        assert!(reg.record(FileId(1)).unwrap().associations.contains(&FileId(2)));
        let set = AssociatedSet::build(&reg);
        assert_eq!(set.len(), 3);
        assert!(set.contains(FileId(2)));
    }

    #[test]
    fn test_association_tolerates_include_cycles() {
        let sm = StemMap {
            stems: vec!["Widget", "Widget"],
        };
        let mut reg = Registry::new(FileId(0));
        include(&mut reg, 0, 1);
        include(&mut reg, 1, 0);

        resolve_associations(&mut reg, &sm);

        assert!(reg.main_record().associations.contains(&FileId(1)));
        let set = AssociatedSet::build(&reg);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_stems_never_match() {
        let sm = StemMap {
            stems: vec!["", ""],
        };
        let mut reg = Registry::new(FileId(0));
        include(&mut reg, 0, 1);

        resolve_associations(&mut reg, &sm);
        assert!(reg.main_record().associations.is_empty());
    }

    #[test]
    fn test_unmatched_closure_is_main_only() {
        let sm = StemMap {
            stems: vec!["Widget", "Foo"],
        };
        let mut reg = Registry::new(FileId(0));
        include(&mut reg, 0, 1);

        resolve_associations(&mut reg, &sm);
        let set = AssociatedSet::build(&reg);
        assert_eq!(set.len(), 1);
        assert!(set.contains(FileId(0)));
        assert!(!set.contains(FileId(1)));
    }
}
