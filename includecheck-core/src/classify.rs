//! Usage classification: mapping every external reference back to the
//! inclusion that supplies it.
//!
//! The classifier is driven by the front-end's traversal over declaration and
//! expression nodes. Nodes outside the associated closure are skipped
//! entirely, which bounds the work to the component under analysis. Each
//! reference a node carries is either a full use (the complete definition is
//! required) or a forward use (a declaration suffices); only full uses feed
//! the decision pass.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::associate::AssociatedSet;
use crate::registry::Registry;
use crate::source::{FileId, SourceLoc, SourceMap};

/// A resolved reference to a named entity: the name as spelled and the
/// location of the entity's own declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub decl_loc: SourceLoc,
}

impl EntityRef {
    pub fn new(name: impl Into<String>, decl_loc: SourceLoc) -> Self {
        Self {
            name: name.into(),
            decl_loc,
        }
    }
}

/// The closed set of syntax nodes the classifier understands.
///
/// This is the whole seam to the parser: a front-end offers each declaration
/// or expression as one of these variants, in depth-first source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// `@class Foo;` or `@protocol Bar;` — a bare forward mention.
    ForwardDecl { loc: SourceLoc, name: String },
    /// An interface (or category) definition. The superclass and every
    /// listed protocol require full definitions.
    InterfaceDef {
        loc: SourceLoc,
        name: String,
        superclass: Option<EntityRef>,
        protocols: Vec<EntityRef>,
    },
    /// An implementation block; its interface requires a full definition.
    ImplDef {
        loc: SourceLoc,
        interface: Option<EntityRef>,
    },
    /// A message send; the receiver type and the resolved method (when the
    /// front-end can resolve one) require full definitions.
    MessageExpr {
        loc: SourceLoc,
        receiver: Option<EntityRef>,
        method: Option<EntityRef>,
    },
}

/// One classified reference carried by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedRef<'a> {
    Full(&'a EntityRef),
    Forward(&'a str),
}

impl Node {
    /// The node's own source location.
    pub fn loc(&self) -> SourceLoc {
        match self {
            Self::ForwardDecl { loc, .. }
            | Self::InterfaceDef { loc, .. }
            | Self::ImplDef { loc, .. }
            | Self::MessageExpr { loc, .. } => *loc,
        }
    }

    /// Dispatch table keyed on node category: the references each node
    /// carries, already classified.
    pub fn refs(&self) -> Vec<ClassifiedRef<'_>> {
        match self {
            Self::ForwardDecl { name, .. } => vec![ClassifiedRef::Forward(name)],
            Self::InterfaceDef {
                superclass,
                protocols,
                ..
            } => superclass
                .iter()
                .chain(protocols.iter())
                .map(ClassifiedRef::Full)
                .collect(),
            Self::ImplDef { interface, .. } => {
                interface.iter().map(ClassifiedRef::Full).collect()
            }
            Self::MessageExpr {
                receiver, method, ..
            } => receiver
                .iter()
                .chain(method.iter())
                .map(ClassifiedRef::Full)
                .collect(),
        }
    }
}

/// Walk the inclusion chain of `defining` upward from its first entry point
/// and return the line start of the directive at which the chain surfaces in
/// `ref_owner` (or in the main file, whichever comes first).
///
/// Returns [`SourceLoc::INVALID`] when `defining` was never included (it is
/// the main file or a synthetic identity) or the chain is broken or cyclic.
pub fn responsible_directive(
    sm: &dyn SourceMap,
    ref_owner: FileId,
    defining: FileId,
) -> SourceLoc {
    let main = sm.main_file();
    let mut visited = HashSet::new();
    let mut cursor = defining;
    while let Some(site) = sm.include_site(cursor) {
        let Some(owner) = sm.owner_file(site) else {
            return SourceLoc::INVALID;
        };
        if owner == ref_owner || owner == main {
            return sm.line_start(site);
        }
        if !visited.insert(owner) {
            return SourceLoc::INVALID;
        }
        cursor = owner;
    }
    SourceLoc::INVALID
}

/// Records usage evidence for every reference inside the associated closure.
pub struct UsageClassifier<'a> {
    associated: &'a AssociatedSet,
}

impl<'a> UsageClassifier<'a> {
    pub fn new(associated: &'a AssociatedSet) -> Self {
        Self { associated }
    }

    /// Whether a node at `loc` belongs to the component under analysis.
    pub fn should_visit(&self, sm: &dyn SourceMap, loc: SourceLoc) -> bool {
        match sm.owner_file(loc) {
            Some(owner) => self.associated.contains(owner),
            None => false,
        }
    }

    /// Classify one node's references and record them in the owning record.
    pub fn visit(&self, registry: &mut Registry, sm: &dyn SourceMap, node: &Node) {
        let loc = node.loc();
        if !self.should_visit(sm, loc) {
            return;
        }
        for reference in node.refs() {
            match reference {
                ClassifiedRef::Forward(name) => {
                    trace!(name, at = %loc, "forward use");
                    if let Some(rec) = registry.owner_of(sm, loc) {
                        rec.record_forward_use(name, loc);
                    }
                }
                ClassifiedRef::Full(entity) => {
                    self.record_full_use(registry, sm, loc, entity);
                }
            }
        }
    }

    fn record_full_use(
        &self,
        registry: &mut Registry,
        sm: &dyn SourceMap,
        ref_loc: SourceLoc,
        entity: &EntityRef,
    ) {
        if !entity.decl_loc.is_valid() {
            trace!(name = %entity.name, "full use with synthetic declaration skipped");
            return;
        }
        let Some(defining) = sm.owner_file(entity.decl_loc) else {
            trace!(name = %entity.name, "full use with unresolvable defining file skipped");
            return;
        };
        let Some(ref_owner) = sm.owner_file(ref_loc) else {
            return;
        };
        if defining == ref_owner {
            // Defined in the referencing file itself; no inclusion involved.
            return;
        }
        // The main file was never included, so there is no directive to
        // credit. The invalid sentinel keeps the evidence while the decision
        // pass's representative check suppresses any self-inclusion report.
        let directive = if defining == sm.main_file() {
            SourceLoc::INVALID
        } else {
            responsible_directive(sm, ref_owner, defining)
        };
        trace!(
            name = %entity.name,
            defining = %sm.display_name(defining),
            directive = %directive,
            at = %ref_loc,
            "full use"
        );
        if let Some(rec) = registry.owner_of(sm, ref_loc) {
            rec.record_used_import(defining, directive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::associate::resolve_associations;
    use crate::frontend::TranslationUnitBuilder;

    fn classify(main: &str, files: &[(&str, &str)]) -> (Registry, crate::frontend::TranslationUnit) {
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

    #[test]
    fn test_full_use_records_defining_include_line() {
        let (registry, tu) = classify(
            "Widget.m",
            &[
                ("Widget.m", "#import \"Widget.h\"\n\n@implementation Widget\n@end\n"),
                ("Widget.h", "@interface Widget\n@end\n"),
            ],
        );
        let main = registry.main_record();
        let header = tu.file_by_name("Widget.h").unwrap();
        let locs = &main.used_imports[&header];
        assert_eq!(locs.len(), 1);
        // Evidence is the line start of the #import directive.
        assert_eq!(locs.iter().next().unwrap().offset, 0);
    }

    #[test]
    fn test_forward_use_recorded_separately() {
        let (registry, _tu) = classify(
            "Widget.m",
            &[("Widget.m", "@class Helper;\n\n@implementation Widget\n@end\n")],
        );
        let main = registry.main_record();
        assert!(main.forward_uses.contains_key("Helper"));
        assert!(main.used_imports.is_empty());
    }

    #[test]
    fn test_nodes_outside_associated_set_skipped() {
        // Other.h references Base, but Other.h is not associated with
        // Widget.m, so nothing is recorded against it.
        let (registry, tu) = classify(
            "Widget.m",
            &[
                ("Widget.m", "#import \"Other.h\"\n"),
                ("Other.h", "#import \"Base.h\"\n@interface Other : Base\n@end\n"),
                ("Base.h", "@interface Base\n@end\n"),
            ],
        );
        let other = tu.file_by_name("Other.h").unwrap();
        assert!(registry.record(other).unwrap().used_imports.is_empty());
    }

    #[test]
    fn test_self_reference_not_recorded() {
        let (registry, _tu) = classify(
            "Widget.m",
            &[("Widget.m", "@interface Widget\n@end\n@implementation Widget\n@end\n")],
        );
        assert!(registry.main_record().used_imports.is_empty());
    }

    #[test]
    fn test_responsible_directive_stops_at_main_level() {
        // Widget.m -> Helper.h -> Base.h; a reference in Widget.m to a type
        // from Base.h credits the Helper.h directive in the main file.
        let (registry, tu) = classify(
            "Widget.m",
            &[
                ("Widget.m", "#import \"Helper.h\"\n\n@implementation Widget\n[Base new]\n@end\n"),
                ("Helper.h", "#import \"Base.h\"\n"),
                ("Base.h", "@interface Base\n@end\n"),
            ],
        );
        let base = tu.file_by_name("Base.h").unwrap();
        let locs = &registry.main_record().used_imports[&base];
        let evidence = *locs.iter().next().unwrap();
        assert_eq!(evidence, SourceLoc::new(tu.main_file(), 0));
    }

    #[test]
    fn test_dispatch_table_classification() {
        let full = EntityRef::new("Base", SourceLoc::new(FileId(1), 0));
        let node = Node::InterfaceDef {
            loc: SourceLoc::new(FileId(0), 0),
            name: "Widget".into(),
            superclass: Some(full.clone()),
            protocols: vec![EntityRef::new("Drawable", SourceLoc::new(FileId(2), 0))],
        };
        assert_eq!(node.refs().len(), 2);
        assert!(matches!(node.refs()[0], ClassifiedRef::Full(e) if e.name == "Base"));

        let fwd = Node::ForwardDecl {
            loc: SourceLoc::new(FileId(0), 0),
            name: "Widget".into(),
        };
        assert!(matches!(fwd.refs()[0], ClassifiedRef::Forward("Widget")));
    }
}
