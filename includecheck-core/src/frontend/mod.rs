//! Reference front-end: an in-memory translation unit for a small
//! Objective-C subset.
//!
//! The original analysis sits inside a compiler and consumes its source
//! manager, preprocessor callbacks, and AST traversal. This module supplies
//! the same three services from plain text so the analysis is usable and
//! testable end-to-end: a [`SourceMap`] implementation, the inclusion event
//! stream ([`TranslationUnit::pp_events`]), and a node traversal
//! ([`TranslationUnit::nodes`]).
//!
//! Preprocessing starts at the main file and enters each included file once;
//! the first inclusion wins the include-site slot, matching a compiler's
//! file-entry behavior under header guards. Unresolvable targets become
//! empty stub files and are treated as leaves.

pub mod lex;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::classify::{EntityRef, Node};
use crate::error::{IncludeCheckError, IncludeCheckResult, IoResultExt};
use crate::record::IncludeTarget;
use crate::source::{FileId, Position, SourceLoc, SourceMap, SourceSpan};

/// One preprocessing event: an inclusion directive and its resolved target,
/// in lexical order.
#[derive(Debug, Clone)]
pub struct PpEvent {
    pub at: SourceLoc,
    pub target: IncludeTarget,
}

#[derive(Debug)]
struct SourceFile {
    canonical_path: String,
    display_name: String,
    stem: String,
    text: String,
    /// Byte offset of each line's first character.
    line_starts: Vec<u32>,
    /// Where this file was first included; `None` for the main file and for
    /// files never actually entered.
    include_site: Option<SourceLoc>,
}

impl SourceFile {
    fn new(canonical_path: String, text: String, include_site: Option<SourceLoc>) -> Self {
        let display_name = basename(&canonical_path).to_string();
        let stem = component_stem_of(&display_name).to_string();
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            canonical_path,
            display_name,
            stem,
            text,
            line_starts,
            include_site,
        }
    }
}

/// A fully preprocessed translation unit: the concrete [`SourceMap`] plus
/// the recorded event stream and the node traversal.
#[derive(Debug)]
pub struct TranslationUnit {
    files: Vec<SourceFile>,
    main: FileId,
    events: Vec<PpEvent>,
}

impl TranslationUnit {
    /// Build a unit by reading `main` and its includes from disk. Quoted
    /// includes resolve against the including file's directory first, then
    /// the search directories; angled includes use search directories only.
    pub fn from_file(
        main: impl AsRef<Path>,
        search_dirs: &[PathBuf],
    ) -> IncludeCheckResult<Self> {
        let mut builder = TranslationUnitBuilder::new().read_disk(true);
        for dir in search_dirs {
            builder = builder.search_dir(dir.clone());
        }
        builder.build(&main.as_ref().to_string_lossy())
    }

    /// The recorded inclusion event stream, in lexical order.
    pub fn pp_events(&self) -> &[PpEvent] {
        &self.events
    }

    /// Full text of `file`.
    pub fn text(&self, file: FileId) -> Option<&str> {
        self.files.get(file.0 as usize).map(|f| f.text.as_str())
    }

    /// All file handles in the unit, main file first.
    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.files.len() as u32).map(FileId)
    }

    /// First file whose basename is `name`.
    pub fn file_by_name(&self, name: &str) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.display_name == name)
            .map(|i| FileId(i as u32))
    }

    fn file(&self, id: FileId) -> Option<&SourceFile> {
        if !id.is_valid() {
            return None;
        }
        self.files.get(id.0 as usize)
    }

    /// Depth-first traversal of the unit's declarations and expressions.
    ///
    /// Two passes: the first collects definition sites (interfaces and
    /// protocol definitions) into a symbol table, the second emits nodes
    /// with references resolved to declaration locations. Names that
    /// resolve to nothing in the unit are dropped.
    pub fn nodes(&self) -> Vec<Node> {
        let symbols = self.collect_symbols();
        let resolve = |name: &str| {
            let entity = symbols
                .get(name)
                .map(|loc| EntityRef::new(name, *loc));
            if entity.is_none() {
                trace!(name, "reference to name not defined in this unit dropped");
            }
            entity
        };

        let mut nodes = Vec::new();
        for (index, file) in self.files.iter().enumerate() {
            let fid = FileId(index as u32);
            for (offset, line) in lines_with_offsets(&file.text) {
                if line.trim_start().starts_with("//") {
                    continue;
                }
                let at = |col: usize| SourceLoc::new(fid, offset + col as u32);

                for (name, col) in lex::forward_class_names(line) {
                    nodes.push(Node::ForwardDecl { loc: at(col), name });
                }
                if let Some((name, col)) = lex::forward_protocol(line) {
                    nodes.push(Node::ForwardDecl { loc: at(col), name });
                } else if let Some(iface) = lex::interface_line(line) {
                    // A category requires the full definition of its base
                    // class; a primary interface requires its superclass.
                    let superclass = if iface.category.is_some() {
                        resolve(&iface.name)
                    } else {
                        iface.superclass.and_then(|(name, _)| resolve(&name))
                    };
                    let protocols = iface
                        .protocols
                        .into_iter()
                        .filter_map(|(name, _)| resolve(&name))
                        .collect();
                    nodes.push(Node::InterfaceDef {
                        loc: at(iface.name_offset),
                        name: iface.name,
                        superclass,
                        protocols,
                    });
                } else if let Some(imp) = lex::implementation_line(line) {
                    // A category implementation references the category
                    // interface; a primary one references the class.
                    let interface = match &imp.category {
                        Some(cat) => resolve(&category_key(&imp.name, cat))
                            .or_else(|| resolve(&imp.name)),
                        None => resolve(&imp.name),
                    };
                    nodes.push(Node::ImplDef {
                        loc: at(imp.name_offset),
                        interface,
                    });
                }
                for (name, col) in lex::message_receivers(line) {
                    if let Some(receiver) = resolve(&name) {
                        nodes.push(Node::MessageExpr {
                            loc: at(col),
                            receiver: Some(receiver),
                            // Selector resolution would need semantic
                            // analysis; front-ends that have it can fill
                            // this in.
                            method: None,
                        });
                    }
                }
            }
        }
        nodes
    }

    fn collect_symbols(&self) -> HashMap<String, SourceLoc> {
        let mut symbols: HashMap<String, SourceLoc> = HashMap::new();
        for (index, file) in self.files.iter().enumerate() {
            let fid = FileId(index as u32);
            for (offset, line) in lines_with_offsets(&file.text) {
                if line.trim_start().starts_with("//") {
                    continue;
                }
                if lex::forward_protocol(line).is_some() {
                    continue;
                }
                let definition = match lex::protocol_definition(line) {
                    Some((name, col)) => Some((name, col)),
                    // Category interfaces register under a compound key so
                    // only their own implementations resolve to them.
                    None => lex::interface_line(line).map(|iface| match &iface.category {
                        Some(cat) => (category_key(&iface.name, cat), iface.name_offset),
                        None => (iface.name, iface.name_offset),
                    }),
                };
                if let Some((name, col)) = definition {
                    let loc = SourceLoc::new(fid, offset + col as u32);
                    if let Some(previous) = symbols.insert(name.clone(), loc) {
                        trace!(name, first = %previous, "duplicate definition, first one kept");
                        symbols.insert(name, previous);
                    }
                }
            }
        }
        symbols
    }

    fn add_file(
        &mut self,
        canonical_path: String,
        text: String,
        include_site: Option<SourceLoc>,
    ) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile::new(canonical_path, text, include_site));
        id
    }
}

impl SourceMap for TranslationUnit {
    fn main_file(&self) -> FileId {
        self.main
    }

    fn owner_file(&self, loc: SourceLoc) -> Option<FileId> {
        self.file(loc.file).map(|_| loc.file)
    }

    fn include_site(&self, file: FileId) -> Option<SourceLoc> {
        self.file(file).and_then(|f| f.include_site)
    }

    fn line_start(&self, loc: SourceLoc) -> SourceLoc {
        match self.file(loc.file) {
            Some(file) => {
                let idx = file.line_starts.partition_point(|&s| s <= loc.offset);
                SourceLoc::new(loc.file, file.line_starts[idx.saturating_sub(1)])
            }
            None => SourceLoc::INVALID,
        }
    }

    fn line_span(&self, loc: SourceLoc) -> SourceSpan {
        match self.file(loc.file) {
            Some(file) => {
                let idx = file.line_starts.partition_point(|&s| s <= loc.offset);
                let start = file.line_starts[idx.saturating_sub(1)];
                let end = file
                    .line_starts
                    .get(idx)
                    .copied()
                    .unwrap_or(file.text.len() as u32);
                SourceSpan::new(
                    SourceLoc::new(loc.file, start),
                    SourceLoc::new(loc.file, end),
                )
            }
            None => SourceSpan {
                start: SourceLoc::INVALID,
                end: SourceLoc::INVALID,
            },
        }
    }

    fn line_text(&self, loc: SourceLoc) -> Option<String> {
        let file = self.file(loc.file)?;
        let span = self.line_span(loc);
        file.text
            .get(span.start.offset as usize..span.end.offset as usize)
            .map(str::to_string)
    }

    fn canonical_path(&self, file: FileId) -> &str {
        self.file(file).map(|f| f.canonical_path.as_str()).unwrap_or("")
    }

    fn display_name(&self, file: FileId) -> &str {
        self.file(file).map(|f| f.display_name.as_str()).unwrap_or("")
    }

    fn component_stem(&self, file: FileId) -> &str {
        self.file(file).map(|f| f.stem.as_str()).unwrap_or("")
    }

    fn position(&self, loc: SourceLoc) -> Option<Position> {
        let file = self.file(loc.file)?;
        let idx = file.line_starts.partition_point(|&s| s <= loc.offset);
        let line_start = file.line_starts[idx.saturating_sub(1)];
        Some(Position {
            file: loc.file,
            line: idx as u32,
            column: loc.offset - line_start + 1,
        })
    }
}

/// Assembles a [`TranslationUnit`] from in-memory sources and, optionally,
/// the filesystem.
#[derive(Debug, Default)]
pub struct TranslationUnitBuilder {
    sources: BTreeMap<String, String>,
    search_dirs: Vec<PathBuf>,
    read_disk: bool,
}

impl TranslationUnitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-memory source file.
    pub fn add_source(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.insert(normalize(&path.into()), text.into());
        self
    }

    /// Add a directory to resolve includes against.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Allow falling back to the filesystem for unresolved paths.
    pub fn read_disk(mut self, enabled: bool) -> Self {
        self.read_disk = enabled;
        self
    }

    /// Preprocess starting at `main`, recording the event stream.
    pub fn build(self, main: &str) -> IncludeCheckResult<TranslationUnit> {
        let main_key = normalize(main);
        let main_text = match self.sources.get(&main_key) {
            Some(text) => text.clone(),
            None if self.read_disk => fs::read_to_string(&main_key).with_path(&main_key)?,
            None => {
                return Err(IncludeCheckError::frontend(
                    PathBuf::from(&main_key),
                    "main file was not registered with the builder",
                ))
            }
        };

        let mut tu = TranslationUnit {
            files: Vec::new(),
            main: FileId(0),
            events: Vec::new(),
        };
        let mut by_path = HashMap::new();
        let main_id = tu.add_file(main_key.clone(), main_text, None);
        by_path.insert(main_key, main_id);

        self.preprocess(&mut tu, &mut by_path, main_id);
        debug!(
            files = tu.files.len(),
            events = tu.events.len(),
            "translation unit preprocessed"
        );
        Ok(tu)
    }

    fn preprocess(
        &self,
        tu: &mut TranslationUnit,
        by_path: &mut HashMap<String, FileId>,
        fid: FileId,
    ) {
        let text = tu.files[fid.0 as usize].text.clone();
        for (offset, line) in lines_with_offsets(&text) {
            if line.trim_start().starts_with("//") {
                continue;
            }
            let at = SourceLoc::new(fid, offset);
            if let Some(include) = lex::include_directive(line) {
                let (target, newly_entered) = self.enter(tu, by_path, fid, &include, at);
                tu.events.push(PpEvent {
                    at,
                    target: IncludeTarget::File(target),
                });
                if newly_entered {
                    self.preprocess(tu, by_path, target);
                }
            } else if let Some(module) = lex::module_import(line) {
                tu.events.push(PpEvent {
                    at,
                    target: IncludeTarget::Module(module),
                });
            }
        }
    }

    /// Resolve one directive to a file, entering it on first sight.
    fn enter(
        &self,
        tu: &mut TranslationUnit,
        by_path: &mut HashMap<String, FileId>,
        from: FileId,
        include: &lex::IncludeLine,
        at: SourceLoc,
    ) -> (FileId, bool) {
        for candidate in self.candidates(tu, from, include) {
            if let Some(&existing) = by_path.get(&candidate) {
                return (existing, false);
            }
            if let Some(text) = self.sources.get(&candidate) {
                let id = tu.add_file(candidate.clone(), text.clone(), Some(at));
                by_path.insert(candidate, id);
                return (id, true);
            }
            if self.read_disk && Path::new(&candidate).is_file() {
                let canonical = fs::canonicalize(&candidate)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| candidate.clone());
                if let Some(&existing) = by_path.get(&canonical) {
                    by_path.insert(candidate, existing);
                    return (existing, false);
                }
                let text = match fs::read_to_string(&canonical) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(path = %canonical, %err, "include target unreadable, stubbed");
                        String::new()
                    }
                };
                let id = tu.add_file(canonical.clone(), text, Some(at));
                if candidate != canonical {
                    by_path.insert(candidate, id);
                }
                by_path.insert(canonical, id);
                return (id, true);
            }
        }

        // No identity retrievable: keep the spelled path as a leaf stub so
        // the directive still lands in the including record.
        let key = normalize(&include.spelled);
        if let Some(&existing) = by_path.get(&key) {
            return (existing, false);
        }
        debug!(spelled = %include.spelled, "unresolved include, stub file created");
        let id = tu.add_file(key.clone(), String::new(), Some(at));
        by_path.insert(key, id);
        (id, true)
    }

    fn candidates(
        &self,
        tu: &TranslationUnit,
        from: FileId,
        include: &lex::IncludeLine,
    ) -> Vec<String> {
        let mut out = Vec::new();
        if !include.angled {
            let from_dir = parent_dir(&tu.files[from.0 as usize].canonical_path);
            if !from_dir.is_empty() {
                out.push(normalize(&format!("{}/{}", from_dir, include.spelled)));
            }
            out.push(normalize(&include.spelled));
        }
        for dir in &self.search_dirs {
            out.push(normalize(
                &dir.join(&include.spelled).to_string_lossy(),
            ));
        }
        out.dedup();
        out
    }
}

/// Byte offset and content of each line, terminators included.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (u32, &str)> {
    text.split_inclusive('\n').scan(0u32, |offset, line| {
        let current = *offset;
        *offset += line.len() as u32;
        Some((current, line))
    })
}

/// Symbol-table key for a category interface.
fn category_key(name: &str, category: &str) -> String {
    format!("{}({})", name, category)
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Basename with the extension dropped and any `+variant` suffix stripped:
/// `Widget.m`, `Widget.h` and `Widget+Private.h` all yield `Widget`.
fn component_stem_of(name: &str) -> &str {
    let without_ext = match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    };
    match without_ext.find('+') {
        Some(pos) => &without_ext[..pos],
        None => without_ext,
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[..pos],
        None => "",
    }
}

fn normalize(path: &str) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.replace('\\', "/")
}
