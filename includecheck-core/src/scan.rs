//! Deterministic source discovery with efficient directory pruning.
//!
//! Implementation files (`.m`, `.mm`) each become their own translation
//! unit; headers are resolution candidates for their includes. Build
//! artifact and dependency directories are pruned before iteration so
//! entire subtrees are skipped in O(1).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Directories to exclude by default (standard Xcode project conventions).
const EXCLUDED_DIRS: &[&str] = &["build", ".build", ".git", "DerivedData", "Pods"];

/// The source files found under one root.
#[derive(Debug, Default)]
pub struct SourceTree {
    /// `.m` / `.mm` files, sorted.
    pub implementations: Vec<PathBuf>,
    /// `.h` files, sorted.
    pub headers: Vec<PathBuf>,
}

impl SourceTree {
    /// Directories containing at least one header, deduplicated; used as
    /// include search paths.
    pub fn header_dirs(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        for header in &self.headers {
            if let Some(parent) = header.parent() {
                if seen.insert(parent.to_path_buf()) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }
        dirs
    }
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Gathers all Objective-C sources recursively starting from `root`.
///
/// Output is sorted so repeated runs analyze units in the same order.
pub fn gather_source_files(root: &Path) -> Result<SourceTree> {
    let mut tree = SourceTree::default();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
    {
        let entry =
            entry.with_context(|| format!("Failed to scan sources under {}", root.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("m") | Some("mm") => tree.implementations.push(path.to_path_buf()),
            Some("h") => tree.headers.push(path.to_path_buf()),
            _ => {}
        }
    }

    tree.implementations.sort();
    tree.headers.sort();
    Ok(tree)
}
