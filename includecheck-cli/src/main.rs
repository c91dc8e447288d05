//! includecheck CLI - unused and missing include detector for Objective-C.
//!
//! Features:
//! - Single-file mode: one translation unit, headers resolved next to it
//! - Directory mode: every implementation file under the root becomes its
//!   own translation unit, headers resolved across the whole tree
//! - Plaintext or JSON reporting
//! - Fix application with dry-run

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use includecheck_core::{
    apply_fixits_to_disk, diagnostics_json, gather_source_files, init_structured_logging,
    load_config, print_json, print_plain, AnalysisResult, IncludeCheck, IncludeCheckConfig,
    IncludeCheckResult,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Unused and missing include detector for Objective-C")]
pub struct Cli {
    /// Path to a source file or project directory
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Header names or patterns to ignore (prefix*, *suffix, or substring)
    #[arg(long, num_args = 1..)]
    ignore: Vec<String>,

    /// Apply fix-its to the source files
    #[arg(long)]
    fix: bool,

    /// Show which files would be rewritten without touching anything
    #[arg(long)]
    fix_dry_run: bool,

    /// Enable debug-level logging (unless RUST_LOG is already set)
    #[arg(long, short)]
    verbose: bool,
}

/// Whether output should be JSON, from the flag or the config file.
fn output_is_json(cli_json: bool, cfg: Option<&IncludeCheckConfig>) -> bool {
    cli_json
        || cfg
            .and_then(|c| c.output.as_ref())
            .and_then(|o| o.format.as_deref())
            == Some("json")
}

/// Settled options for one invocation: CLI flags merged with the
/// includecheck.toml found at the project root.
struct Options {
    ignore: Vec<String>,
    json: bool,
    /// Extra include search directories from the config, already resolved
    /// against the root.
    extra_search: Vec<PathBuf>,
}

/// Merges CLI flags with includecheck.toml found at `root`. Config problems
/// are reported but never fatal.
fn effective_options(cli: &Cli, root: &Path) -> Options {
    let mut ignore = cli.ignore.clone();
    let mut extra_search = Vec::new();
    let mut cfg = None;
    match load_config(root) {
        Ok(Some(loaded)) => {
            if let Some(list) = &loaded.ignore {
                ignore.extend(list.iter().cloned());
            }
            extra_search = loaded.search_dirs(root);
            cfg = Some(loaded);
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("[WARN] config load failed: {}", e);
        }
    }
    Options {
        ignore,
        json: output_is_json(cli.json, cfg.as_ref()),
        extra_search,
    }
}

/// Builds and analyzes one translation unit.
fn analyze_unit(
    path: &Path,
    search: &[PathBuf],
    ignore: &[String],
) -> IncludeCheckResult<(IncludeCheck, AnalysisResult)> {
    let checker = IncludeCheck::from_file_with_search(path, search)?
        .ignore_patterns(ignore.iter().cloned());
    let result = checker.analyze();
    Ok((checker, result))
}

/// Applies fix-its behind one unit; write failures are warnings.
fn apply_fixes(checker: &IncludeCheck, result: &AnalysisResult, dry_run: bool) {
    let fixed = apply_fixits_to_disk(checker.unit(), &result.diagnostics, dry_run);
    for err in &fixed.errors {
        eprintln!("[WARN] fix failed: {}", err);
    }
    if !fixed.files_rewritten.is_empty() {
        eprintln!(
            "[includecheck] {} edit(s) applied across {} file(s)",
            fixed.edits_applied,
            fixed.files_rewritten.len()
        );
    }
}

/// Single translation unit mode: the file's own directory is the include
/// search path.
fn run_single(cli: &Cli, path: &Path) -> Result<()> {
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let opts = effective_options(cli, &root);
    let mut search = vec![root];
    search.extend(opts.extra_search.iter().cloned());

    let (checker, result) = analyze_unit(path, &search, &opts.ignore)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;

    if cli.fix || cli.fix_dry_run {
        apply_fixes(&checker, &result, cli.fix_dry_run);
    }

    if opts.json {
        print_json(checker.unit(), &result.diagnostics);
    } else {
        print_plain(checker.unit(), &result.diagnostics);
    }

    std::process::exit(if result.has_findings() { 1 } else { 0 });
}

/// Directory mode: analyze every implementation file as its own unit, with
/// every header-bearing directory as a search path.
fn run_directory(cli: &Cli, root: &Path) -> Result<()> {
    let opts = effective_options(cli, root);
    let tree = gather_source_files(root)
        .with_context(|| format!("Failed to scan sources under {}", root.display()))?;
    if tree.implementations.is_empty() {
        eprintln!(
            "No implementation files (.m/.mm) found under {}",
            root.display()
        );
        std::process::exit(0);
    }
    let mut search = tree.header_dirs();
    search.extend(opts.extra_search.iter().cloned());

    let mut units_with_findings = 0usize;
    let mut failed_units = 0usize;
    let mut reports = Vec::new();

    for file in &tree.implementations {
        // One unreadable or malformed unit never aborts the batch.
        let (checker, result) = match analyze_unit(file, &search, &opts.ignore) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("[WARN] {}: {}", file.display(), e);
                failed_units += 1;
                continue;
            }
        };

        if cli.fix || cli.fix_dry_run {
            apply_fixes(&checker, &result, cli.fix_dry_run);
        }
        if result.has_findings() {
            units_with_findings += 1;
        }

        if opts.json {
            reports.push(serde_json::json!({
                "file": file.display().to_string(),
                "unused": result.unused_count(),
                "missing": result.missing_count(),
                "diagnostics": diagnostics_json(checker.unit(), &result.diagnostics),
            }));
        } else if result.has_findings() {
            println!("=== {} ===", file.display());
            print_plain(checker.unit(), &result.diagnostics);
            println!();
        }
    }

    if opts.json {
        let out = serde_json::json!({
            "total_units": tree.implementations.len(),
            "units_with_findings": units_with_findings,
            "failed_units": failed_units,
            "units": reports,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if units_with_findings == 0 {
        println!(
            "No include problems found in {} translation unit(s).",
            tree.implementations.len() - failed_units
        );
    } else {
        println!(
            "{} of {} translation unit(s) have include problems.",
            units_with_findings,
            tree.implementations.len()
        );
    }

    std::process::exit(if units_with_findings > 0 { 1 } else { 0 });
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] includecheck internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    let cli = Cli::parse();

    if cli.verbose && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "debug");
    }

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let input = Path::new(&cli.path);
    if !input.exists() {
        eprintln!("[ERROR] No such file or directory: {}", cli.path);
        std::process::exit(2);
    }

    if input.is_dir() {
        run_directory(&cli, input)
    } else {
        run_single(&cli, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("includecheck_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_output_is_json_flag_wins() {
        assert!(output_is_json(true, None));
        assert!(!output_is_json(false, None));
    }

    #[test]
    fn test_output_is_json_from_config() {
        let cfg: IncludeCheckConfig =
            toml_from("ignore = []\n[output]\nformat = \"json\"\n");
        assert!(output_is_json(false, Some(&cfg)));

        let plain: IncludeCheckConfig = toml_from("[output]\nformat = \"plain\"\n");
        assert!(!output_is_json(false, Some(&plain)));
    }

    fn toml_from(text: &str) -> IncludeCheckConfig {
        // Round-trip through the same loader the CLI uses.
        let dir = create_temp_dir("cfg");
        create_file(&dir.join("includecheck.toml"), text);
        let cfg = load_config(&dir).unwrap().unwrap();
        fs::remove_dir_all(&dir).ok();
        cfg
    }

    #[test]
    fn test_effective_options_merges_config_ignores() {
        let dir = create_temp_dir("merge");
        create_file(&dir.join("includecheck.toml"), "ignore = [\"*Generated.h\"]\n");

        let cli = Cli::parse_from(["includecheck", ".", "--ignore", "Legacy.h"]);
        let opts = effective_options(&cli, &dir);
        assert_eq!(opts.ignore, vec!["Legacy.h", "*Generated.h"]);
        assert!(!opts.json);
        assert!(opts.extra_search.is_empty());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_search_paths_extend_resolution() {
        let dir = create_temp_dir("search");
        create_file(
            &dir.join("includecheck.toml"),
            "search_paths = [\"Vendor\"]\n",
        );
        create_file(
            &dir.join("Widget.m"),
            "#import \"Widget.h\"\n\n@implementation Widget\n@end\n",
        );
        create_file(&dir.join("Vendor/Widget.h"), "@interface Widget\n@end\n");

        let cli = Cli::parse_from(["includecheck", "."]);
        let opts = effective_options(&cli, &dir);
        assert_eq!(opts.extra_search, vec![dir.join("Vendor")]);

        // The header resolves only through the configured directory.
        let mut search = vec![dir.clone()];
        search.extend(opts.extra_search.iter().cloned());
        let (checker, result) = analyze_unit(&dir.join("Widget.m"), &search, &[]).unwrap();
        assert!(!result.has_findings());
        assert!(checker
            .unit()
            .file_by_name("Widget.h")
            .map(|f| !checker.unit().text(f).unwrap_or("").is_empty())
            .unwrap_or(false));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_analyze_unit_on_disk() {
        let dir = create_temp_dir("unit");
        create_file(
            &dir.join("Widget.m"),
            "#import \"Widget.h\"\n#import \"Foo.h\"\n\n@implementation Widget\n@end\n",
        );
        create_file(&dir.join("Widget.h"), "@interface Widget\n@end\n");
        create_file(&dir.join("Foo.h"), "@interface Foo\n@end\n");

        let (_, result) = analyze_unit(&dir.join("Widget.m"), &[dir.clone()], &[]).unwrap();
        assert_eq!(result.unused_count(), 1);
        assert_eq!(result.missing_count(), 0);

        let (_, suppressed) =
            analyze_unit(&dir.join("Widget.m"), &[dir.clone()], &["Foo*".to_string()]).unwrap();
        assert!(!suppressed.has_findings());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_analyze_unit_missing_file_errors() {
        let dir = create_temp_dir("missing");
        assert!(analyze_unit(&dir.join("Nope.m"), &[dir.clone()], &[]).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
