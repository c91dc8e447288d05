//! Output formatting - plaintext and JSON.

use serde_json::json;

use crate::diagnostic::{Diagnostic, FixIt};
use crate::source::SourceMap;

fn render_position(sm: &dyn SourceMap, diag: &Diagnostic) -> (String, u32, u32) {
    match sm.position(diag.anchor) {
        Some(pos) => (sm.canonical_path(pos.file).to_string(), pos.line, pos.column),
        None => ("<unknown>".to_string(), 0, 0),
    }
}

/// Prints diagnostics in compiler-style plain text.
pub fn print_plain(sm: &dyn SourceMap, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("No include problems found.");
        return;
    }
    for diag in diagnostics {
        let (path, line, column) = render_position(sm, diag);
        println!("{}:{}:{}: warning: {}", path, line, column, diag);
        match &diag.fix {
            FixIt::Delete { .. } => println!("  fix: delete line {}", line),
            FixIt::Insert { text, .. } => println!("  fix: insert '{}'", text.trim_end()),
        }
    }
}

/// Diagnostics as a JSON array; shared by [`print_json`] and callers that
/// aggregate several translation units into one document.
pub fn diagnostics_json(sm: &dyn SourceMap, diagnostics: &[Diagnostic]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|diag| {
            let (path, line, column) = render_position(sm, diag);
            let fix = match &diag.fix {
                FixIt::Delete { span } => json!({
                    "action": "delete",
                    "start": span.start.offset,
                    "end": span.end.offset,
                }),
                FixIt::Insert { at, text } => json!({
                    "action": "insert",
                    "at": at.offset,
                    "text": text,
                }),
            };
            json!({
                "kind": diag.kind,
                "subject": diag.subject,
                "file": path,
                "line": line,
                "column": column,
                "fix": fix,
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}

/// Prints diagnostics in JSON format.
///
/// Falls back to a count-only object if serialization fails (it should not
/// with these value types, but the failure path stays graceful).
pub fn print_json(sm: &dyn SourceMap, diagnostics: &[Diagnostic]) {
    let entries = diagnostics_json(sm, diagnostics);
    match serde_json::to_string_pretty(&json!({ "diagnostics": entries })) {
        Ok(out) => println!("{}", out),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"diagnostic_count\": {}}}", diagnostics.len());
        }
    }
}
