//! Line-oriented lexing of the Objective-C subset the reference front-end
//! understands.
//!
//! Patterns are compiled once via `OnceLock`. Everything outside this subset
//! is ignored; this is deliberately not semantic analysis of Objective-C.

use std::sync::OnceLock;

use regex::Regex;

fn include_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*#\s*(?:import|include)\s*(?:"([^"]+)"|<([^>]+)>)"#)
            .expect("hardcoded include pattern is valid")
    })
}

fn module_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*@import\s+([A-Za-z_][A-Za-z0-9_.]*)\s*;")
            .expect("hardcoded module-import pattern is valid")
    })
}

fn class_forward_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*@class\s+([^;]+);").expect("hardcoded @class pattern is valid")
    })
}

fn protocol_forward_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*@protocol\s+([A-Za-z_][A-Za-z0-9_]*)\s*;")
            .expect("hardcoded forward-protocol pattern is valid")
    })
}

fn protocol_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*@protocol\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("hardcoded protocol pattern is valid")
    })
}

fn interface_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*@interface\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\))?\s*(?::\s*([A-Za-z_][A-Za-z0-9_]*))?\s*(?:<([^>]*)>)?",
        )
        .expect("hardcoded interface pattern is valid")
    })
}

fn implementation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*@implementation\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\))?",
        )
        .expect("hardcoded implementation pattern is valid")
    })
}

fn message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\s*([A-Z][A-Za-z0-9_]*)\s+[A-Za-z_]")
            .expect("hardcoded message pattern is valid")
    })
}

/// A matched inclusion directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeLine {
    /// The path as spelled between the delimiters.
    pub spelled: String,
    /// Angle-bracket form (`<...>`) rather than quoted.
    pub angled: bool,
}

/// An `#import` / `#include` directive on this line.
pub fn include_directive(line: &str) -> Option<IncludeLine> {
    let caps = include_re().captures(line)?;
    if let Some(quoted) = caps.get(1) {
        return Some(IncludeLine {
            spelled: quoted.as_str().to_string(),
            angled: false,
        });
    }
    caps.get(2).map(|angled| IncludeLine {
        spelled: angled.as_str().to_string(),
        angled: true,
    })
}

/// An `@import Module;` statement on this line.
pub fn module_import(line: &str) -> Option<String> {
    module_import_re()
        .captures(line)
        .map(|c| c[1].to_string())
}

/// Names forward-declared by an `@class A, B;` statement, with their byte
/// offsets within the line.
pub fn forward_class_names(line: &str) -> Vec<(String, usize)> {
    let Some(caps) = class_forward_re().captures(line) else {
        return Vec::new();
    };
    let list = caps.get(1).expect("group 1 always present");
    split_names(list.as_str(), list.start())
}

/// A forward `@protocol Name;` declaration on this line.
pub fn forward_protocol(line: &str) -> Option<(String, usize)> {
    protocol_forward_re()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| (m.as_str().to_string(), m.start()))
}

/// A protocol definition header (`@protocol Name ... @end`). Check
/// [`forward_protocol`] first; this pattern matches the forward form too.
pub fn protocol_definition(line: &str) -> Option<(String, usize)> {
    protocol_def_re()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| (m.as_str().to_string(), m.start()))
}

/// A matched `@interface` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceLine {
    pub name: String,
    pub name_offset: usize,
    /// Category name when this is `@interface Name (Category)`.
    pub category: Option<String>,
    pub superclass: Option<(String, usize)>,
    /// Protocols listed in the conformance clause.
    pub protocols: Vec<(String, usize)>,
}

/// An `@interface` header on this line.
pub fn interface_line(line: &str) -> Option<InterfaceLine> {
    let caps = interface_re().captures(line)?;
    let name = caps.get(1).expect("group 1 always present");
    let protocols = caps
        .get(4)
        .map(|list| split_names(list.as_str(), list.start()))
        .unwrap_or_default();
    Some(InterfaceLine {
        name: name.as_str().to_string(),
        name_offset: name.start(),
        category: caps.get(2).map(|m| m.as_str().to_string()),
        superclass: caps.get(3).map(|m| (m.as_str().to_string(), m.start())),
        protocols,
    })
}

/// A matched `@implementation` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationLine {
    pub name: String,
    pub name_offset: usize,
    /// Category name when this is `@implementation Name (Category)`.
    pub category: Option<String>,
}

/// An `@implementation` header on this line.
pub fn implementation_line(line: &str) -> Option<ImplementationLine> {
    let caps = implementation_re().captures(line)?;
    let name = caps.get(1).expect("group 1 always present");
    Some(ImplementationLine {
        name: name.as_str().to_string(),
        name_offset: name.start(),
        category: caps.get(2).map(|m| m.as_str().to_string()),
    })
}

/// Class receivers of message sends on this line (`[Name selector ...]`),
/// with the receiver's byte offset.
pub fn message_receivers(line: &str) -> Vec<(String, usize)> {
    message_re()
        .captures_iter(line)
        .filter_map(|c| c.get(1))
        .map(|m| (m.as_str().to_string(), m.start()))
        .collect()
}

/// Split a comma-separated name list, yielding (name, line offset) pairs.
fn split_names(list: &str, base: usize) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    for part in list.split(',') {
        let trimmed = part.trim();
        if !trimmed.is_empty() {
            let lead = part.len() - part.trim_start().len();
            out.push((trimmed.to_string(), base + cursor + lead));
        }
        cursor += part.len() + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_forms() {
        let quoted = include_directive("#import \"Widget.h\"").unwrap();
        assert_eq!(quoted.spelled, "Widget.h");
        assert!(!quoted.angled);

        let angled = include_directive("  #include <Foundation/Foundation.h>").unwrap();
        assert_eq!(angled.spelled, "Foundation/Foundation.h");
        assert!(angled.angled);

        assert!(include_directive("int x; // #import \"No.h\"").is_none());
    }

    #[test]
    fn test_module_import() {
        assert_eq!(module_import("@import Foundation;").as_deref(), Some("Foundation"));
        assert_eq!(module_import("@import UIKit.UIView;").as_deref(), Some("UIKit.UIView"));
        assert!(module_import("@import ;").is_none());
    }

    #[test]
    fn test_forward_class_list_with_offsets() {
        let names = forward_class_names("@class Foo, Bar;");
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].0, "Foo");
        assert_eq!(names[1].0, "Bar");
        assert_eq!(&"@class Foo, Bar;"[names[1].1..names[1].1 + 3], "Bar");
    }

    #[test]
    fn test_protocol_forward_vs_definition() {
        assert!(forward_protocol("@protocol Drawable;").is_some());
        assert!(forward_protocol("@protocol Drawable").is_none());
        // The definition pattern matches both; callers check forward first.
        assert!(protocol_definition("@protocol Drawable").is_some());
    }

    #[test]
    fn test_interface_full_header() {
        let iface = interface_line("@interface Widget : Base <Drawable, Codable>").unwrap();
        assert_eq!(iface.name, "Widget");
        assert!(iface.category.is_none());
        assert_eq!(iface.superclass.as_ref().unwrap().0, "Base");
        assert_eq!(iface.protocols.len(), 2);
        assert_eq!(iface.protocols[1].0, "Codable");
    }

    #[test]
    fn test_interface_category() {
        let iface = interface_line("@interface Widget (Private)").unwrap();
        assert_eq!(iface.name, "Widget");
        assert_eq!(iface.category.as_deref(), Some("Private"));
        assert!(iface.superclass.is_none());
    }

    #[test]
    fn test_implementation() {
        let plain = implementation_line("@implementation Widget").unwrap();
        assert_eq!(plain.name, "Widget");
        assert!(plain.category.is_none());

        let category = implementation_line("@implementation Widget (Private)").unwrap();
        assert_eq!(category.name, "Widget");
        assert_eq!(category.category.as_deref(), Some("Private"));
    }

    #[test]
    fn test_message_receivers_class_only() {
        let recv = message_receivers("  [[Widget alloc] initWith:[Helper shared]];");
        let names: Vec<&str> = recv.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Widget", "Helper"]);
        // Lowercase receivers are instance variables, not class references.
        assert!(message_receivers("[self doThing]").is_empty());
    }
}
