//! Shared "raw type name to FQN" lookup, used by both the Hierarchy
//! Resolver (extends/implements) and the Call & Instantiation Resolver
//! (receiver types, `new` targets). Grounded on the precedence order in
//! `JavaResolver::resolve` (rocket-index): exact qualified name, then
//! same-package, then enclosing-type nesting, then imports.

use crate::index::SymbolIndex;
use java_harness::ImportDecl;

pub struct Scope<'a> {
    pub package: &'a str,
    pub imports: &'a [ImportDecl],
    /// FQN of the type the reference appears inside, used to also try
    /// sibling/nested names relative to enclosing types.
    pub enclosing_fqn: &'a str,
}

/// Best-effort resolution of a raw identifier or dotted name to a known
/// class/interface FQN. Returns `None` when nothing in the index matches —
/// callers turn that into an unresolved edge, never a panic.
pub fn resolve_fqn(raw: &str, scope: &Scope, index: &SymbolIndex) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Already fully qualified and known.
    if index.resolve_type(raw).is_some() {
        return Some(raw.to_string());
    }

    // java.lang and primitives are never declared in this project; don't
    // waste the later heuristics on them.
    if is_builtin(raw) {
        return None;
    }

    // Same package.
    if !scope.package.is_empty() && scope.package != protocol::id::SENTINEL_PACKAGE {
        let candidate = format!("{}.{}", scope.package, raw);
        if index.resolve_type(&candidate).is_some() {
            return Some(candidate);
        }
    }

    // Nested type of an enclosing type, walking outward: Outer.Inner,
    // then Outer itself if `raw == "Outer"`.
    let mut enclosing = scope.enclosing_fqn;
    loop {
        let candidate = format!("{}.{}", enclosing, raw);
        if index.resolve_type(&candidate).is_some() {
            return Some(candidate);
        }
        match enclosing.rsplit_once('.') {
            Some((rest, _)) => enclosing = rest,
            None => break,
        }
    }

    // Single-type imports first (exact match beats wildcard).
    for import in scope.imports {
        if import.is_wildcard || import.is_static {
            continue;
        }
        if import.path.rsplit('.').next() == Some(raw) {
            if index.resolve_type(&import.path).is_some() {
                return Some(import.path.clone());
            }
        }
    }

    // Wildcard imports.
    for import in scope.imports {
        if !import.is_wildcard || import.is_static {
            continue;
        }
        let prefix = import.path.trim_end_matches(".*").trim_end_matches('*');
        let candidate = format!("{}.{}", prefix.trim_end_matches('.'), raw);
        if index.resolve_type(&candidate).is_some() {
            return Some(candidate);
        }
    }

    None
}

pub(crate) fn is_builtin(raw: &str) -> bool {
    matches!(
        raw,
        "int" | "long" | "short" | "byte" | "char" | "boolean" | "float" | "double" | "void"
    )
}
