//! Stage E: Call & Instantiation Resolver. Consumes the [`java_harness::ExprSite`]
//! list Stage B captured and turns each call/`new` into a `Calls`/`Instantiates`
//! edge, widened to every override CHA says could actually run at that site.
//!
//! Receiver typing walks "local variable, then field, then static class
//! name" and method lookup walks "this class, then its ancestors" — both
//! grounded on `ExpressionResolver::resolve_identifier_expression` and
//! `resolve_method_in_class_hierarchy` (knowledge-graph indexer).

use java_harness::{ExprSite, Receiver};
use protocol::{id, Diagnostic, Edge, EdgeLabel, NodeAttrs};
use rustc_hash::FxHashMap;

use crate::hierarchy::ClassHierarchy;
use crate::index::SymbolIndex;
use crate::scope::ScopeTable;

pub fn resolve(
    expr_sites: &[ExprSite],
    index: &SymbolIndex,
    scopes: &ScopeTable,
    hierarchy: &ClassHierarchy,
    hierarchy_edges: &[Edge],
) -> (Vec<Edge>, Vec<Diagnostic>) {
    let overridden_by = build_overridden_by_map(hierarchy_edges);

    let mut edges = Vec::new();
    let mut diagnostics = Vec::new();
    let mut locals: FxHashMap<String, FxHashMap<String, String>> = FxHashMap::default();

    for site in expr_sites {
        match site {
            ExprSite::LocalVarDecl { owner_id, var_name, declared_type } => {
                locals
                    .entry(owner_id.clone())
                    .or_default()
                    .insert(var_name.clone(), declared_type.clone());
            }
            ExprSite::MethodCall { owner_id, receiver, method_name, arg_count } => {
                resolve_call(
                    owner_id,
                    receiver,
                    method_name,
                    *arg_count,
                    index,
                    scopes,
                    hierarchy,
                    &overridden_by,
                    locals.get(owner_id),
                    &mut edges,
                    &mut diagnostics,
                );
            }
            ExprSite::Instantiation { owner_id, type_name, arg_count } => {
                resolve_instantiation(owner_id, type_name, *arg_count, index, scopes, &mut edges, &mut diagnostics);
            }
        }
    }

    (edges, diagnostics)
}

fn build_overridden_by_map(edges: &[Edge]) -> FxHashMap<String, Vec<String>> {
    let mut map: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for e in edges {
        if e.label == EdgeLabel::OverriddenBy {
            map.entry(e.src.clone()).or_default().push(e.dst.clone());
        }
    }
    map
}

fn transitive_overrides(method_id: &str, overridden_by: &FxHashMap<String, Vec<String>>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut stack = vec![method_id.to_string()];
    while let Some(current) = stack.pop() {
        if let Some(children) = overridden_by.get(&current) {
            for child in children {
                if !seen.contains(child) {
                    seen.push(child.clone());
                    stack.push(child.clone());
                }
            }
        }
    }
    seen
}

fn owner_context<'a>(owner_id: &str, index: &'a SymbolIndex) -> Option<(&'a str, String, bool)> {
    let node = index.node(owner_id)?;
    match &node.attrs {
        NodeAttrs::Method(m) => Some((node.file_path.as_str(), m.owner_fqn.clone(), m.is_static)),
        NodeAttrs::Constructor(c) => Some((node.file_path.as_str(), c.owner_fqn.clone(), false)),
        _ => None,
    }
}

/// Look up `name` with `arg_count` params starting at `fqn` and walking up
/// its ancestor chain, stopping at the first class that declares a match.
fn find_method_in_chain(
    index: &SymbolIndex,
    hierarchy: &ClassHierarchy,
    fqn: &str,
    name: &str,
    arg_count: usize,
) -> Option<String> {
    for ancestor_fqn in hierarchy.ancestors(fqn) {
        let candidates = index.methods_named(&ancestor_fqn, name);
        if candidates.is_empty() {
            continue;
        }
        let arity_matches: Vec<&String> = candidates
            .iter()
            .filter(|id| {
                index
                    .node(id)
                    .map(|n| matches!(&n.attrs, NodeAttrs::Method(m) if m.params.len() == arg_count))
                    .unwrap_or(false)
            })
            .collect();
        // Exactly one overload matches arity: unambiguous target.
        if arity_matches.len() == 1 {
            return Some(arity_matches[0].clone());
        }
        // Two or more overloads share this arg_count (e.g. `foo(String)` and
        // `foo(int)`); picking one would guess, and argument typing stops here.
        if arity_matches.len() > 1 {
            return None;
        }
        // A same-named method exists on this ancestor but none of its
        // overloads match arity. A single overload with no competing
        // alternative is still the best guess.
        if candidates.len() == 1 {
            return Some(candidates[0].clone());
        }
        return None;
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn resolve_call(
    owner_id: &str,
    receiver: &Receiver,
    method_name: &str,
    arg_count: usize,
    index: &SymbolIndex,
    scopes: &ScopeTable,
    hierarchy: &ClassHierarchy,
    overridden_by: &FxHashMap<String, Vec<String>>,
    local_vars: Option<&FxHashMap<String, String>>,
    edges: &mut Vec<Edge>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some((file_path, owner_fqn, _is_static)) = owner_context(owner_id, index) else {
        return;
    };

    let receiver_fqn = match receiver {
        Receiver::Implicit | Receiver::This => Some(owner_fqn.clone()),
        Receiver::Super => hierarchy.ancestors(&owner_fqn).get(1).cloned(),
        Receiver::Identifier(name) => {
            resolve_identifier_receiver(name, &owner_fqn, file_path, index, scopes, local_vars)
        }
    };

    let found = receiver_fqn
        .as_ref()
        .and_then(|fqn| find_method_in_chain(index, hierarchy, fqn, method_name, arg_count));

    let dst = match &found {
        Some(method_id) => method_id.clone(),
        None => {
            diagnostics.push(Diagnostic::UnresolvedReference {
                context_id: owner_id.to_string(),
                name: method_name.to_string(),
            });
            let best_guess = receiver_fqn.unwrap_or(owner_fqn);
            id::synthetic_method_id(&best_guess, method_name)
        }
    };
    let resolved = found.is_some();
    edges.push(Edge::new(owner_id.to_string(), EdgeLabel::Calls, dst.clone(), resolved));
    edges.push(Edge::new(dst.clone(), EdgeLabel::CalledBy, owner_id.to_string(), resolved));

    // CHA widening: the call may actually land on any override further
    // down the hierarchy from the statically resolved target.
    if let Some(method_id) = &found {
        for overridden in transitive_overrides(method_id, overridden_by) {
            edges.push(Edge::new(owner_id.to_string(), EdgeLabel::Calls, overridden.clone(), true));
            edges.push(Edge::new(overridden, EdgeLabel::CalledBy, owner_id.to_string(), true));
        }
    }
}

fn resolve_identifier_receiver(
    name: &str,
    owner_fqn: &str,
    file_path: &str,
    index: &SymbolIndex,
    scopes: &ScopeTable,
    local_vars: Option<&FxHashMap<String, String>>,
) -> Option<String> {
    // A local variable in this call site's enclosing method/constructor.
    if let Some(locals) = local_vars {
        if let Some(declared_type) = locals.get(name) {
            let scope = scopes.scope_for(file_path, owner_fqn);
            if let Some(fqn) = crate::resolve::resolve_fqn(declared_type, &scope, index) {
                return Some(fqn);
            }
        }
    }

    // A field of the enclosing class (or an ancestor, via same-class-fqn
    // lookup against the index — fields aren't inherited-searched here
    // since `index.field` only checks the exact owner).
    if let Some(field_id) = index.field(owner_fqn, name) {
        if let Some(node) = index.node(field_id) {
            if let NodeAttrs::Field(f) = &node.attrs {
                let scope = scopes.scope_for(file_path, owner_fqn);
                if let Some(fqn) = crate::resolve::resolve_fqn(&f.declared_type, &scope, index) {
                    return Some(fqn);
                }
            }
        }
    }

    // A static class reference: `ClassName.method()`.
    let scope = scopes.scope_for(file_path, owner_fqn);
    crate::resolve::resolve_fqn(name, &scope, index)
}

fn resolve_instantiation(
    owner_id: &str,
    type_name: &str,
    arg_count: usize,
    index: &SymbolIndex,
    scopes: &ScopeTable,
    edges: &mut Vec<Edge>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some((file_path, owner_fqn, _)) = owner_context(owner_id, index) else {
        return;
    };
    let scope = scopes.scope_for(file_path, &owner_fqn);
    let resolved_fqn = crate::resolve::resolve_fqn(type_name, &scope, index);

    let (dst, resolved) = match &resolved_fqn {
        Some(fqn) => {
            let ctors = index.constructors_of(fqn);
            let arity_matches: Vec<&String> = ctors
                .iter()
                .filter(|id| {
                    index
                        .node(id)
                        .map(|n| matches!(&n.attrs, NodeAttrs::Constructor(c) if c.params.len() == arg_count))
                        .unwrap_or(false)
                })
                .collect();
            if arity_matches.len() == 1 {
                // Exactly one overload matches arity: unambiguous target.
                (arity_matches[0].clone(), true)
            } else if ctors.is_empty() {
                // No declared constructor at all: implicit default, target the class itself.
                (index.class_id(fqn).unwrap_or(fqn).to_string(), true)
            } else if ctors.len() == 1 {
                // A lone overload with the wrong arity is still the best guess.
                (ctors[0].clone(), true)
            } else {
                // Zero or multiple overloads match arity: constructor
                // selection fails, point at the class itself.
                (index.class_id(fqn).unwrap_or(fqn).to_string(), false)
            }
        }
        None => {
            diagnostics.push(Diagnostic::UnresolvedReference {
                context_id: owner_id.to_string(),
                name: type_name.to_string(),
            });
            (id::synthetic_method_id(type_name, "<init>"), false)
        }
    };

    edges.push(Edge::new(owner_id.to_string(), EdgeLabel::Instantiates, dst.clone(), resolved));
    edges.push(Edge::new(dst, EdgeLabel::InstantiatedBy, owner_id.to_string(), resolved));
}

#[cfg(test)]
mod tests {
    use super::*;
    use java_harness::FileImports;
    use protocol::{ClassAttrs, ClassDeclKind, LineRange, MethodAttrs, Node, Param};

    fn class(fqn: &str) -> Node {
        Node {
            id: id::class_id(fqn),
            file_path: "F.java".to_string(),
            line_range: LineRange::new(1, 1),
            source_code: String::new(),
            attrs: NodeAttrs::Class(ClassAttrs {
                simple_name: fqn.rsplit('.').next().unwrap().to_string(),
                fqn: fqn.to_string(),
                extends: None,
                implements: vec![],
                modifiers: vec![],
                decl_kind: ClassDeclKind::Class,
            }),
        }
    }

    fn method(owner_fqn: &str, name: &str, params: usize) -> Node {
        Node {
            id: id::method_id(owner_fqn, name, &format!("({})", vec!["int"; params].join(","))),
            file_path: "F.java".to_string(),
            line_range: LineRange::new(1, 1),
            source_code: String::new(),
            attrs: NodeAttrs::Method(MethodAttrs {
                simple_name: name.to_string(),
                owner_fqn: owner_fqn.to_string(),
                return_type: "void".to_string(),
                params: (0..params).map(|i| Param { name: format!("p{i}"), type_name: "int".to_string() }).collect(),
                signature: format!("({})", vec!["int"; params].join(",")),
                is_static: false,
                modifiers: vec![],
                is_abstract: false,
            }),
        }
    }

    #[test]
    fn resolves_implicit_call_within_same_class() {
        let caller = method("com.example.Foo", "caller", 0);
        let callee = method("com.example.Foo", "callee", 0);
        let nodes = vec![class("com.example.Foo"), caller.clone(), callee.clone()];
        let (index, _) = SymbolIndex::build(nodes);
        let scopes = ScopeTable::build(vec![FileImports {
            file_path: "F.java".to_string(),
            package: "com.example".to_string(),
            imports: vec![],
        }]);
        let (_hierarchy_edges, _hierarchy_diags, hierarchy) = crate::hierarchy::resolve(&index, &scopes);
        let sites = vec![ExprSite::MethodCall {
            owner_id: caller.id.clone(),
            receiver: Receiver::Implicit,
            method_name: "callee".to_string(),
            arg_count: 0,
        }];
        let (edges, diags) = resolve(&sites, &index, &scopes, &hierarchy, &[]);
        assert!(diags.is_empty());
        assert!(edges.iter().any(|e| e.label == EdgeLabel::Calls && e.dst == callee.id && e.resolved));
    }

    #[test]
    fn unresolved_call_produces_single_unresolved_edge() {
        let caller = method("com.example.Foo", "caller", 0);
        let nodes = vec![class("com.example.Foo"), caller.clone()];
        let (index, _) = SymbolIndex::build(nodes);
        let scopes = ScopeTable::build(vec![]);
        let (_hierarchy_edges, _hierarchy_diags, hierarchy) = crate::hierarchy::resolve(&index, &scopes);
        let sites = vec![ExprSite::MethodCall {
            owner_id: caller.id.clone(),
            receiver: Receiver::Implicit,
            method_name: "ghost".to_string(),
            arg_count: 0,
        }];
        let (edges, diags) = resolve(&sites, &index, &scopes, &hierarchy, &[]);
        assert_eq!(diags.len(), 1);
        let calls: Vec<_> = edges.iter().filter(|e| e.label == EdgeLabel::Calls).collect();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].resolved);
    }

    fn method_with_param_type(owner_fqn: &str, name: &str, type_name: &str) -> Node {
        Node {
            id: id::method_id(owner_fqn, name, &format!("({})", type_name)),
            file_path: "F.java".to_string(),
            line_range: LineRange::new(1, 1),
            source_code: String::new(),
            attrs: NodeAttrs::Method(MethodAttrs {
                simple_name: name.to_string(),
                owner_fqn: owner_fqn.to_string(),
                return_type: "void".to_string(),
                params: vec![Param { name: "p0".to_string(), type_name: type_name.to_string() }],
                signature: format!("({})", type_name),
                is_static: false,
                modifiers: vec![],
                is_abstract: false,
            }),
        }
    }

    #[test]
    fn ambiguous_overload_at_same_arity_is_unresolved() {
        let caller = method("com.example.Foo", "caller", 0);
        let a = method_with_param_type("com.example.Foo", "process", "String");
        let b = method_with_param_type("com.example.Foo", "process", "int");
        let nodes = vec![class("com.example.Foo"), caller.clone(), a, b];
        let (index, _) = SymbolIndex::build(nodes);
        let scopes = ScopeTable::build(vec![FileImports {
            file_path: "F.java".to_string(),
            package: "com.example".to_string(),
            imports: vec![],
        }]);
        let (_hierarchy_edges, _hierarchy_diags, hierarchy) = crate::hierarchy::resolve(&index, &scopes);
        let sites = vec![ExprSite::MethodCall {
            owner_id: caller.id.clone(),
            receiver: Receiver::Implicit,
            method_name: "process".to_string(),
            arg_count: 1,
        }];
        let (edges, diags) = resolve(&sites, &index, &scopes, &hierarchy, &[]);
        assert_eq!(diags.len(), 1);
        let calls: Vec<_> = edges.iter().filter(|e| e.label == EdgeLabel::Calls).collect();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].resolved);
    }
}
