//! Stage F: Type-Usage Resolver. Walks every field's declared type and every
//! method/constructor's parameter and return types, resolving each against
//! the whole-project index and emitting `Uses`/`UsedBy` edges. Types outside
//! the analyzed file set still get an edge, pointed at a synthetic id and
//! marked unresolved, rather than being dropped; primitives/`void` never
//! produce an edge at all. Unlike Stage E this only reads node-level type
//! strings — it never touches a method body.

use protocol::{Diagnostic, Edge, EdgeLabel, NodeAttrs};

use crate::index::SymbolIndex;
use crate::scope::ScopeTable;

pub fn resolve(index: &SymbolIndex, scopes: &ScopeTable) -> (Vec<Edge>, Vec<Diagnostic>) {
    let mut edges = Vec::new();
    let diagnostics = Vec::new();

    for node in index.nodes() {
        match &node.attrs {
            NodeAttrs::Field(f) => {
                let scope = scopes.scope_for(&node.file_path, &f.owner_fqn);
                emit_uses(&node.id, &f.declared_type, &scope, index, &mut edges);
            }
            NodeAttrs::Method(m) => {
                let scope = scopes.scope_for(&node.file_path, &m.owner_fqn);
                emit_uses(&node.id, &m.return_type, &scope, index, &mut edges);
                for p in &m.params {
                    emit_uses(&node.id, &p.type_name, &scope, index, &mut edges);
                }
            }
            NodeAttrs::Constructor(c) => {
                let scope = scopes.scope_for(&node.file_path, &c.owner_fqn);
                for p in &c.params {
                    emit_uses(&node.id, &p.type_name, &scope, index, &mut edges);
                }
            }
            _ => {}
        }
    }

    (edges, diagnostics)
}

fn emit_uses(
    user_id: &str,
    raw_type: &str,
    scope: &crate::resolve::Scope,
    index: &SymbolIndex,
    edges: &mut Vec<Edge>,
) {
    let base = strip_array_suffix(raw_type);
    if crate::resolve::is_builtin(base) {
        return;
    }

    let resolved = crate::resolve::resolve_fqn(base, scope, index).and_then(|fqn| index.resolve_type(&fqn));

    let (target_id, resolved_flag) = match resolved {
        Some((target_id, _)) => (target_id.to_string(), true),
        None => (protocol::id::synthetic_class_id(base), false),
    };
    if target_id == user_id {
        return;
    }
    edges.push(Edge::new(user_id.to_string(), EdgeLabel::Uses, target_id.clone(), resolved_flag));
    edges.push(Edge::new(target_id, EdgeLabel::UsedBy, user_id.to_string(), resolved_flag));
}

fn strip_array_suffix(raw: &str) -> &str {
    let mut s = raw.trim();
    while let Some(stripped) = s.strip_suffix("[]") {
        s = stripped.trim();
    }
    s
}
