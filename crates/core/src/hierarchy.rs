//! Stage D: Class Hierarchy Resolver. Resolves `extends`/`implements`
//! strings against the whole-project index and computes the `Overrides`
//! relation by walking the superclass chain, mirroring
//! `ExpressionResolver::resolve_method_in_class_hierarchy` (knowledge-graph
//! indexer): check the current type, then recurse through its resolved
//! supertypes until a matching signature turns up or the chain runs out.

use protocol::{Diagnostic, Edge, EdgeLabel, Node, NodeAttrs};
use rustc_hash::FxHashMap;

use crate::index::SymbolIndex;
use crate::scope::ScopeTable;

struct ClassLinks {
    superclass: Option<String>,
    interfaces: Vec<String>,
}

/// The resolved superclass relation, kept around after Stage D so Stage E
/// can walk "self then ancestors" when looking up an inherited method
/// without re-resolving every `extends` string from scratch.
pub struct ClassHierarchy {
    superclass: FxHashMap<String, Option<String>>,
}

impl ClassHierarchy {
    /// `fqn` itself first, then each ancestor up to the root.
    pub fn ancestors(&self, fqn: &str) -> Vec<String> {
        let mut chain = vec![fqn.to_string()];
        let mut current = self.superclass.get(fqn).cloned().flatten();
        while let Some(next) = current {
            if chain.contains(&next) {
                break; // malformed/cyclic input; don't loop forever.
            }
            current = self.superclass.get(&next).cloned().flatten();
            chain.push(next);
        }
        chain
    }
}

/// Resolved class-hierarchy and interface-implementation edges, plus the
/// `Overrides`/`OverriddenBy` pairs derived from walking them.
pub fn resolve(index: &SymbolIndex, scopes: &ScopeTable) -> (Vec<Edge>, Vec<Diagnostic>, ClassHierarchy) {
    let mut edges = Vec::new();

    let mut class_links: FxHashMap<String, ClassLinks> = FxHashMap::default();
    let mut interface_extends: FxHashMap<String, Vec<String>> = FxHashMap::default();

    for node in index.nodes() {
        match &node.attrs {
            NodeAttrs::Class(a) => {
                let scope = scopes.scope_for(&node.file_path, &a.fqn);
                let superclass = a
                    .extends
                    .as_ref()
                    .and_then(|raw| crate::resolve::resolve_fqn(raw, &scope, index))
                    .filter(|fqn| index.class_id(fqn).is_some());

                if let Some(raw) = &a.extends {
                    match &superclass {
                        Some(base_fqn) => {
                            let base_id = index.class_id(base_fqn).unwrap().to_string();
                            edges.push(Edge::new(base_id.clone(), EdgeLabel::BaseClassOf, node.id.clone(), true));
                            edges.push(Edge::new(node.id.clone(), EdgeLabel::DerivedClassOf, base_id, true));
                        }
                        None => {
                            // extends a type outside the analyzed file set (JDK, framework, etc.)
                            let synthetic = protocol::id::synthetic_class_id(raw);
                            edges.push(Edge::new(synthetic.clone(), EdgeLabel::BaseClassOf, node.id.clone(), false));
                            edges.push(Edge::new(node.id.clone(), EdgeLabel::DerivedClassOf, synthetic, false));
                        }
                    }
                }

                let mut interfaces: Vec<String> = Vec::new();
                for raw in &a.implements {
                    let resolved =
                        crate::resolve::resolve_fqn(raw, &scope, index).filter(|fqn| index.interface_id(fqn).is_some());
                    match resolved {
                        Some(iface_fqn) => {
                            let iface_id = index.interface_id(&iface_fqn).unwrap().to_string();
                            edges.push(Edge::new(node.id.clone(), EdgeLabel::Implements, iface_id.clone(), true));
                            edges.push(Edge::new(iface_id, EdgeLabel::ImplementedBy, node.id.clone(), true));
                            interfaces.push(iface_fqn);
                        }
                        None => {
                            let synthetic = protocol::id::synthetic_interface_id(raw);
                            edges.push(Edge::new(node.id.clone(), EdgeLabel::Implements, synthetic.clone(), false));
                            edges.push(Edge::new(synthetic, EdgeLabel::ImplementedBy, node.id.clone(), false));
                        }
                    }
                }

                class_links.insert(
                    a.fqn.clone(),
                    ClassLinks {
                        superclass,
                        interfaces,
                    },
                );
            }
            NodeAttrs::Interface(a) => {
                let scope = scopes.scope_for(&node.file_path, &a.fqn);
                let mut parents: Vec<String> = Vec::new();
                for raw in &a.extends {
                    let resolved =
                        crate::resolve::resolve_fqn(raw, &scope, index).filter(|fqn| index.interface_id(fqn).is_some());
                    match resolved {
                        Some(parent_fqn) => {
                            let parent_id = index.interface_id(&parent_fqn).unwrap().to_string();
                            edges.push(Edge::new(node.id.clone(), EdgeLabel::Implements, parent_id.clone(), true));
                            edges.push(Edge::new(parent_id, EdgeLabel::ImplementedBy, node.id.clone(), true));
                            parents.push(parent_fqn);
                        }
                        None => {
                            let synthetic = protocol::id::synthetic_interface_id(raw);
                            edges.push(Edge::new(node.id.clone(), EdgeLabel::Implements, synthetic.clone(), false));
                            edges.push(Edge::new(synthetic, EdgeLabel::ImplementedBy, node.id.clone(), false));
                        }
                    }
                }
                interface_extends.insert(a.fqn.clone(), parents);
            }
            _ => {}
        }
    }

    edges.extend(compute_class_overrides(index, &class_links));
    edges.extend(compute_interface_overrides(index, &class_links, &interface_extends));

    let hierarchy = ClassHierarchy {
        superclass: class_links.iter().map(|(fqn, links)| (fqn.clone(), links.superclass.clone())).collect(),
    };
    (edges, Vec::new(), hierarchy)
}

/// Method override by superclass chain. Static and
/// private methods never participate in overriding.
fn compute_class_overrides(index: &SymbolIndex, class_links: &FxHashMap<String, ClassLinks>) -> Vec<Edge> {
    use protocol::Modifier;

    let mut edges = Vec::new();
    for (fqn, links) in class_links {
        let methods = index.all_methods_of(fqn);
        for method in &methods {
            let NodeAttrs::Method(m) = &method.attrs else { continue };
            if m.is_static || m.modifiers.contains(&Modifier::Private) {
                continue;
            }
            if let Some(parent_method) = find_in_superclass_chain(class_links, links, index, &m.simple_name, &m.signature) {
                edges.push(Edge::new(method.id.clone(), EdgeLabel::Overrides, parent_method.clone(), true));
                edges.push(Edge::new(parent_method, EdgeLabel::OverriddenBy, method.id.clone(), true));
            }
        }
    }
    edges
}

fn find_in_superclass_chain(
    class_links: &FxHashMap<String, ClassLinks>,
    start: &ClassLinks,
    index: &SymbolIndex,
    simple_name: &str,
    signature: &str,
) -> Option<String> {
    let mut current = start.superclass.clone();
    while let Some(fqn) = current {
        if let Some(found) = find_method(index, &fqn, simple_name, signature) {
            return Some(found);
        }
        current = class_links.get(&fqn).and_then(|l| l.superclass.clone());
    }
    None
}

fn find_method(index: &SymbolIndex, owner_fqn: &str, simple_name: &str, signature: &str) -> Option<String> {
    index
        .methods_named(owner_fqn, simple_name)
        .iter()
        .find(|id| matches_signature(index, id, signature))
        .cloned()
}

fn matches_signature(index: &SymbolIndex, node_id: &str, signature: &str) -> bool {
    use protocol::Modifier;
    match index.node(node_id).map(|n: &Node| &n.attrs) {
        Some(NodeAttrs::Method(m)) => {
            m.signature == signature && !m.is_static && !m.modifiers.contains(&Modifier::Private)
        }
        _ => false,
    }
}

/// A concrete class's method overrides an interface's abstract method when
/// the class implements that interface (directly or through a superclass)
/// and declares a same-signature method anywhere in its own superclass
/// chain.
fn compute_interface_overrides(
    index: &SymbolIndex,
    class_links: &FxHashMap<String, ClassLinks>,
    interface_extends: &FxHashMap<String, Vec<String>>,
) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (fqn, links) in class_links {
        let mut interfaces = links.interfaces.clone();
        let mut ancestor = links.superclass.clone();
        while let Some(anc_fqn) = ancestor {
            if let Some(anc_links) = class_links.get(&anc_fqn) {
                interfaces.extend(anc_links.interfaces.iter().cloned());
                ancestor = anc_links.superclass.clone();
            } else {
                break;
            }
        }
        let all_interfaces = transitive_interfaces(&interfaces, interface_extends);

        for iface_fqn in &all_interfaces {
            for abstract_method in index.all_methods_of(iface_fqn) {
                let NodeAttrs::Method(m) = &abstract_method.attrs else { continue };
                let concrete = find_method(index, fqn, &m.simple_name, &m.signature)
                    .or_else(|| find_in_superclass_chain(class_links, links, index, &m.simple_name, &m.signature));
                if let Some(concrete) = concrete {
                    edges.push(Edge::new(concrete.clone(), EdgeLabel::Overrides, abstract_method.id.clone(), true));
                    edges.push(Edge::new(abstract_method.id.clone(), EdgeLabel::OverriddenBy, concrete, true));
                }
            }
        }
    }
    edges
}

fn transitive_interfaces(direct: &[String], interface_extends: &FxHashMap<String, Vec<String>>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut stack: Vec<String> = direct.to_vec();
    while let Some(fqn) = stack.pop() {
        if seen.contains(&fqn) {
            continue;
        }
        seen.push(fqn.clone());
        if let Some(parents) = interface_extends.get(&fqn) {
            stack.extend(parents.iter().cloned());
        }
    }
    seen
}
