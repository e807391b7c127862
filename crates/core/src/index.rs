//! Stage C: Symbol Index. Builds whole-project lookup tables out of the
//! per-file nodes Stage B produced, so Stages D–F can resolve a name without
//! re-scanning every file. Read-only once built — nothing downstream is
//! allowed to mutate it, which is what keeps D/E/F idempotent.

use protocol::{Diagnostic, Node, NodeAttrs, NodeKind};
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

pub struct SymbolIndex {
    nodes_by_id: FxHashMap<String, Node>,
    types_by_fqn: FxHashMap<String, (String, TypeKind)>,
    /// (owner_fqn, simple_name) -> node ids of every overload.
    methods_by_name: FxHashMap<(String, String), Vec<String>>,
    ctors_by_owner: FxHashMap<String, Vec<String>>,
    fields_by_owner_name: FxHashMap<(String, String), String>,
}

impl SymbolIndex {
    pub fn build(nodes: Vec<Node>) -> (Self, Vec<Diagnostic>) {
        let mut index = SymbolIndex {
            nodes_by_id: FxHashMap::default(),
            types_by_fqn: FxHashMap::default(),
            methods_by_name: FxHashMap::default(),
            ctors_by_owner: FxHashMap::default(),
            fields_by_owner_name: FxHashMap::default(),
        };
        let mut diagnostics = Vec::new();

        for node in nodes {
            match &node.attrs {
                NodeAttrs::Class(a) => {
                    index.insert_type(&a.fqn, &node.id, TypeKind::Class, &node, &mut diagnostics);
                }
                NodeAttrs::Interface(a) => {
                    index.insert_type(&a.fqn, &node.id, TypeKind::Interface, &node, &mut diagnostics);
                }
                NodeAttrs::Method(a) => {
                    let key = (a.owner_fqn.clone(), a.simple_name.clone());
                    let ids = index.methods_by_name.entry(key).or_default();
                    // Distinct overloads get distinct ids (the id encodes the
                    // signature); a repeated id here means two declarations
                    // collided on the same signature.
                    if ids.contains(&node.id) {
                        diagnostics.push(Diagnostic::DuplicateSymbol {
                            id: node.id.clone(),
                            file_path: node.file_path.clone(),
                            line: node.line_range.start,
                        });
                    } else {
                        ids.push(node.id.clone());
                    }
                }
                NodeAttrs::Constructor(a) => {
                    let ids = index.ctors_by_owner.entry(a.owner_fqn.clone()).or_default();
                    if ids.contains(&node.id) {
                        diagnostics.push(Diagnostic::DuplicateSymbol {
                            id: node.id.clone(),
                            file_path: node.file_path.clone(),
                            line: node.line_range.start,
                        });
                    } else {
                        ids.push(node.id.clone());
                    }
                }
                NodeAttrs::Field(a) => {
                    let key = (a.owner_fqn.clone(), a.simple_name.clone());
                    if index.fields_by_owner_name.contains_key(&key) {
                        diagnostics.push(Diagnostic::DuplicateSymbol {
                            id: node.id.clone(),
                            file_path: node.file_path.clone(),
                            line: node.line_range.start,
                        });
                    } else {
                        index.fields_by_owner_name.insert(key, node.id.clone());
                    }
                }
                NodeAttrs::Module(_) => {}
            }
            index.nodes_by_id.entry(node.id.clone()).or_insert(node);
        }

        (index, diagnostics)
    }

    fn insert_type(
        &mut self,
        fqn: &str,
        node_id: &str,
        kind: TypeKind,
        node: &Node,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if self.types_by_fqn.contains_key(fqn) {
            diagnostics.push(Diagnostic::DuplicateSymbol {
                id: node_id.to_string(),
                file_path: node.file_path.clone(),
                line: node.line_range.start,
            });
            return;
        }
        self.types_by_fqn.insert(fqn.to_string(), (node_id.to_string(), kind));
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes_by_id.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes_by_id.values()
    }

    pub fn resolve_type(&self, fqn: &str) -> Option<(&str, TypeKind)> {
        self.types_by_fqn.get(fqn).map(|(id, kind)| (id.as_str(), *kind))
    }

    pub fn class_id(&self, fqn: &str) -> Option<&str> {
        match self.types_by_fqn.get(fqn) {
            Some((id, TypeKind::Class)) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn interface_id(&self, fqn: &str) -> Option<&str> {
        match self.types_by_fqn.get(fqn) {
            Some((id, TypeKind::Interface)) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn methods_named<'a>(&'a self, owner_fqn: &str, simple_name: &str) -> &'a [String] {
        self.methods_by_name
            .get(&(owner_fqn.to_string(), simple_name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_methods_of(&self, owner_fqn: &str) -> Vec<&Node> {
        self.methods_by_name
            .iter()
            .filter(|((owner, _), _)| owner == owner_fqn)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.nodes_by_id.get(id))
            .collect()
    }

    pub fn constructors_of(&self, owner_fqn: &str) -> &[String] {
        self.ctors_by_owner.get(owner_fqn).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn field(&self, owner_fqn: &str, simple_name: &str) -> Option<&str> {
        self.fields_by_owner_name
            .get(&(owner_fqn.to_string(), simple_name.to_string()))
            .map(String::as_str)
    }

    pub fn type_kind(&self, node_id: &str) -> Option<NodeKind> {
        self.nodes_by_id.get(node_id).map(|n| n.kind())
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes_by_id.into_values().collect()
    }

    /// The `symbol_tables.json` document: a flat dump of every
    /// lookup table, for downstream tools that want name resolution without
    /// re-running the pipeline.
    pub fn dump(&self) -> SymbolTableDump {
        SymbolTableDump {
            types: self
                .types_by_fqn
                .iter()
                .map(|(fqn, (id, kind))| TypeEntry {
                    fqn: fqn.clone(),
                    id: id.clone(),
                    kind: match kind {
                        TypeKind::Class => "class",
                        TypeKind::Interface => "interface",
                    },
                })
                .collect(),
            methods: self
                .methods_by_name
                .iter()
                .map(|((owner_fqn, simple_name), ids)| MethodGroupEntry {
                    owner_fqn: owner_fqn.clone(),
                    simple_name: simple_name.clone(),
                    ids: ids.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TypeEntry {
    pub fqn: String,
    pub id: String,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MethodGroupEntry {
    pub owner_fqn: String,
    pub simple_name: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SymbolTableDump {
    pub types: Vec<TypeEntry>,
    pub methods: Vec<MethodGroupEntry>,
}
