//! Stage A (Source Parser) and Stage B (Symbol Extractor) fused into a
//! single per-file tree-sitter walk, since both operate file-local and
//! re-walking the tree twice would buy nothing.
//!
//! This crate knows tree-sitter; `core` does not. Anything Stage E/F need
//! that can't be expressed as a [`protocol::Node`] field travels out as
//! plain data in [`ParseOutcome`] — [`ExprSite`] for call/instantiation
//! sites, [`FileImports`] for import lists — so `core` never has to touch
//! a `tree_sitter::Node`.

use protocol::id;
use protocol::signature::build_signature;
use protocol::{
    AnalyzerError, ClassAttrs, ClassDeclKind, ConstructorAttrs, Diagnostic, Edge, EdgeLabel,
    FieldAttrs, InterfaceAttrs, LineRange, MethodAttrs, ModuleAttrs, Modifier, Node, NodeAttrs,
    Param,
};
use tree_sitter::{Node as TsNode, Parser};

mod line_index;
use line_index::LineIndex;

extern "C" {
    fn tree_sitter_java() -> tree_sitter::Language;
}

/// A single import declaration, raw and unresolved. Stage E (in `core`)
/// consults these when a call receiver or `new` expression names a short
/// type that isn't in the current package (other_examples'
/// `JavaResolver::resolve` tries same-package, then imports, in that order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImports {
    pub file_path: String,
    pub package: String,
    pub imports: Vec<ImportDecl>,
}

/// How a call or field access names its receiver, captured syntactically —
/// resolving `Identifier` to "local variable", "field", or "static class
/// name" is Stage E's job, not the harness's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// No explicit receiver: `foo()` inside the owning class.
    Implicit,
    This,
    Super,
    Identifier(String),
}

/// A call or instantiation site found inside a method or constructor body,
/// plus the local variable declarations needed to type its receiver
///. Emitted in body source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprSite {
    LocalVarDecl {
        owner_id: String,
        var_name: String,
        declared_type: String,
    },
    MethodCall {
        owner_id: String,
        receiver: Receiver,
        method_name: String,
        arg_count: usize,
    },
    Instantiation {
        owner_id: String,
        type_name: String,
        arg_count: usize,
    },
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub nodes: Vec<Node>,
    /// Containment edges only (`ParentOf`/`ChildOf`); cross-file edges are
    /// `core`'s job once the whole-project index exists.
    pub edges: Vec<Edge>,
    pub expr_sites: Vec<ExprSite>,
    pub imports: Option<FileImports>,
    pub diagnostics: Vec<Diagnostic>,
}

struct ParseContext {
    file_path: String,
    package: String,
    /// Simple names of enclosing types, outermost first.
    class_stack: Vec<String>,
}

impl ParseContext {
    fn build_fqn(&self, simple_name: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.package != id::SENTINEL_PACKAGE {
            parts.push(&self.package);
        }
        let joined_classes: String;
        if self.class_stack.is_empty() {
            parts.push(simple_name);
        } else {
            joined_classes = self.class_stack.join(".") + "." + simple_name;
            parts.push(&joined_classes);
        }
        parts.join(".")
    }

    fn enclosing_fqn(&self) -> String {
        if self.class_stack.is_empty() {
            return self.package.clone();
        }
        let classes = self.class_stack.join(".");
        if self.package == id::SENTINEL_PACKAGE {
            classes
        } else {
            format!("{}.{}", self.package, classes)
        }
    }
}

pub struct JavaHarness {
    parser: Parser,
}

impl Default for JavaHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaHarness {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        let language = unsafe { tree_sitter_java() };
        parser
            .set_language(&language)
            .expect("tree-sitter-java grammar failed to load");
        Self { parser }
    }

    pub fn parse(&mut self, source: &str, file_path: &str) -> Result<ParseOutcome, AnalyzerError> {
        let tree = self.parser.parse(source, None).ok_or_else(|| AnalyzerError::MalformedSpan {
            file_path: file_path.to_string(),
            detail: "tree-sitter returned no tree".to_string(),
        })?;

        let mut outcome = ParseOutcome::default();
        let line_index = LineIndex::new(source);
        if tree.root_node().has_error() {
            outcome.diagnostics.push(Diagnostic::ParseError {
                file_path: file_path.to_string(),
                message: "syntax error recovered by tree-sitter; output may be partial".to_string(),
            });
        }

        let mut ctx = ParseContext {
            file_path: file_path.to_string(),
            package: id::SENTINEL_PACKAGE.to_string(),
            class_stack: Vec::new(),
        };

        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            walk_top_level(&child, source, file_path, &line_index, &mut ctx, &mut outcome);
        }

        // The module node always exists, even for a file with no top-level
        // type.
        outcome.nodes.push(module_node(&ctx.package, file_path, &line_index));

        Ok(outcome)
    }
}

fn module_node(package: &str, file_path: &str, line_index: &LineIndex) -> Node {
    Node {
        id: id::module_id(package),
        file_path: file_path.to_string(),
        line_range: LineRange::new(1, line_index.line_count().max(1)),
        source_code: String::new(),
        attrs: NodeAttrs::Module(ModuleAttrs {
            package_name: package.to_string(),
        }),
    }
}

fn node_text<'a>(node: &TsNode, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn node_span(node: &TsNode, line_index: &LineIndex) -> LineRange {
    let start = line_index.line_of(node.start_byte());
    let end = line_index.line_of(node.end_byte().saturating_sub(1).max(node.start_byte()));
    LineRange::new(start, end.max(start))
}

fn walk_top_level(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &mut ParseContext,
    outcome: &mut ParseOutcome,
) {
    match node.kind() {
        "package_declaration" => handle_package(node, source, ctx),
        "import_declaration" => handle_import(node, source, ctx, outcome),
        "class_declaration" | "record_declaration" => {
            handle_class(node, source, file_path, line_index, ctx, outcome, class_decl_kind(node))
        }
        "enum_declaration" => handle_enum(node, source, file_path, line_index, ctx, outcome),
        "interface_declaration" => handle_interface(node, source, file_path, line_index, ctx, outcome),
        "annotation_type_declaration" => {
            // Not one of the seven node kinds; still worth
            // descending into in case it nests a real type declaration.
            walk_children(node, source, file_path, line_index, ctx, outcome)
        }
        _ => {}
    }
}

fn walk_children(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &mut ParseContext,
    outcome: &mut ParseOutcome,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_top_level(&child, source, file_path, line_index, ctx, outcome);
    }
}

fn handle_package(node: &TsNode, source: &str, ctx: &mut ParseContext) {
    if let Some(name_node) = node.child_by_field_name("name").or_else(|| find_child(node, "scoped_identifier")) {
        ctx.package = node_text(&name_node, source).to_string();
    }
}

fn handle_import(node: &TsNode, source: &str, ctx: &ParseContext, outcome: &mut ParseOutcome) {
    let is_static = node.child_by_field_name("static").is_some()
        || find_token(node, "static").is_some();
    let is_wildcard = find_token(node, "*").is_some();
    let path_node = node
        .child_by_field_name("name")
        .or_else(|| find_child(node, "scoped_identifier"))
        .or_else(|| find_child(node, "identifier"));
    let path = path_node.map(|n| node_text(&n, source).to_string()).unwrap_or_default();

    let imports = outcome
        .imports
        .get_or_insert_with(|| FileImports {
            file_path: ctx.file_path.clone(),
            package: ctx.package.clone(),
            imports: Vec::new(),
        });
    imports.imports.push(ImportDecl {
        path,
        is_static,
        is_wildcard,
    });
}

fn class_decl_kind(node: &TsNode) -> ClassDeclKind {
    match node.kind() {
        "record_declaration" => ClassDeclKind::Record,
        _ => ClassDeclKind::Class,
    }
}

fn get_modifiers(node: &TsNode, source: &str) -> Vec<Modifier> {
    let Some(mods_node) = find_child(node, "modifiers") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = mods_node.walk();
    for child in mods_node.children(&mut cursor) {
        let text = node_text(&child, source);
        let m = match text {
            "public" => Some(Modifier::Public),
            "private" => Some(Modifier::Private),
            "protected" => Some(Modifier::Protected),
            "static" => Some(Modifier::Static),
            "final" => Some(Modifier::Final),
            "abstract" => Some(Modifier::Abstract),
            _ => None,
        };
        if let Some(m) = m {
            out.push(m);
        }
    }
    out
}

fn find_child<'a>(node: &TsNode<'a>, kind: &str) -> Option<TsNode<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

fn find_token<'a>(node: &TsNode<'a>, text_kind: &str) -> Option<TsNode<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == text_kind)
}

fn handle_class(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &mut ParseContext,
    outcome: &mut ParseOutcome,
    decl_kind: ClassDeclKind,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let simple_name = node_text(&name_node, source).to_string();
    let fqn = ctx.build_fqn(&simple_name);
    let node_id = id::class_id(&fqn);

    let extends = node
        .child_by_field_name("superclass")
        .map(|n| extract_type_name(&n, source));
    let implements = node
        .child_by_field_name("interfaces")
        .map(|n| extract_type_list(&n, source))
        .unwrap_or_default();
    let modifiers = get_modifiers(node, source);

    outcome.nodes.push(Node {
        id: node_id.clone(),
        file_path: file_path.to_string(),
        line_range: node_span(node, line_index),
        source_code: node_text(node, source).to_string(),
        attrs: NodeAttrs::Class(ClassAttrs {
            simple_name,
            fqn,
            extends,
            implements,
            modifiers,
            decl_kind,
        }),
    });

    let parent_id = id::module_id(&ctx.package);
    outcome.edges.push(Edge::new(parent_id.clone(), EdgeLabel::ParentOf, node_id.clone(), true));
    outcome.edges.push(Edge::new(node_id.clone(), EdgeLabel::ChildOf, parent_id, true));

    ctx.class_stack.push(node_text(&name_node, source).to_string());
    if let Some(body) = node.child_by_field_name("body") {
        walk_type_body(&body, source, file_path, line_index, ctx, outcome, &node_id);
    }
    ctx.class_stack.pop();
}

fn handle_interface(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &mut ParseContext,
    outcome: &mut ParseOutcome,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let simple_name = node_text(&name_node, source).to_string();
    let fqn = ctx.build_fqn(&simple_name);
    let node_id = id::interface_id(&fqn);

    let extends = node
        .child_by_field_name("interfaces")
        .or_else(|| node.child_by_field_name("extends_interfaces"))
        .map(|n| extract_type_list(&n, source))
        .unwrap_or_default();
    let modifiers = get_modifiers(node, source);

    outcome.nodes.push(Node {
        id: node_id.clone(),
        file_path: file_path.to_string(),
        line_range: node_span(node, line_index),
        source_code: node_text(node, source).to_string(),
        attrs: NodeAttrs::Interface(InterfaceAttrs {
            simple_name,
            fqn,
            extends,
            modifiers,
        }),
    });

    let parent_id = id::module_id(&ctx.package);
    outcome.edges.push(Edge::new(parent_id.clone(), EdgeLabel::ParentOf, node_id.clone(), true));
    outcome.edges.push(Edge::new(node_id.clone(), EdgeLabel::ChildOf, parent_id, true));

    ctx.class_stack.push(node_text(&name_node, source).to_string());
    if let Some(body) = node.child_by_field_name("body") {
        walk_type_body(&body, source, file_path, line_index, ctx, outcome, &node_id);
    }
    ctx.class_stack.pop();
}

/// `enum` becomes a `Class` node; its constants become `Field` nodes since
/// the node kind set has no `Constant`.
fn handle_enum(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &mut ParseContext,
    outcome: &mut ParseOutcome,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let simple_name = node_text(&name_node, source).to_string();
    let fqn = ctx.build_fqn(&simple_name);
    let node_id = id::class_id(&fqn);

    let implements = node
        .child_by_field_name("interfaces")
        .map(|n| extract_type_list(&n, source))
        .unwrap_or_default();
    let modifiers = get_modifiers(node, source);

    outcome.nodes.push(Node {
        id: node_id.clone(),
        file_path: file_path.to_string(),
        line_range: node_span(node, line_index),
        source_code: node_text(node, source).to_string(),
        attrs: NodeAttrs::Class(ClassAttrs {
            simple_name,
            fqn: fqn.clone(),
            extends: None,
            implements,
            modifiers,
            decl_kind: ClassDeclKind::Enum,
        }),
    });

    let parent_id = id::module_id(&ctx.package);
    outcome.edges.push(Edge::new(parent_id.clone(), EdgeLabel::ParentOf, node_id.clone(), true));
    outcome.edges.push(Edge::new(node_id.clone(), EdgeLabel::ChildOf, parent_id, true));

    ctx.class_stack.push(node_text(&name_node, source).to_string());
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "enum_constant" => handle_enum_constant(&child, source, file_path, line_index, ctx, outcome, &node_id),
                "enum_body_declarations" => {
                    walk_type_body(&child, source, file_path, line_index, ctx, outcome, &node_id)
                }
                _ => {}
            }
        }
    }
    ctx.class_stack.pop();
}

fn handle_enum_constant(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &ParseContext,
    outcome: &mut ParseOutcome,
    owner_id: &str,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let simple_name = node_text(&name_node, source).to_string();
    let field_id = id::field_id(&ctx.enclosing_fqn(), &simple_name);

    outcome.nodes.push(Node {
        id: field_id.clone(),
        file_path: file_path.to_string(),
        line_range: node_span(node, line_index),
        source_code: node_text(node, source).to_string(),
        attrs: NodeAttrs::Field(FieldAttrs {
            owner_fqn: ctx.enclosing_fqn(),
            simple_name,
            declared_type: ctx.class_stack.last().cloned().unwrap_or_default(),
            modifiers: vec![Modifier::Public, Modifier::Static, Modifier::Final],
        }),
    });
    outcome.edges.push(Edge::new(owner_id.to_string(), EdgeLabel::ParentOf, field_id.clone(), true));
    outcome.edges.push(Edge::new(field_id, EdgeLabel::ChildOf, owner_id.to_string(), true));
}

fn walk_type_body(
    body: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &mut ParseContext,
    outcome: &mut ParseOutcome,
    owner_id: &str,
) {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "method_declaration" => handle_method(&child, source, file_path, line_index, ctx, outcome, owner_id),
            "constructor_declaration" => {
                handle_constructor(&child, source, file_path, line_index, ctx, outcome, owner_id)
            }
            "field_declaration" => handle_field(&child, source, file_path, line_index, ctx, outcome, owner_id),
            "class_declaration" | "record_declaration" => {
                handle_class(&child, source, file_path, line_index, ctx, outcome, class_decl_kind(&child))
            }
            "interface_declaration" => handle_interface(&child, source, file_path, line_index, ctx, outcome),
            "enum_declaration" => handle_enum(&child, source, file_path, line_index, ctx, outcome),
            _ => {}
        }
    }
}

fn extract_type_name(node: &TsNode, source: &str) -> String {
    // `superclass` wraps a single type; descend past the wrapper if present.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "extends" {
            return node_text(&child, source).to_string();
        }
    }
    node_text(node, source).to_string()
}

fn extract_type_list(node: &TsNode, source: &str) -> Vec<String> {
    // `super_interfaces` wraps a `type_list`.
    let list_node = find_child(node, "type_list").unwrap_or(*node);
    let mut cursor = list_node.walk();
    list_node
        .children(&mut cursor)
        .filter(|c| c.is_named() && c.kind() != "extends" && c.kind() != "implements")
        .map(|c| node_text(&c, source).to_string())
        .collect()
}

fn method_signature(node: &TsNode, source: &str) -> (Vec<Param>, String) {
    let mut params = Vec::new();
    if let Some(params_node) = node.child_by_field_name("parameters") {
        let mut cursor = params_node.walk();
        for p in params_node.children(&mut cursor) {
            if p.kind() != "formal_parameter" && p.kind() != "spread_parameter" {
                continue;
            }
            let type_node = p.child_by_field_name("type");
            let name_node = p.child_by_field_name("name").or_else(|| find_child(&p, "identifier"));
            let mut type_text = type_node.map(|n| node_text(&n, source).to_string()).unwrap_or_default();
            if p.kind() == "spread_parameter" && !type_text.ends_with("...") {
                type_text.push_str("...");
            }
            params.push(Param {
                name: name_node.map(|n| node_text(&n, source).to_string()).unwrap_or_default(),
                type_name: type_text,
            });
        }
    }
    let erased: Vec<String> = params.iter().map(|p| p.type_name.clone()).collect();
    let sig = build_signature(&erased);
    (params, sig)
}

fn handle_method(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &ParseContext,
    outcome: &mut ParseOutcome,
    owner_id: &str,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let simple_name = node_text(&name_node, source).to_string();
    let owner_fqn = ctx.enclosing_fqn();
    let (params, signature) = method_signature(node, source);
    let return_type = node
        .child_by_field_name("type")
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_else(|| "void".to_string());
    let modifiers = get_modifiers(node, source);
    let is_static = modifiers.contains(&Modifier::Static);
    let body = node.child_by_field_name("body");
    let is_abstract = modifiers.contains(&Modifier::Abstract) || body.is_none();

    let node_id = id::method_id(&owner_fqn, &simple_name, &signature);

    outcome.nodes.push(Node {
        id: node_id.clone(),
        file_path: file_path.to_string(),
        line_range: node_span(node, line_index),
        source_code: node_text(node, source).to_string(),
        attrs: NodeAttrs::Method(MethodAttrs {
            simple_name,
            owner_fqn,
            return_type,
            params,
            signature,
            is_static,
            modifiers,
            is_abstract,
        }),
    });
    outcome.edges.push(Edge::new(owner_id.to_string(), EdgeLabel::ParentOf, node_id.clone(), true));
    outcome.edges.push(Edge::new(node_id.clone(), EdgeLabel::ChildOf, owner_id.to_string(), true));

    if let Some(body) = body {
        collect_expr_sites(&body, source, &node_id, outcome);
    }
}

fn handle_constructor(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &ParseContext,
    outcome: &mut ParseOutcome,
    owner_id: &str,
) {
    let owner_fqn = ctx.enclosing_fqn();
    let (params, signature) = method_signature(node, source);
    let modifiers = get_modifiers(node, source);
    let node_id = id::constructor_id(&owner_fqn, &signature);

    outcome.nodes.push(Node {
        id: node_id.clone(),
        file_path: file_path.to_string(),
        line_range: node_span(node, line_index),
        source_code: node_text(node, source).to_string(),
        attrs: NodeAttrs::Constructor(ConstructorAttrs {
            owner_fqn,
            params,
            signature,
            modifiers,
        }),
    });
    outcome.edges.push(Edge::new(owner_id.to_string(), EdgeLabel::ParentOf, node_id.clone(), true));
    outcome.edges.push(Edge::new(node_id.clone(), EdgeLabel::ChildOf, owner_id.to_string(), true));

    if let Some(body) = node.child_by_field_name("body") {
        collect_expr_sites(&body, source, &node_id, outcome);
    }
}

fn handle_field(
    node: &TsNode,
    source: &str,
    file_path: &str,
    line_index: &LineIndex,
    ctx: &ParseContext,
    outcome: &mut ParseOutcome,
    owner_id: &str,
) {
    let owner_fqn = ctx.enclosing_fqn();
    let modifiers = get_modifiers(node, source);
    let declared_type = node
        .child_by_field_name("type")
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_default();

    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        let simple_name = node_text(&name_node, source).to_string();
        let node_id = id::field_id(&owner_fqn, &simple_name);

        outcome.nodes.push(Node {
            id: node_id.clone(),
            file_path: file_path.to_string(),
            line_range: node_span(node, line_index),
            source_code: node_text(node, source).to_string(),
            attrs: NodeAttrs::Field(FieldAttrs {
                owner_fqn: owner_fqn.clone(),
                simple_name,
                declared_type: declared_type.clone(),
                modifiers: modifiers.clone(),
            }),
        });
        outcome.edges.push(Edge::new(owner_id.to_string(), EdgeLabel::ParentOf, node_id.clone(), true));
        outcome.edges.push(Edge::new(node_id, EdgeLabel::ChildOf, owner_id.to_string(), true));
    }
}

/// Walks a method/constructor body collecting [`ExprSite`]s in source order.
/// Stops at nested type declarations (local/anonymous classes) — those
/// bodies get their own containment subtree but their call sites are out of
/// scope here.
fn collect_expr_sites(body: &TsNode, source: &str, owner_id: &str, outcome: &mut ParseOutcome) {
    walk_expr_sites(body, source, owner_id, outcome);
}

fn walk_expr_sites(node: &TsNode, source: &str, owner_id: &str, outcome: &mut ParseOutcome) {
    match node.kind() {
        "local_variable_declaration" => {
            let declared_type = node
                .child_by_field_name("type")
                .map(|n| node_text(&n, source).to_string())
                .unwrap_or_default();
            let mut c = node.walk();
            for declarator in node.children(&mut c) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name_node) = declarator.child_by_field_name("name") {
                    outcome.expr_sites.push(ExprSite::LocalVarDecl {
                        owner_id: owner_id.to_string(),
                        var_name: node_text(&name_node, source).to_string(),
                        declared_type: declared_type.clone(),
                    });
                }
            }
        }
        "method_invocation" => {
            let receiver = node
                .child_by_field_name("object")
                .map(|obj| match obj.kind() {
                    "this" => Receiver::This,
                    "super" => Receiver::Super,
                    "identifier" => Receiver::Identifier(node_text(&obj, source).to_string()),
                    _ => Receiver::Identifier(node_text(&obj, source).to_string()),
                })
                .unwrap_or(Receiver::Implicit);
            let method_name = node
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string())
                .unwrap_or_default();
            let arg_count = node
                .child_by_field_name("arguments")
                .map(|a| count_args(&a))
                .unwrap_or(0);
            outcome.expr_sites.push(ExprSite::MethodCall {
                owner_id: owner_id.to_string(),
                receiver,
                method_name,
                arg_count,
            });
        }
        "object_creation_expression" => {
            let type_name = node
                .child_by_field_name("type")
                .map(|n| node_text(&n, source).to_string())
                .unwrap_or_default();
            let arg_count = node
                .child_by_field_name("arguments")
                .map(|a| count_args(&a))
                .unwrap_or(0);
            outcome.expr_sites.push(ExprSite::Instantiation {
                owner_id: owner_id.to_string(),
                type_name,
                arg_count,
            });
        }
        "class_declaration" | "interface_declaration" | "enum_declaration" | "lambda_expression" => {
            // New scope; don't attribute its internals to this owner_id.
            return;
        }
        _ => {}
    }

    let mut c = node.walk();
    for child in node.children(&mut c) {
        walk_expr_sites(&child, source, owner_id, outcome);
    }
}

fn count_args(arg_list: &TsNode) -> usize {
    let mut cursor = arg_list.walk();
    arg_list.children(&mut cursor).filter(|c| c.is_named()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::NodeKind;

    fn parse(src: &str) -> ParseOutcome {
        let mut h = JavaHarness::new();
        h.parse(src, "Test.java").expect("parse should not hard-fail")
    }

    #[test]
    fn parses_simple_class() {
        let out = parse("package com.example;\nclass Foo {}\n");
        let class = out.nodes.iter().find(|n| n.kind() == NodeKind::Class).unwrap();
        match &class.attrs {
            NodeAttrs::Class(a) => assert_eq!(a.fqn, "com.example.Foo"),
            _ => panic!("expected class"),
        }
    }

    #[test]
    fn parses_interface_with_extends() {
        let out = parse("interface A extends B, C {}\n");
        let iface = out.nodes.iter().find(|n| n.kind() == NodeKind::Interface).unwrap();
        match &iface.attrs {
            NodeAttrs::Interface(a) => assert_eq!(a.extends, vec!["B".to_string(), "C".to_string()]),
            _ => panic!("expected interface"),
        }
    }

    #[test]
    fn parses_enum_as_class_with_constants_as_fields() {
        let out = parse("enum Color { RED, GREEN }\n");
        let class = out.nodes.iter().find(|n| n.kind() == NodeKind::Class).unwrap();
        match &class.attrs {
            NodeAttrs::Class(a) => assert_eq!(a.decl_kind, ClassDeclKind::Enum),
            _ => panic!("expected class"),
        }
        let field_names: Vec<_> = out
            .nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Field)
            .filter_map(|n| match &n.attrs {
                NodeAttrs::Field(f) => Some(f.simple_name.clone()),
                _ => None,
            })
            .collect();
        assert!(field_names.contains(&"RED".to_string()));
        assert!(field_names.contains(&"GREEN".to_string()));
    }

    #[test]
    fn parses_inheritance() {
        let out = parse("class Child extends Parent implements Runnable {}\n");
        let class = out.nodes.iter().find(|n| n.kind() == NodeKind::Class).unwrap();
        match &class.attrs {
            NodeAttrs::Class(a) => {
                assert_eq!(a.extends, Some("Parent".to_string()));
                assert_eq!(a.implements, vec!["Runnable".to_string()]);
            }
            _ => panic!("expected class"),
        }
    }

    #[test]
    fn parses_imports() {
        let out = parse("import java.util.List;\nimport static java.lang.Math.*;\nclass Foo {}\n");
        let imports = out.imports.unwrap();
        assert_eq!(imports.imports.len(), 2);
        assert_eq!(imports.imports[0].path, "java.util.List");
        assert!(imports.imports[1].is_static);
        assert!(imports.imports[1].is_wildcard);
    }

    #[test]
    fn parses_nested_classes_with_dotted_fqn() {
        let out = parse("class Outer { class Inner {} }\n");
        let inner = out
            .nodes
            .iter()
            .find(|n| matches!(&n.attrs, NodeAttrs::Class(a) if a.simple_name == "Inner"))
            .unwrap();
        match &inner.attrs {
            NodeAttrs::Class(a) => assert_eq!(a.fqn, "Outer.Inner"),
            _ => panic!("expected class"),
        }
    }

    #[test]
    fn parses_method_signature_with_generics_erased() {
        let out = parse("class Foo { void bar(java.util.List<String> xs) {} }\n");
        let method = out.nodes.iter().find(|n| n.kind() == NodeKind::Method).unwrap();
        match &method.attrs {
            NodeAttrs::Method(m) => assert_eq!(m.signature, "(List)"),
            _ => panic!("expected method"),
        }
    }

    #[test]
    fn captures_method_call_and_instantiation_sites() {
        let out = parse(
            "class Foo { void bar() { Helper h = new Helper(); h.run(1, 2); other(); } }\n",
        );
        let has_local = out.expr_sites.iter().any(|s| matches!(s, ExprSite::LocalVarDecl { var_name, .. } if var_name == "h"));
        let has_instantiation = out
            .expr_sites
            .iter()
            .any(|s| matches!(s, ExprSite::Instantiation { type_name, .. } if type_name == "Helper"));
        let has_call = out
            .expr_sites
            .iter()
            .any(|s| matches!(s, ExprSite::MethodCall { method_name, receiver: Receiver::Identifier(r), .. } if method_name == "run" && r == "h"));
        let has_implicit_call = out
            .expr_sites
            .iter()
            .any(|s| matches!(s, ExprSite::MethodCall { method_name, receiver: Receiver::Implicit, .. } if method_name == "other"));
        assert!(has_local);
        assert!(has_instantiation);
        assert!(has_call);
        assert!(has_implicit_call);
    }

    #[test]
    fn empty_file_still_emits_module_node() {
        let out = parse("// just a comment\n");
        assert_eq!(out.nodes.len(), 1);
        assert_eq!(out.nodes[0].kind(), NodeKind::Module);
    }

    #[test]
    fn malformed_java_reports_diagnostic_but_does_not_panic() {
        let out = parse("class Foo { void bar( {{{ \n");
        assert!(out.diagnostics.iter().any(|d| matches!(d, Diagnostic::ParseError { .. })));
    }

    #[test]
    fn abstract_method_without_body_is_flagged() {
        let out = parse("abstract class Foo { abstract void bar(); }\n");
        let method = out.nodes.iter().find(|n| n.kind() == NodeKind::Method).unwrap();
        match &method.attrs {
            NodeAttrs::Method(m) => assert!(m.is_abstract),
            _ => panic!("expected method"),
        }
    }
}
