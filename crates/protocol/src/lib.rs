//! The frozen node/edge/diagnostic schema. Every other crate in
//! the workspace builds on these types and nothing downstream may assume a
//! shape this crate doesn't publish.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod id;
pub mod signature;

/// Source span, 1-indexed and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self, file_line_count: u32) -> bool {
        self.start >= 1
            && self.end >= self.start
            && self.start <= file_line_count
            && self.end <= file_line_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Abstract,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
        };
        f.write_str(s)
    }
}

/// Enums and records are both emitted as `Class` nodes rather than a
/// distinct node kind, carrying this as a side flag rather than folding it
/// into `modifiers`, since it isn't a Java modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassDeclKind {
    Class,
    Enum,
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Class,
    Interface,
    Method,
    Constructor,
    Field,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Method => "method",
            NodeKind::Constructor => "constructor",
            NodeKind::Field => "field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAttrs {
    pub package_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAttrs {
    pub simple_name: String,
    pub fqn: String,
    /// Raw identifier or resolved FQN as captured at extraction time;
    /// never rewritten after node creation.
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub modifiers: Vec<Modifier>,
    pub decl_kind: ClassDeclKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAttrs {
    pub simple_name: String,
    pub fqn: String,
    pub extends: Vec<String>,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodAttrs {
    pub simple_name: String,
    pub owner_fqn: String,
    pub return_type: String,
    pub params: Vec<Param>,
    pub signature: String,
    pub is_static: bool,
    pub modifiers: Vec<Modifier>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorAttrs {
    pub owner_fqn: String,
    pub params: Vec<Param>,
    pub signature: String,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttrs {
    pub owner_fqn: String,
    pub simple_name: String,
    pub declared_type: String,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAttrs {
    Module(ModuleAttrs),
    Class(ClassAttrs),
    Interface(InterfaceAttrs),
    Method(MethodAttrs),
    Constructor(ConstructorAttrs),
    Field(FieldAttrs),
}

impl NodeAttrs {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeAttrs::Module(_) => NodeKind::Module,
            NodeAttrs::Class(_) => NodeKind::Class,
            NodeAttrs::Interface(_) => NodeKind::Interface,
            NodeAttrs::Method(_) => NodeKind::Method,
            NodeAttrs::Constructor(_) => NodeKind::Constructor,
            NodeAttrs::Field(_) => NodeKind::Field,
        }
    }
}

/// A node in the dependency graph. Serializes as a single flat
/// JSON object — `{id, kind, file_path, line_range, source_code,
/// ...kind-specific-fields}` — rather than the externally-tagged shape
/// `#[derive(Serialize)]` on `NodeAttrs` would otherwise produce, since the
/// frozen output schema merges the kind-specific fields into
/// the top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub file_path: String,
    pub line_range: LineRange,
    pub source_code: String,
    pub attrs: NodeAttrs,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.attrs.kind()
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error as _;

        let mut value = serde_json::json!({
            "id": self.id,
            "kind": self.kind(),
            "file_path": self.file_path,
            "line_range": self.line_range,
            "source_code": self.source_code,
        });
        let attrs_value = match &self.attrs {
            NodeAttrs::Module(a) => serde_json::to_value(a),
            NodeAttrs::Class(a) => serde_json::to_value(a),
            NodeAttrs::Interface(a) => serde_json::to_value(a),
            NodeAttrs::Method(a) => serde_json::to_value(a),
            NodeAttrs::Constructor(a) => serde_json::to_value(a),
            NodeAttrs::Field(a) => serde_json::to_value(a),
        }
        .map_err(S::Error::custom)?;

        if let (Some(obj), serde_json::Value::Object(attrs_obj)) =
            (value.as_object_mut(), attrs_value)
        {
            obj.extend(attrs_obj);
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let mut value = serde_json::Value::deserialize(deserializer)?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| D::Error::custom("node must be a JSON object"))?;

        let id = obj
            .remove("id")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| D::Error::custom("node missing id"))?;
        let kind: NodeKind = obj
            .remove("kind")
            .ok_or_else(|| D::Error::custom("node missing kind"))
            .and_then(|v| serde_json::from_value(v).map_err(D::Error::custom))?;
        let file_path = obj
            .remove("file_path")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| D::Error::custom("node missing file_path"))?;
        let line_range: LineRange = obj
            .remove("line_range")
            .ok_or_else(|| D::Error::custom("node missing line_range"))
            .and_then(|v| serde_json::from_value(v).map_err(D::Error::custom))?;
        let source_code = obj
            .remove("source_code")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| D::Error::custom("node missing source_code"))?;

        let rest = serde_json::Value::Object(obj.clone());
        let attrs = match kind {
            NodeKind::Module => NodeAttrs::Module(
                serde_json::from_value(rest).map_err(D::Error::custom)?,
            ),
            NodeKind::Class => {
                NodeAttrs::Class(serde_json::from_value(rest).map_err(D::Error::custom)?)
            }
            NodeKind::Interface => {
                NodeAttrs::Interface(serde_json::from_value(rest).map_err(D::Error::custom)?)
            }
            NodeKind::Method => {
                NodeAttrs::Method(serde_json::from_value(rest).map_err(D::Error::custom)?)
            }
            NodeKind::Constructor => {
                NodeAttrs::Constructor(serde_json::from_value(rest).map_err(D::Error::custom)?)
            }
            NodeKind::Field => {
                NodeAttrs::Field(serde_json::from_value(rest).map_err(D::Error::custom)?)
            }
        };

        Ok(Node {
            id,
            file_path,
            line_range,
            source_code,
            attrs,
        })
    }
}

/// The 14 edge labels (7 inverse pairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EdgeLabel {
    ParentOf,
    ChildOf,
    BaseClassOf,
    DerivedClassOf,
    Implements,
    ImplementedBy,
    Overrides,
    OverriddenBy,
    Calls,
    CalledBy,
    Instantiates,
    InstantiatedBy,
    Uses,
    UsedBy,
}

impl EdgeLabel {
    pub fn inverse(&self) -> EdgeLabel {
        match self {
            EdgeLabel::ParentOf => EdgeLabel::ChildOf,
            EdgeLabel::ChildOf => EdgeLabel::ParentOf,
            EdgeLabel::BaseClassOf => EdgeLabel::DerivedClassOf,
            EdgeLabel::DerivedClassOf => EdgeLabel::BaseClassOf,
            EdgeLabel::Implements => EdgeLabel::ImplementedBy,
            EdgeLabel::ImplementedBy => EdgeLabel::Implements,
            EdgeLabel::Overrides => EdgeLabel::OverriddenBy,
            EdgeLabel::OverriddenBy => EdgeLabel::Overrides,
            EdgeLabel::Calls => EdgeLabel::CalledBy,
            EdgeLabel::CalledBy => EdgeLabel::Calls,
            EdgeLabel::Instantiates => EdgeLabel::InstantiatedBy,
            EdgeLabel::InstantiatedBy => EdgeLabel::Instantiates,
            EdgeLabel::Uses => EdgeLabel::UsedBy,
            EdgeLabel::UsedBy => EdgeLabel::Uses,
        }
    }
}

/// An edge in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: String,
    pub label: EdgeLabel,
    pub dst: String,
    pub resolved: bool,
}

impl Edge {
    pub fn new(src: impl Into<String>, label: EdgeLabel, dst: impl Into<String>, resolved: bool) -> Self {
        Self {
            src: src.into(),
            label,
            dst: dst.into(),
            resolved,
        }
    }

    /// The matching inverse edge.
    pub fn inverse(&self) -> Edge {
        Edge {
            src: self.dst.clone(),
            label: self.label.inverse(),
            dst: self.src.clone(),
            resolved: self.resolved,
        }
    }
}

/// Non-fatal diagnostics accumulated during the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    ParseError {
        file_path: String,
        message: String,
    },
    DuplicateSymbol {
        id: String,
        file_path: String,
        line: u32,
    },
    UnresolvedReference {
        context_id: String,
        name: String,
    },
}

/// The one fatal error the analyzer can return. Everything else becomes a [`Diagnostic`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalyzerError {
    #[error("malformed span in {file_path}: {detail}")]
    MalformedSpan { file_path: String, detail: String },
}
