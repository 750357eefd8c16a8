//! # Fragments
//!
//! A fragment is the flat, individually addressable unit of persisted model
//! data: a unique identifier, a type tag, an optional parent reference, and
//! whatever type-specific attributes the element carries. Fragments are what
//! the version-control backend stores and transports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const PROJECT_TYPE: &str = "Project";
const DIAGRAM_DEFAULT_ATTR: &str = "defaultDiagram";
const VIEW_MODEL_ATTR: &str = "model";
const VIEW_FILL_ATTR: &str = "fillColor";
const VIEW_VISIBLE_ATTR: &str = "visible";

/// Reference to another fragment by identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ref {
    #[serde(rename = "$ref")]
    pub id: String,
}

impl Ref {
    pub fn to(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One persisted model element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fragment {
    /// Unique element identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Element type tag (e.g. "Project", "UMLClass", "UMLClassDiagram")
    #[serde(rename = "_type")]
    pub type_tag: String,

    /// Containing element, if any (the project root has none)
    #[serde(rename = "_parent", skip_serializing_if = "Option::is_none")]
    pub parent: Option<Ref>,

    /// Type-specific attributes, kept opaque
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Fragment {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            parent: None,
            attributes: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(Ref::to(parent_id));
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Is this fragment the project root?
    pub fn is_project_root(&self) -> bool {
        self.type_tag == PROJECT_TYPE
    }

    /// Identifier of the parent fragment, if any
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|r| r.id.as_str())
    }
}

/// Classification of a fragment acting as a container
///
/// Decided by which attribute sets are present on the parent, and it in turn
/// decides which ordered child collection an incoming child joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Carries a default-diagram marker; children go into `ownedViews`
    Diagram,
    /// Carries view-rendering attributes; children go into `subViews`
    View,
    /// Everything else; children go into `ownedElements`
    StructuralElement,
}

impl ContainerKind {
    /// Classify a fragment by probing its attributes, once, at assembly time
    pub fn classify(fragment: &Fragment) -> Self {
        if fragment.attributes.contains_key(DIAGRAM_DEFAULT_ATTR) {
            ContainerKind::Diagram
        } else if fragment.attributes.contains_key(VIEW_MODEL_ATTR)
            || fragment.attributes.contains_key(VIEW_FILL_ATTR)
            || fragment.attributes.contains_key(VIEW_VISIBLE_ATTR)
        {
            ContainerKind::View
        } else {
            ContainerKind::StructuralElement
        }
    }

    /// Name of the child collection this kind owns
    pub fn child_collection(&self) -> &'static str {
        match self {
            ContainerKind::Diagram => "ownedViews",
            ContainerKind::View => "subViews",
            ContainerKind::StructuralElement => "ownedElements",
        }
    }
}
