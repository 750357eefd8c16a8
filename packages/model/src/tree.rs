//! # Project Tree
//!
//! The assembled hierarchical model. Nodes live in an identifier-keyed arena
//! and reference each other by id, which keeps lookups cheap for the
//! operation gate and makes flattening back into fragments trivial.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::fragment::{ContainerKind, Fragment, Ref};

/// One element of the live model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub id: String,
    pub type_tag: String,
    pub parent: Option<String>,

    /// Container classification, decided once when the node is created
    pub kind: ContainerKind,

    /// Type-specific attributes, kept opaque
    pub attributes: Map<String, Value>,

    /// Ordered children of structural containers
    pub owned_elements: Vec<String>,
    /// Ordered children of diagrams
    pub owned_views: Vec<String>,
    /// Ordered children of views
    pub sub_views: Vec<String>,

    /// Newly authored in this session, not yet round-tripped to the remote.
    /// New elements are implicitly owned by their creator and exempt from
    /// lock checks until the next synchronization.
    pub is_new: bool,
}

impl ModelNode {
    pub fn from_fragment(fragment: &Fragment, is_new: bool) -> Self {
        Self {
            id: fragment.id.clone(),
            type_tag: fragment.type_tag.clone(),
            parent: fragment.parent_id().map(str::to_string),
            kind: ContainerKind::classify(fragment),
            attributes: fragment.attributes.clone(),
            owned_elements: Vec::new(),
            owned_views: Vec::new(),
            sub_views: Vec::new(),
            is_new,
        }
    }

    /// Flatten back into the persisted fragment form
    pub fn to_fragment(&self) -> Fragment {
        Fragment {
            id: self.id.clone(),
            type_tag: self.type_tag.clone(),
            parent: self.parent.clone().map(Ref::to),
            attributes: self.attributes.clone(),
        }
    }

    /// The child collection this node hands to incoming children
    pub fn children(&self) -> &Vec<String> {
        match self.kind {
            ContainerKind::Diagram => &self.owned_views,
            ContainerKind::View => &self.sub_views,
            ContainerKind::StructuralElement => &self.owned_elements,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<String> {
        match self.kind {
            ContainerKind::Diagram => &mut self.owned_views,
            ContainerKind::View => &mut self.sub_views,
            ContainerKind::StructuralElement => &mut self.owned_elements,
        }
    }

    /// All child ids across the three collections
    pub fn all_children(&self) -> impl Iterator<Item = &String> {
        self.owned_elements
            .iter()
            .chain(self.owned_views.iter())
            .chain(self.sub_views.iter())
    }
}

/// The single rooted result of assembly, adopted as the live model
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTree {
    root: String,
    nodes: BTreeMap<String, ModelNode>,

    /// Default `is_new` for elements created against this tree. False while
    /// the tree is being assembled from synchronized fragments, true once
    /// the tree has been adopted as the live model and edits are authoring.
    new_by_default: bool,
}

impl ProjectTree {
    pub(crate) fn new(root: String, nodes: BTreeMap<String, ModelNode>) -> Self {
        Self {
            root,
            nodes,
            new_by_default: false,
        }
    }

    /// Adopt this tree as the live model: elements created from now on are
    /// newly authored rather than synchronized.
    pub fn adopt(&mut self) {
        self.new_by_default = true;
    }

    pub fn new_by_default(&self) -> bool {
        self.new_by_default
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&ModelNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut ModelNode> {
        self.nodes.get_mut(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.parent.as_deref())
    }

    /// Identifier-ordered iteration over all nodes
    pub fn iter(&self) -> btree_map::Values<'_, String, ModelNode> {
        self.nodes.values()
    }

    /// Materialize a fragment into the tree under its parent reference.
    /// Returns false if the parent is absent.
    pub fn insert_fragment(&mut self, fragment: &Fragment) -> bool {
        let parent_id = match fragment.parent_id() {
            Some(id) => id.to_string(),
            None => return false,
        };
        if !self.nodes.contains_key(&parent_id) {
            return false;
        }

        let node = ModelNode::from_fragment(fragment, self.new_by_default);
        self.nodes.insert(node.id.clone(), node);
        self.attach_child(&parent_id, &fragment.id)
    }

    /// Append a child to the collection selected by the parent's kind and
    /// point the child back at the parent. Returns false if the parent is
    /// absent.
    pub fn attach_child(&mut self, parent_id: &str, child_id: &str) -> bool {
        match self.nodes.get_mut(parent_id) {
            Some(parent) => {
                let children = parent.children_mut();
                if !children.iter().any(|c| c == child_id) {
                    children.push(child_id.to_string());
                }
            }
            None => return false,
        }
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent = Some(parent_id.to_string());
        }
        true
    }

    /// Remove a child from all of the parent's collections and clear the
    /// child's parent reference
    pub fn detach_child(&mut self, parent_id: &str, child_id: &str) {
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.owned_elements.retain(|c| c != child_id);
            parent.owned_views.retain(|c| c != child_id);
            parent.sub_views.retain(|c| c != child_id);
        }
        if let Some(child) = self.nodes.get_mut(child_id) {
            if child.parent.as_deref() == Some(parent_id) {
                child.parent = None;
            }
        }
    }

    /// Ids of an element and all of its descendants, depth-first; empty if
    /// the element is absent
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut ids = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.all_children().cloned());
                ids.push(current);
            }
        }
        ids
    }

    /// Remove an element and all of its descendants. Returns the removed
    /// ids, depth-first; empty if the element is absent.
    pub fn remove_subtree(&mut self, id: &str) -> Vec<String> {
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }
        if let Some(parent_id) = self.parent_of(id).map(str::to_string) {
            self.detach_child(&parent_id, id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.all_children().cloned());
                removed.push(current);
            }
        }
        removed
    }

    /// Flatten the whole tree back into fragments, identifier-ordered
    pub fn to_fragments(&self) -> Vec<Fragment> {
        self.nodes.values().map(ModelNode::to_fragment).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;
    use crate::store::FragmentStore;
    use serde_json::json;

    fn small_tree() -> ProjectTree {
        let store: FragmentStore = vec![
            Fragment::new("p", "Project"),
            Fragment::new("m", "UMLModel").with_parent("p"),
            Fragment::new("c", "UMLClass").with_parent("m"),
        ]
        .into_iter()
        .collect();
        assemble(&store).unwrap()
    }

    #[test]
    fn test_insert_fragment_requires_parent() {
        let mut tree = small_tree();
        let orphan = Fragment::new("x", "UMLClass").with_parent("missing");
        assert!(!tree.insert_fragment(&orphan));
        assert!(!tree.contains("x"));
    }

    #[test]
    fn test_insert_fragment_respects_new_by_default() {
        let mut tree = small_tree();

        let before_adopt = Fragment::new("x", "UMLClass").with_parent("m");
        assert!(tree.insert_fragment(&before_adopt));
        assert!(!tree.node("x").unwrap().is_new);

        tree.adopt();
        let after_adopt = Fragment::new("y", "UMLClass").with_parent("m");
        assert!(tree.insert_fragment(&after_adopt));
        assert!(tree.node("y").unwrap().is_new);
    }

    #[test]
    fn test_subtree_ids_cover_descendants_without_removal() {
        let tree = small_tree();
        let mut ids = tree.subtree_ids("m");
        ids.sort();

        assert_eq!(ids, vec!["c", "m"]);
        assert!(tree.contains("m") && tree.contains("c"));
        assert!(tree.subtree_ids("missing").is_empty());
    }

    #[test]
    fn test_remove_subtree_removes_descendants() {
        let mut tree = small_tree();
        let removed = tree.remove_subtree("m");

        assert_eq!(removed.len(), 2);
        assert!(!tree.contains("m"));
        assert!(!tree.contains("c"));
        assert!(tree.node("p").unwrap().owned_elements.is_empty());
    }

    #[test]
    fn test_detach_and_reattach() {
        let mut tree = small_tree();
        tree.detach_child("m", "c");
        assert!(tree.parent_of("c").is_none());

        assert!(tree.attach_child("p", "c"));
        assert_eq!(tree.parent_of("c"), Some("p"));
        assert_eq!(tree.node("p").unwrap().owned_elements, vec!["m", "c"]);
    }

    #[test]
    fn test_to_fragments_roundtrip() {
        let tree = small_tree();
        let fragments = tree.to_fragments();
        assert_eq!(fragments.len(), 3);

        let store: FragmentStore = fragments.into_iter().collect();
        let rebuilt = assemble(&store).unwrap();
        assert_eq!(rebuilt.root(), tree.root());
        assert_eq!(rebuilt.node_count(), tree.node_count());
    }

    #[test]
    fn test_children_collection_follows_kind() {
        let mut node = ModelNode::from_fragment(
            &Fragment::new("d", "UMLClassDiagram").with_attribute("defaultDiagram", json!(true)),
            false,
        );
        node.children_mut().push("v".to_string());
        assert_eq!(node.owned_views, vec!["v"]);
        assert!(node.owned_elements.is_empty());
    }
}
