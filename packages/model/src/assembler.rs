//! # Fragment Graph Assembly
//!
//! Converts the flat fragment mapping of one working copy into the single
//! rooted project tree.
//!
//! ## Design
//!
//! - Exactly one `Project`-typed fragment may exist per batch; it becomes
//!   the root. Zero or several is a load-time error.
//! - Every parent reference must resolve within the same batch. A dangling
//!   reference fails the whole load; nothing is silently dropped.
//! - Each parent is classified as Diagram / View / StructuralElement once,
//!   and children are appended to the matching collection in identifier
//!   order, so assembly is deterministic for a given batch.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::fragment::ContainerKind;
use crate::store::FragmentStore;
use crate::tree::{ModelNode, ProjectTree};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("fragment {fragment} references parent {parent} which is not in the batch")]
    DanglingReference { fragment: String, parent: String },

    #[error("expected exactly one Project fragment, found {found}")]
    RootCardinality { found: usize },
}

/// Assemble the single rooted project tree from a batch of fragments.
///
/// All assembled nodes start with `is_new = false`: elements that arrived
/// via synchronization are pre-existing, not newly authored. The caller
/// flips the tree's authoring default via [`ProjectTree::adopt`] once the
/// tree becomes the live model.
pub fn assemble(store: &FragmentStore) -> Result<ProjectTree, AssemblyError> {
    let mut root: Option<String> = None;
    let mut roots_found = 0usize;
    let mut nodes: BTreeMap<String, ModelNode> = BTreeMap::new();

    for fragment in store.iter() {
        if fragment.is_project_root() {
            roots_found += 1;
            root = Some(fragment.id.clone());
        }
        nodes.insert(fragment.id.clone(), ModelNode::from_fragment(fragment, false));
    }

    if roots_found != 1 {
        return Err(AssemblyError::RootCardinality { found: roots_found });
    }
    let root = root.expect("root id recorded alongside the count");

    // Link children in identifier order; the collection a child joins is
    // decided by its parent's container kind.
    for fragment in store.iter() {
        let parent_id = match fragment.parent_id() {
            Some(id) => id,
            None => continue,
        };
        if !store.contains(parent_id) {
            return Err(AssemblyError::DanglingReference {
                fragment: fragment.id.clone(),
                parent: parent_id.to_string(),
            });
        }
        let parent = nodes
            .get_mut(parent_id)
            .expect("every store fragment was materialized as a node");
        parent.children_mut().push(fragment.id.clone());
    }

    debug!(
        root = %root,
        fragments = store.len(),
        "assembled project tree"
    );
    Ok(ProjectTree::new(root, nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use serde_json::json;

    fn store(fragments: Vec<Fragment>) -> FragmentStore {
        fragments.into_iter().collect()
    }

    #[test]
    fn test_assemble_links_every_fragment() {
        let store = store(vec![
            Fragment::new("p", "Project"),
            Fragment::new("m", "UMLModel").with_parent("p"),
            Fragment::new("c1", "UMLClass").with_parent("m"),
            Fragment::new("c2", "UMLClass").with_parent("m"),
        ]);

        let tree = assemble(&store).unwrap();
        assert_eq!(tree.root(), "p");
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.node("m").unwrap().owned_elements, vec!["c1", "c2"]);
        assert!(!tree.new_by_default());
    }

    #[test]
    fn test_assemble_no_root_fails() {
        let store = store(vec![Fragment::new("m", "UMLModel")]);
        assert_eq!(
            assemble(&store),
            Err(AssemblyError::RootCardinality { found: 0 })
        );
    }

    #[test]
    fn test_assemble_two_roots_fails() {
        let store = store(vec![
            Fragment::new("p1", "Project"),
            Fragment::new("p2", "Project"),
        ]);
        assert_eq!(
            assemble(&store),
            Err(AssemblyError::RootCardinality { found: 2 })
        );
    }

    #[test]
    fn test_assemble_dangling_parent_fails() {
        let store = store(vec![
            Fragment::new("p", "Project"),
            Fragment::new("c", "UMLClass").with_parent("ghost"),
        ]);
        assert_eq!(
            assemble(&store),
            Err(AssemblyError::DanglingReference {
                fragment: "c".to_string(),
                parent: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_diagram_parent_collects_owned_views() {
        let store = store(vec![
            Fragment::new("p", "Project"),
            Fragment::new("d", "UMLClassDiagram")
                .with_parent("p")
                .with_attribute("defaultDiagram", json!(true)),
            // Child type is irrelevant; the parent's kind decides
            Fragment::new("s", "UMLClass").with_parent("d"),
        ]);

        let tree = assemble(&store).unwrap();
        assert_eq!(tree.node("p").unwrap().owned_elements, vec!["d"]);
        assert_eq!(tree.node("d").unwrap().owned_views, vec!["s"]);
        assert!(tree.node("d").unwrap().sub_views.is_empty());
    }

    #[test]
    fn test_view_parent_collects_sub_views() {
        let store = store(vec![
            Fragment::new("p", "Project"),
            Fragment::new("v", "UMLClassView")
                .with_parent("p")
                .with_attribute("fillColor", json!("#ffffff")),
            Fragment::new("n", "UMLNameCompartmentView").with_parent("v"),
        ]);

        let tree = assemble(&store).unwrap();
        assert_eq!(tree.node("v").unwrap().sub_views, vec!["n"]);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let fragments = vec![
            Fragment::new("p", "Project"),
            Fragment::new("b", "UMLModel").with_parent("p"),
            Fragment::new("a", "UMLModel").with_parent("p"),
            Fragment::new("z", "UMLClass").with_parent("a"),
        ];

        let first = assemble(&store(fragments.clone())).unwrap();
        let mut shuffled = fragments;
        shuffled.reverse();
        let second = assemble(&store(shuffled)).unwrap();

        assert_eq!(first, second);
        // Identifier-ordered children regardless of input order
        assert_eq!(first.node("p").unwrap().owned_elements, vec!["a", "b"]);
    }

    #[test]
    fn test_node_count_matches_fragment_count() {
        let store = store(vec![
            Fragment::new("p", "Project"),
            Fragment::new("m", "UMLModel").with_parent("p"),
            Fragment::new("d", "UMLClassDiagram")
                .with_parent("m")
                .with_attribute("defaultDiagram", json!(true)),
            Fragment::new("v", "UMLClassView").with_parent("d"),
        ]);

        let tree = assemble(&store).unwrap();
        assert_eq!(tree.node_count(), store.len());
    }
}
