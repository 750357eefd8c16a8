//! Integration tests for the editor crate: assembled tree + governed gate

use atelier_editor::{
    GateError, LockViolation, Operation, OperationGate, PrimitiveEdit, MOVE_VIEWS,
};
use atelier_model::{assemble, Fragment, FragmentStore, ProjectTree};
use serde_json::json;

fn sample_tree() -> ProjectTree {
    let store: FragmentStore = vec![
        Fragment::new("1", "Project"),
        Fragment::new("2", "UMLClassDiagram")
            .with_parent("1")
            .with_attribute("defaultDiagram", json!(true)),
        Fragment::new("3", "UMLClassView")
            .with_parent("2")
            .with_attribute("fillColor", json!("#ffffff")),
        Fragment::new("5", "UMLModel").with_parent("1"),
    ]
    .into_iter()
    .collect();
    let mut tree = assemble(&store).unwrap();
    tree.adopt();
    tree
}

#[test]
fn test_assembled_scenario_collections() {
    let tree = sample_tree();

    // Project root collects the diagram structurally; the diagram collects
    // its child as a view.
    assert_eq!(tree.root(), "1");
    assert!(tree.node("1").unwrap().owned_elements.contains(&"2".to_string()));
    assert_eq!(tree.node("2").unwrap().owned_views, vec!["3"]);
}

#[test]
fn test_insert_under_element_locked_by_other_collaborator() {
    let mut tree = sample_tree();
    let mut gate = OperationGate::new("user-b");
    gate.set_governed(true);

    // User A holds the lock on element 5
    gate.locks_mut().lock("5", "user-a");

    let insert = Operation::new("add class").with(PrimitiveEdit::Insert {
        element: Fragment::new("9", "UMLClass").with_parent("5"),
    });
    let err = gate.propose(&mut tree, &insert).unwrap_err();
    assert_eq!(
        err,
        GateError::Violation(LockViolation::LockedByOther {
            element: "5".to_string(),
            owner: "user-a".to_string(),
        })
    );
    assert!(!tree.contains("9"));
}

#[test]
fn test_full_editing_session() {
    let mut tree = sample_tree();
    let mut gate = OperationGate::new("user-a");
    gate.set_governed(true);
    gate.locks_mut().lock("5", "user-a");

    // Create, then refine the new element without further locks
    let insert = Operation::new("add class").with(PrimitiveEdit::Insert {
        element: Fragment::new("9", "UMLClass").with_parent("5"),
    });
    gate.propose(&mut tree, &insert).unwrap();

    let refine = Operation::new("rename element").with(PrimitiveEdit::FieldAssign {
        element_id: "9".to_string(),
        field: "name".to_string(),
        value: json!("Order"),
    });
    gate.propose(&mut tree, &refine).unwrap();

    // Views move without a lock on the view itself, as long as the
    // container is workable
    gate.locks_mut().lock("2", "user-a");
    let move_views = Operation::new(MOVE_VIEWS).with(PrimitiveEdit::FieldAssign {
        element_id: "3".to_string(),
        field: "left".to_string(),
        value: json!(240),
    });
    gate.propose(&mut tree, &move_views).unwrap();

    let pending = gate.take_pending_changes();
    assert!(pending.contains("9"));
    assert!(pending.contains("3"));

    // After commit the committer's locks are released
    gate.locks_mut().unlock_owned("user-a");
    assert!(gate.locks().is_empty());
}

#[test]
fn test_rejected_batch_leaves_tree_structurally_unchanged() {
    let mut tree = sample_tree();
    let before = tree.clone();

    let mut gate = OperationGate::new("user-a");
    gate.set_governed(true);
    gate.locks_mut().lock("5", "user-a");

    // Second edit in the batch hits an unlocked element: nothing applies
    let batch = Operation::new("edit model")
        .with(PrimitiveEdit::FieldAssign {
            element_id: "5".to_string(),
            field: "name".to_string(),
            value: json!("Domain"),
        })
        .with(PrimitiveEdit::FieldAssign {
            element_id: "2".to_string(),
            field: "name".to_string(),
            value: json!("Main"),
        });
    assert!(gate.propose(&mut tree, &batch).is_err());
    assert_eq!(tree, before);
}
