//! # Fragment Store
//!
//! The flat identifier → fragment mapping for one working copy, as loaded
//! from fragment files. Iteration is identifier-ordered so downstream
//! assembly is deterministic for a given batch.

use std::collections::btree_map;
use std::collections::BTreeMap;

use atelier_common::CommonResult;

use crate::fragment::Fragment;

/// Flat mapping of fragment identifier → fragment payload
#[derive(Debug, Clone, Default)]
pub struct FragmentStore {
    fragments: BTreeMap<String, Fragment>,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `(identifier, raw JSON)` pairs as produced by fragment storage
    pub fn from_raw<I>(raw: I) -> CommonResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut store = Self::new();
        for (_, json) in raw {
            let fragment: Fragment = serde_json::from_str(&json)?;
            store.insert(fragment);
        }
        Ok(store)
    }

    /// Insert a fragment, keyed by its own identifier
    pub fn insert(&mut self, fragment: Fragment) {
        self.fragments.insert(fragment.id.clone(), fragment);
    }

    pub fn get(&self, id: &str) -> Option<&Fragment> {
        self.fragments.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fragments.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Identifier-ordered iteration
    pub fn iter(&self) -> btree_map::Values<'_, String, Fragment> {
        self.fragments.values()
    }
}

impl FromIterator<Fragment> for FragmentStore {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        let mut store = Self::new();
        for fragment in iter {
            store.insert(fragment);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_parses_fragments() {
        let raw = vec![
            ("b".to_string(), r#"{"_id":"b","_type":"UMLModel","_parent":{"$ref":"a"}}"#.to_string()),
            ("a".to_string(), r#"{"_id":"a","_type":"Project"}"#.to_string()),
        ];

        let store = FragmentStore::from_raw(raw).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("a").unwrap().is_project_root());
        assert_eq!(store.get("b").unwrap().parent_id(), Some("a"));
    }

    #[test]
    fn test_from_raw_rejects_bad_json() {
        let raw = vec![("x".to_string(), "not json".to_string())];
        assert!(FragmentStore::from_raw(raw).is_err());
    }

    #[test]
    fn test_iteration_is_identifier_ordered() {
        let store: FragmentStore = vec![
            Fragment::new("c", "UMLModel"),
            Fragment::new("a", "Project"),
            Fragment::new("b", "UMLModel"),
        ]
        .into_iter()
        .collect();

        let ids: Vec<&str> = store.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
