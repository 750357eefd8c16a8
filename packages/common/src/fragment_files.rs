//! # Fragment File Persistence
//!
//! A project working copy is a flat directory of fragment files, one JSON
//! file per model element, named `<id>.json`. This module abstracts that
//! storage so the sync layer can run against a real working copy or an
//! in-memory one in tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use crate::result::CommonResult;

/// Storage abstraction for fragment files in a working copy
pub trait FragmentFiles {
    /// List all fragment files as `(identifier, raw JSON)` pairs,
    /// ordered by identifier.
    fn list_fragment_files(&self, dir: &Path) -> CommonResult<Vec<(String, String)>>;

    /// Write one fragment file (used by the split step)
    fn write_fragment_file(&self, dir: &Path, id: &str, raw_json: &str) -> CommonResult<()>;
}

/// Real directory-backed fragment storage
pub struct DirectoryFragmentFiles;

impl FragmentFiles for DirectoryFragmentFiles {
    fn list_fragment_files(&self, dir: &Path) -> CommonResult<Vec<(String, String)>> {
        let mut fragments = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let raw = std::fs::read_to_string(&path)?;
            fragments.push((id, raw));
        }

        fragments.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(fragments)
    }

    fn write_fragment_file(&self, dir: &Path, id: &str, raw_json: &str) -> CommonResult<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(format!("{}.json", id)), raw_json)?;
        Ok(())
    }
}

/// In-memory fragment storage for testing
///
/// Cloning yields a handle onto the same underlying map, so a test can
/// inspect or inject fragments while the sync layer holds its own handle.
#[derive(Clone, Default)]
pub struct MemoryFragmentFiles {
    files: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryFragmentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment directly (e.g. to simulate remote state)
    pub fn insert(&self, id: &str, raw_json: &str) {
        self.files
            .borrow_mut()
            .insert(id.to_string(), raw_json.to_string());
    }

    /// Remove a fragment directly
    pub fn remove(&self, id: &str) {
        self.files.borrow_mut().remove(id);
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.borrow().contains_key(id)
    }
}

impl FragmentFiles for MemoryFragmentFiles {
    fn list_fragment_files(&self, _dir: &Path) -> CommonResult<Vec<(String, String)>> {
        Ok(self
            .files
            .borrow()
            .iter()
            .map(|(id, raw)| (id.clone(), raw.clone()))
            .collect())
    }

    fn write_fragment_file(&self, _dir: &Path, id: &str, raw_json: &str) -> CommonResult<()> {
        self.insert(id, raw_json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_memory_files_roundtrip() {
        let files = MemoryFragmentFiles::new();
        let dir = PathBuf::from("unused");

        files.write_fragment_file(&dir, "b", "{\"_id\":\"b\"}").unwrap();
        files.write_fragment_file(&dir, "a", "{\"_id\":\"a\"}").unwrap();

        let listed = files.list_fragment_files(&dir).unwrap();
        assert_eq!(listed.len(), 2);
        // Identifier-sorted
        assert_eq!(listed[0].0, "a");
        assert_eq!(listed[1].0, "b");
    }

    #[test]
    fn test_memory_files_shared_handle() {
        let files = MemoryFragmentFiles::new();
        let handle = files.clone();

        files.insert("x", "{}");
        assert!(handle.contains("x"));
    }

    #[test]
    fn test_directory_files_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let files = DirectoryFragmentFiles;

        files
            .write_fragment_file(tmp.path(), "elem-1", "{\"_id\":\"elem-1\"}")
            .unwrap();
        files
            .write_fragment_file(tmp.path(), "elem-2", "{\"_id\":\"elem-2\"}")
            .unwrap();

        let listed = files.list_fragment_files(tmp.path()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0, "elem-1");
        assert_eq!(listed[0].1, "{\"_id\":\"elem-1\"}");
    }

    #[test]
    fn test_directory_files_ignores_non_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("README.md"), "notes").unwrap();
        std::fs::write(tmp.path().join("a.json"), "{}").unwrap();

        let files = DirectoryFragmentFiles;
        let listed = files.list_fragment_files(tmp.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "a");
    }
}
