//! Directory tree construction
//!
//! Walks the root top-down. When a directory is visited, each of its
//! sub-directories receives the next id in name order; the sub-directories are
//! then visited in that same order. The root is always id 1, so ids are stable
//! for as long as the tree itself is unchanged.

use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::filesystem::STAGING_PREFIX;
use crate::storage::validation::segments;

/// Id given to the root node
pub const ROOT_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub id: u64,
    /// Set on the root and on every node leading to the current path
    pub open: bool,
    pub dirs: BTreeMap<String, DirectoryNode>,
    pub files: Vec<String>,
}

impl DirectoryNode {
    fn new(id: u64, open: bool) -> Self {
        Self {
            id,
            open,
            dirs: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Look up a descendant by relative path
    pub fn find(&self, path: &str) -> Option<&DirectoryNode> {
        segments(path)
            .into_iter()
            .try_fold(self, |node, segment| node.dirs.get(segment))
    }

    /// Number of directory nodes in this subtree, this one included
    pub fn count(&self) -> usize {
        1 + self.dirs.values().map(DirectoryNode::count).sum::<usize>()
    }
}

/// One listing of the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryTree {
    pub root: DirectoryNode,
    /// Id of the node matching the current path, or the root id
    pub current_id: u64,
}

pub struct DirectoryTreeBuilder {
    root: PathBuf,
    current: Vec<String>,
    next_id: u64,
    current_id: Option<u64>,
}

impl DirectoryTreeBuilder {
    pub fn new(root: &Path, current_path: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            current: segments(current_path)
                .into_iter()
                .map(str::to_string)
                .collect(),
            next_id: ROOT_ID,
            current_id: None,
        }
    }

    pub fn build(mut self) -> io::Result<DirectoryTree> {
        let mut root = DirectoryNode::new(self.take_id(), true);
        let root_path = self.root.clone();
        self.visit(&root_path, &mut Vec::new(), &mut root)?;

        Ok(DirectoryTree {
            root,
            current_id: self.current_id.unwrap_or(ROOT_ID),
        })
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn leads_to_current(&self, rel: &[String]) -> bool {
        self.current.starts_with(rel)
    }

    fn visit(&mut self, dir: &Path, rel: &mut Vec<String>, node: &mut DirectoryNode) -> io::Result<()> {
        if *rel == self.current {
            self.current_id = Some(node.id);
        }

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                dirs.push(name);
            } else if !name.starts_with(STAGING_PREFIX) {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();
        node.files = files;

        for name in &dirs {
            rel.push(name.clone());
            let open = self.leads_to_current(rel);
            rel.pop();
            let id = self.take_id();
            node.dirs.insert(name.clone(), DirectoryNode::new(id, open));
        }

        for name in dirs {
            let Some(child) = node.dirs.get_mut(&name) else {
                continue;
            };
            let child_path = dir.join(&name);
            rel.push(name);
            if let Err(e) = self.visit(&child_path, rel, child) {
                warn!("Skipping unreadable folder {}: {}", child_path.display(), e);
            }
            rel.pop();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("c")).unwrap();
        fs::write(dir.path().join("top.txt"), b"x").unwrap();
        fs::write(dir.path().join("b/inner/deep.txt"), b"x").unwrap();
        dir
    }

    #[test]
    fn test_ids_follow_top_down_walk() {
        let dir = sample_root();
        let tree = DirectoryTreeBuilder::new(dir.path(), "/").build().unwrap();

        assert_eq!(tree.root.id, 1);
        assert_eq!(tree.root.dirs["a"].id, 2);
        assert_eq!(tree.root.dirs["b"].id, 3);
        assert_eq!(tree.root.dirs["c"].id, 4);
        assert_eq!(tree.root.dirs["b"].dirs["inner"].id, 5);
        assert_eq!(tree.root.files, vec!["top.txt".to_string()]);
        assert_eq!(tree.root.find("/b/inner/").unwrap().files, vec!["deep.txt".to_string()]);
        assert_eq!(tree.root.count(), 5);
        assert_eq!(tree.current_id, 1);
    }

    #[test]
    fn test_current_path_is_marked_open() {
        let dir = sample_root();
        let tree = DirectoryTreeBuilder::new(dir.path(), "/b/inner/").build().unwrap();

        assert_eq!(tree.current_id, 5);
        assert!(tree.root.open);
        assert!(tree.root.dirs["b"].open);
        assert!(tree.root.dirs["b"].dirs["inner"].open);
        assert!(!tree.root.dirs["a"].open);
        assert!(!tree.root.dirs["c"].open);
    }

    #[test]
    fn test_unknown_current_path_defaults_to_root() {
        let dir = sample_root();
        let tree = DirectoryTreeBuilder::new(dir.path(), "/missing/").build().unwrap();
        assert_eq!(tree.current_id, ROOT_ID);
    }

    #[test]
    fn test_rebuild_without_changes_is_identical() {
        let dir = sample_root();
        let first = DirectoryTreeBuilder::new(dir.path(), "/a/").build().unwrap();
        let second = DirectoryTreeBuilder::new(dir.path(), "/a/").build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_staging_files_are_hidden() {
        let dir = sample_root();
        fs::write(dir.path().join(format!("{}abc", STAGING_PREFIX)), b"x").unwrap();
        let tree = DirectoryTreeBuilder::new(dir.path(), "/").build().unwrap();
        assert_eq!(tree.root.files, vec!["top.txt".to_string()]);
    }
}
