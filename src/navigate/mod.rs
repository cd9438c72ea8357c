//! Navigate module
//!
//! Builds the directory tree shown to clients, with per-listing node ids.

mod tree;

pub use tree::{DirectoryNode, DirectoryTree, DirectoryTreeBuilder};
