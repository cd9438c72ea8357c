use log::info;
use std::io;
use std::path::Path;

use crate::actions::{ActionContext, ActionRequest, handle_action};
use crate::config::EngineConfig;
use crate::error::{EngineError, QuotaError};
use crate::navigate::{DirectoryTree, DirectoryTreeBuilder};
use crate::storage::Sandbox;

/// Sandboxed action engine bound to one root directory.
///
/// Each call to [`FileManager::handle`] processes one request to completion.
/// Concurrent calls against the same root are not coordinated; callers that
/// need strict consistency must serialize access themselves.
#[derive(Debug, Clone)]
pub struct FileManager {
    context: ActionContext,
}

impl FileManager {
    /// Validate the configuration and pin the root.
    ///
    /// Fails when the root does not exist or is not a directory.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let root = config.base_path();
        let sandbox =
            Sandbox::new(&root).map_err(|e| EngineError::RootUnavailable(root.clone(), e))?;
        if !sandbox.root().is_dir() {
            return Err(EngineError::RootNotADirectory(root));
        }

        info!(
            "File manager rooted at {} (max {} folders, {} KB space, {} KB per file, extensions: {})",
            sandbox.root().display(),
            config.max_folders,
            config.max_space_kb,
            config.max_file_size_kb,
            if config.restricts_extensions() {
                config.extensions.join(",")
            } else {
                "any".to_string()
            }
        );

        Ok(Self {
            context: ActionContext::new(sandbox, config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.context.config
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        self.context.sandbox.root()
    }

    /// Run one action and return its ordered result messages
    pub fn handle(&self, request: ActionRequest) -> Vec<String> {
        handle_action(&self.context, request).into_vec()
    }

    /// Build a fresh directory tree, marking the node at `current_path`
    pub fn directory_structure(&self, current_path: &str) -> io::Result<DirectoryTree> {
        DirectoryTreeBuilder::new(self.root(), current_path).build()
    }

    /// Bytes used under the root; 0 when space is neither shown nor checked
    pub fn space_consumed(&self) -> Result<u64, QuotaError> {
        let config = self.config();
        if config.show_space || config.check_space {
            self.context.quota().total_size()
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path().join("missing").to_string_lossy());
        assert!(matches!(
            FileManager::new(config),
            Err(EngineError::RootUnavailable(_, _))
        ));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let config = EngineConfig::new(file.to_string_lossy());
        assert!(matches!(
            FileManager::new(config),
            Err(EngineError::RootNotADirectory(_))
        ));
    }

    #[test]
    fn test_space_consumed_respects_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), vec![0u8; 10]).unwrap();

        let mut config = EngineConfig::new(dir.path().to_string_lossy());
        let manager = FileManager::new(config.clone()).unwrap();
        assert_eq!(manager.space_consumed().unwrap(), 10);

        config.show_space = false;
        config.check_space = false;
        let manager = FileManager::new(config).unwrap();
        assert_eq!(manager.space_consumed().unwrap(), 0);
    }
}
