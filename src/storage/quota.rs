//! Quota enforcement
//!
//! Every check re-walks the root, so results are a snapshot taken at check
//! time and never go stale between requests.

use log::debug;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::error::QuotaError;

/// Recursive sum of file sizes under `path`; a plain file counts as itself
pub fn size_of(path: &Path) -> Result<u64, QuotaError> {
    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total = total.saturating_add(entry.metadata()?.len());
        }
    }
    Ok(total)
}

/// Size and folder-count limits for one root
pub struct QuotaGuard<'a> {
    root: &'a Path,
    config: &'a EngineConfig,
}

impl<'a> QuotaGuard<'a> {
    pub fn new(root: &'a Path, config: &'a EngineConfig) -> Self {
        Self { root, config }
    }

    /// Recursive sum of file sizes under the root
    pub fn total_size(&self) -> Result<u64, QuotaError> {
        size_of(self.root)
    }

    /// Number of directories under the root, the root itself included
    pub fn folder_count(&self) -> Result<usize, QuotaError> {
        let mut count = 0;
        for entry in WalkDir::new(self.root).follow_links(false) {
            if entry?.file_type().is_dir() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Reject a file larger than the per-file limit
    pub fn check_file_size(&self, name: &str, size: u64) -> Result<(), QuotaError> {
        if size > self.config.max_file_size_bytes() {
            return Err(QuotaError::FileTooLarge {
                name: name.to_string(),
                max_kb: self.config.max_file_size_kb,
            });
        }
        Ok(())
    }

    /// Reject a file that would push the root past its total allowance
    pub fn check_total_space(&self, name: &str, size: u64) -> Result<(), QuotaError> {
        let current = self.total_size()?;
        debug!(
            "Space check for {}: {} used + {} requested / {} allowed",
            name,
            current,
            size,
            self.config.max_space_bytes()
        );
        if current.saturating_add(size) > self.config.max_space_bytes() {
            return Err(QuotaError::TotalSpaceExceeded {
                name: name.to_string(),
                max_kb: self.config.max_space_kb,
            });
        }
        Ok(())
    }

    /// Per-file limit always, total space only when `check_space` is enabled
    pub fn check_upload(&self, name: &str, size: u64) -> Result<(), QuotaError> {
        self.check_file_size(name, size)?;
        if self.config.check_space {
            self.check_total_space(name, size)?;
        }
        Ok(())
    }

    /// Reject creating one more directory once `max_folders` is reached
    pub fn check_folder_count(&self) -> Result<(), QuotaError> {
        self.check_new_folders(1)
    }

    /// Reject creating `new` directories that would exceed `max_folders`
    pub fn check_new_folders(&self, new: usize) -> Result<(), QuotaError> {
        let count = self.folder_count()?;
        if count + new > self.config.max_folders {
            return Err(QuotaError::TooManyFolders {
                max: self.config.max_folders,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn populated_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.txt"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), vec![0u8; 24]).unwrap();
        dir
    }

    #[test]
    fn test_total_size_and_folder_count() {
        let dir = populated_root();
        let config = EngineConfig::new(dir.path().to_string_lossy());
        let guard = QuotaGuard::new(dir.path(), &config);

        assert_eq!(guard.total_size().unwrap(), 124);
        assert_eq!(guard.folder_count().unwrap(), 3);
    }

    #[test]
    fn test_file_size_limit_is_unconditional() {
        let dir = populated_root();
        let mut config = EngineConfig::new(dir.path().to_string_lossy());
        config.max_file_size_kb = 1;
        config.check_space = false;
        let guard = QuotaGuard::new(dir.path(), &config);

        assert!(guard.check_upload("ok.txt", 1024).is_ok());
        let err = guard.check_upload("big.txt", 1025).unwrap_err();
        assert_eq!(err.to_string(), "File size exceeded 1 KB : big.txt");
    }

    #[test]
    fn test_total_space_only_when_enabled() {
        let dir = populated_root();
        let mut config = EngineConfig::new(dir.path().to_string_lossy());
        config.max_space_kb = 1;

        let guard = QuotaGuard::new(dir.path(), &config);
        assert!(guard.check_upload("fits.txt", 900).is_ok());
        let err = guard.check_upload("spill.txt", 901).unwrap_err();
        assert!(matches!(err, QuotaError::TotalSpaceExceeded { max_kb: 1, .. }));

        config.check_space = false;
        let guard = QuotaGuard::new(dir.path(), &config);
        assert!(guard.check_upload("spill.txt", 901).is_ok());
    }

    #[test]
    fn test_folder_count_includes_root() {
        let dir = populated_root();
        let mut config = EngineConfig::new(dir.path().to_string_lossy());

        config.max_folders = 4;
        assert!(QuotaGuard::new(dir.path(), &config).check_folder_count().is_ok());

        config.max_folders = 3;
        let err = QuotaGuard::new(dir.path(), &config)
            .check_folder_count()
            .unwrap_err();
        assert!(matches!(err, QuotaError::TooManyFolders { max: 3 }));
    }

    #[test]
    fn test_several_new_folders_count_together() {
        let dir = populated_root();
        let mut config = EngineConfig::new(dir.path().to_string_lossy());
        config.max_folders = 5;
        let guard = QuotaGuard::new(dir.path(), &config);

        assert!(guard.check_new_folders(2).is_ok());
        assert!(matches!(
            guard.check_new_folders(3),
            Err(QuotaError::TooManyFolders { max: 5 })
        ));
    }
}
