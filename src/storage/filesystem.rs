//! File system operations
//!
//! Staged writes and recursive copies used by the action handlers.

use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Prefix of temporary files created while an upload is in flight
pub const STAGING_PREFIX: &str = ".rax-staging-";

/// Bytes written to a temporary file in the destination directory.
///
/// The temporary file is removed when dropped unless it was persisted.
pub struct StagedFile {
    file: NamedTempFile,
    len: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Give the staged bytes their final name; fails if that name is taken
    pub fn persist(self, dest: &Path) -> io::Result<()> {
        self.file.persist_noclobber(dest)?;
        info!("Persisted {} bytes to {}", self.len, dest.display());
        Ok(())
    }
}

/// Copy at most `limit + 1` bytes from `source` into a temporary file in `dir`.
///
/// Reading one byte past the limit lets the caller tell an exact fit from an
/// oversized stream without buffering the whole payload.
pub fn stage(dir: &Path, source: &mut dyn Read, limit: u64) -> io::Result<StagedFile> {
    let mut file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)?;

    let len = io::copy(&mut source.take(limit.saturating_add(1)), &mut file)?;
    file.flush()?;

    debug!("Staged {} bytes at {}", len, file.path().display());
    Ok(StagedFile { file, len })
}

/// Recursively copy a directory tree; symbolic links are skipped
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        } else {
            debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut source: &[u8] = b"hello";
        let staged = stage(dir.path(), &mut source, 5).unwrap();
        assert_eq!(staged.len(), 5);

        let dest = dir.path().join("hello.txt");
        staged.persist(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_stage_reads_one_byte_past_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut source: &[u8] = b"too long";
        let staged = stage(dir.path(), &mut source, 3).unwrap();
        assert_eq!(staged.len(), 4);
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut source: &[u8] = b"discard me";
        let staged = stage(dir.path(), &mut source, 100).unwrap();
        assert!(staged.path().exists());
        drop(staged);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_persist_does_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("taken.txt");
        fs::write(&dest, b"original").unwrap();

        let mut source: &[u8] = b"intruder";
        let staged = stage(dir.path(), &mut source, 100).unwrap();
        assert!(staged.persist(&dest).is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"original");
    }

    #[test]
    fn test_copy_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();
        fs::write(src.join("nested/deeper/b.txt"), b"b").unwrap();

        let dst = dir.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();
        assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"a");
        assert_eq!(fs::read(dst.join("nested/deeper/b.txt")).unwrap(), b"b");
        assert!(src.join("a.txt").exists());
    }
}
