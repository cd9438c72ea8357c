//! Path validation
//!
//! Syntactic checks on user-supplied paths and names, plus resolution of a
//! validated relative path against the sandbox root.

use std::io;
use std::path::{Path, PathBuf};

use crate::actions::EntryKind;
use crate::error::ValidationError;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-')
}

fn is_path_char(c: char) -> bool {
    is_name_char(c) || matches!(c, '/' | '.')
}

/// Validate a relative path: restricted character class and no `..`
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if !path.chars().all(is_path_char) || path.contains("..") {
        return Err(ValidationError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Validate a folder or file name.
///
/// Folder names never contain dots; file names may, but never `..` anywhere
/// in the string.
pub fn validate_name(name: &str, kind: EntryKind) -> Result<(), ValidationError> {
    let valid = match kind {
        EntryKind::Dir => !name.is_empty() && name.chars().all(is_name_char),
        EntryKind::File => {
            !name.is_empty()
                && name.chars().all(|c| is_name_char(c) || c == '.')
                && !name.contains("..")
        }
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            name: name.to_string(),
            kind,
        })
    }
}

/// Validate the request-level inputs: name first (when given), then path
pub fn validate(path: &str, name: Option<&str>, kind: EntryKind) -> Result<(), ValidationError> {
    if let Some(name) = name {
        validate_name(name, kind)?;
    }
    validate_path(path)
}

/// Split a relative path into its non-empty segments, ignoring `.`
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Whether the relative path designates the root itself
pub fn is_root(path: &str) -> bool {
    segments(path).is_empty()
}

/// Whether `candidate` is `ancestor` or lies beneath it
pub fn is_within(ancestor: &str, candidate: &str) -> bool {
    let ancestor = segments(ancestor);
    let candidate = segments(candidate);
    candidate.len() >= ancestor.len() && candidate[..ancestor.len()] == ancestor[..]
}

/// Last segment of a path plus the relative path of its parent
pub fn split_last(path: &str) -> Option<(String, &str)> {
    let mut parts = segments(path);
    let last = parts.pop()?;
    Some((parts.join("/"), last))
}

/// Extension of a file name: the text after the last dot, if any
pub fn extension_of(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// A canonical root directory that every resolved path must stay inside
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Canonicalize `root`; fails when it does not exist
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path against the root.
    ///
    /// The path is validated syntactically, then the deepest existing ancestor
    /// is canonicalized so that symbolic links cannot lead outside the root.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf, ValidationError> {
        validate_path(rel)?;

        let mut path = self.root.clone();
        for segment in segments(rel) {
            path.push(segment);
        }

        if !self.contains(&path) {
            return Err(ValidationError::InvalidPath(rel.to_string()));
        }
        Ok(path)
    }

    /// Resolve a directory and a child name inside it
    pub fn resolve_child(&self, dir: &str, name: &str) -> Result<PathBuf, ValidationError> {
        let dir_path = self.resolve(dir)?;
        let path = dir_path.join(name);
        if !self.contains(&path) {
            return Err(ValidationError::InvalidPath(format!("{}/{}", dir, name)));
        }
        Ok(path)
    }

    /// Whether `path`, once symbolic links are resolved, stays inside the root
    pub fn contains(&self, path: &Path) -> bool {
        let mut probe = Some(path);
        while let Some(current) = probe {
            if let Ok(canonical) = current.canonicalize() {
                return canonical.starts_with(&self.root);
            }
            probe = current.parent();
        }
        false
    }
}
