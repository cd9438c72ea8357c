//! Module `commands`
//!
//! Defines the action vocabulary accepted by the engine and the request
//! value a caller builds for one invocation.

use std::fmt;
use std::io::{Cursor, Read};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven supported filesystem actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Upload,
    Add, // Create directory
    Delete,
    Rename,
    Move,
    Copy,
    Unzip,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Upload => "upload",
            ActionKind::Add => "add",
            ActionKind::Delete => "delete",
            ActionKind::Rename => "rename",
            ActionKind::Move => "move",
            ActionKind::Copy => "copy",
            ActionKind::Unzip => "unzip",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an action name is not one of the supported actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upload" => Ok(ActionKind::Upload),
            "add" => Ok(ActionKind::Add),
            "delete" => Ok(ActionKind::Delete),
            "rename" => Ok(ActionKind::Rename),
            "move" => Ok(ActionKind::Move),
            "copy" => Ok(ActionKind::Copy),
            "unzip" => Ok(ActionKind::Unzip),
            _ => Err(UnknownAction(raw.to_string())),
        }
    }
}

/// Whether an action targets a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    File,
    Dir,
}

impl FromStr for EntryKind {
    type Err = UnknownAction;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(EntryKind::File),
            "dir" => Ok(EntryKind::Dir),
            _ => Err(UnknownAction(raw.to_string())),
        }
    }
}

/// One submitted file: its declared name and size plus a byte stream.
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub source: Box<dyn Read + Send>,
}

impl UploadedFile {
    pub fn from_reader(name: impl Into<String>, size: u64, source: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            size,
            source: Box::new(source),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self::from_reader(name, bytes.len() as u64, Cursor::new(bytes))
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A single action invocation; consumed by the handler that executes it.
#[derive(Debug)]
pub struct ActionRequest {
    pub action: ActionKind,
    /// Target of the action, relative to the root
    pub path: String,
    /// New name for `add` and `rename`
    pub name: Option<String>,
    pub kind: EntryKind,
    /// Directory the caller is looking at; destination of move, copy and unzip
    pub current_path: String,
    pub files: Vec<UploadedFile>,
}

impl ActionRequest {
    pub fn new(action: ActionKind, path: impl Into<String>) -> Self {
        Self {
            action,
            path: path.into(),
            name: None,
            kind: EntryKind::default(),
            current_path: "/".to_string(),
            files: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_current_path(mut self, current_path: impl Into<String>) -> Self {
        self.current_path = current_path.into();
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_names() {
        assert_eq!("upload".parse(), Ok(ActionKind::Upload));
        assert_eq!(" ADD ".parse(), Ok(ActionKind::Add));
        assert_eq!("unzip".parse(), Ok(ActionKind::Unzip));
        assert_eq!(
            "format".parse::<ActionKind>(),
            Err(UnknownAction("format".to_string()))
        );
        assert_eq!("dir".parse(), Ok(EntryKind::Dir));
        assert!("folder".parse::<EntryKind>().is_err());
    }

    #[test]
    fn test_action_names_round_trip_through_display() {
        for kind in [
            ActionKind::Upload,
            ActionKind::Add,
            ActionKind::Delete,
            ActionKind::Rename,
            ActionKind::Move,
            ActionKind::Copy,
            ActionKind::Unzip,
        ] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_request_builder() {
        let request = ActionRequest::new(ActionKind::Upload, "/docs/")
            .with_file(UploadedFile::from_bytes("a.txt", b"abc".to_vec()));
        assert_eq!(request.current_path, "/");
        assert_eq!(request.kind, EntryKind::File);
        assert_eq!(request.files.len(), 1);
        assert_eq!(request.files[0].size, 3);
    }
}
