//! Error types
//!
//! Defines domain-specific error types for each module of the file manager.
//! The `Display` form of every action-level error is the message reported
//! back to the caller.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::actions::EntryKind;

/// Syntactic validation errors; these abort a request before any mutation
#[derive(Debug)]
pub enum ValidationError {
    InvalidPath(String),
    InvalidName { name: String, kind: EntryKind },
    MissingName(EntryKind),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPath(p) => write!(f, "Invalid path : {}", p),
            ValidationError::InvalidName {
                name,
                kind: EntryKind::Dir,
            } => write!(f, "Invalid folder name : {}", name),
            ValidationError::InvalidName {
                name,
                kind: EntryKind::File,
            } => write!(f, "Invalid file name : {}", name),
            ValidationError::MissingName(EntryKind::Dir) => write!(f, "Invalid folder name : "),
            ValidationError::MissingName(EntryKind::File) => write!(f, "Invalid file name : "),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Quota module errors
#[derive(Debug)]
pub enum QuotaError {
    FileTooLarge { name: String, max_kb: u64 },
    TotalSpaceExceeded { name: String, max_kb: u64 },
    TooManyFolders { max: usize },
    Scan(walkdir::Error),
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::FileTooLarge { name, max_kb } => {
                write!(f, "File size exceeded {} KB : {}", max_kb, name)
            }
            QuotaError::TotalSpaceExceeded { name, max_kb } => {
                write!(f, "Total Space size exceeded {} KB : {}", max_kb, name)
            }
            QuotaError::TooManyFolders { max } => write!(
                f,
                "Folder couldn't be created because maximum number of folders exceeded : {}",
                max
            ),
            QuotaError::Scan(e) => write!(f, "Unexpected error : {}", e),
        }
    }
}

impl std::error::Error for QuotaError {}

impl From<walkdir::Error> for QuotaError {
    fn from(error: walkdir::Error) -> Self {
        QuotaError::Scan(error)
    }
}

/// Conflict resolution errors
#[derive(Debug)]
pub enum ConflictError {
    Exhausted(String),
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictError::Exhausted(name) => write!(f, "No free file name left for : {}", name),
        }
    }
}

impl std::error::Error for ConflictError {}

/// Errors raised while executing a single action or batch item
#[derive(Debug)]
pub enum ActionError {
    Validation(ValidationError),
    Quota(QuotaError),
    Conflict(ConflictError),
    ExtensionNotAllowed { ext: String, name: String },
    NoExtension(String),
    ContentNotAllowed(String),
    ArchiveEntryNotAllowed(String),
    ArchiveUnreadable,
    NotAnArchive,
    DestinationExists,
    SelfMoveRejected,
    ExtensionMismatch { old_ext: Option<String> },
    RootDeletionRejected,
    /// OS-level failure; `message` is the user-facing summary
    Filesystem { message: String, source: io::Error },
    Unexpected(String),
}

impl ActionError {
    /// Wrap an I/O failure with the message reported for this operation
    pub fn filesystem(message: impl Into<String>, source: io::Error) -> Self {
        ActionError::Filesystem {
            message: message.into(),
            source,
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Validation(e) => write!(f, "{}", e),
            ActionError::Quota(e) => write!(f, "{}", e),
            ActionError::Conflict(e) => write!(f, "{}", e),
            ActionError::ExtensionNotAllowed { ext, name } => {
                write!(f, "File extension not allowed (.{}) : {}", ext, name)
            }
            ActionError::NoExtension(name) => {
                write!(f, "No file extension in uploaded file : {}", name)
            }
            ActionError::ContentNotAllowed(name) => write!(f, "File type not allowed : {}", name),
            ActionError::ArchiveEntryNotAllowed(entry) => {
                write!(f, "File in the zip is not allowed : {}", entry)
            }
            ActionError::ArchiveUnreadable => write!(f, "ERROR : Could not unzip the file."),
            ActionError::NotAnArchive => write!(f, "Cannot unzip a directory"),
            ActionError::DestinationExists => write!(
                f,
                "ERROR: A file/folder with this name already exists in the destination folder."
            ),
            ActionError::SelfMoveRejected => write!(f, "Cannot move/copy to a child folder"),
            ActionError::ExtensionMismatch { old_ext: Some(ext) } => {
                write!(f, "File extension should be same : .{}", ext)
            }
            ActionError::ExtensionMismatch { old_ext: None } => write!(
                f,
                "New file extension didn't match with old file extension"
            ),
            ActionError::RootDeletionRejected => write!(f, "root folder can't be deleted"),
            ActionError::Filesystem { message, .. } => write!(f, "{}", message),
            ActionError::Unexpected(detail) => write!(f, "Unexpected error : {}", detail),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Validation(e) => Some(e),
            ActionError::Quota(e) => Some(e),
            ActionError::Conflict(e) => Some(e),
            ActionError::Filesystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ValidationError> for ActionError {
    fn from(error: ValidationError) -> Self {
        ActionError::Validation(error)
    }
}

impl From<QuotaError> for ActionError {
    fn from(error: QuotaError) -> Self {
        ActionError::Quota(error)
    }
}

impl From<ConflictError> for ActionError {
    fn from(error: ConflictError) -> Self {
        ActionError::Conflict(error)
    }
}

/// Errors raised while building the engine itself
#[derive(Debug)]
pub enum EngineError {
    Config(config::ConfigError),
    RootUnavailable(PathBuf, io::Error),
    RootNotADirectory(PathBuf),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "Configuration error: {}", e),
            EngineError::RootUnavailable(p, e) => {
                write!(f, "Root {} is unavailable: {}", p.display(), e)
            }
            EngineError::RootNotADirectory(p) => {
                write!(f, "Root {} is not a directory", p.display())
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<config::ConfigError> for EngineError {
    fn from(error: config::ConfigError) -> Self {
        EngineError::Config(error)
    }
}
