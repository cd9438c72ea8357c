//! Action handlers for the RAX file manager.
//!
//! One handler per action kind. Every handler records its outcome in the
//! request's `Messages`; nothing here panics or propagates an error to the
//! caller.

use log::{debug, info, warn};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use zip::ZipArchive;

use crate::actions::commands::{ActionKind, ActionRequest, EntryKind, UploadedFile};
use crate::actions::results::Messages;
use crate::config::EngineConfig;
use crate::error::{ActionError, QuotaError, ValidationError};
use crate::storage::validation::{self, extension_of, is_root, is_within, split_last};
use crate::storage::{QuotaGuard, Sandbox, conflict, filesystem, quota, sniff};

/// Everything a handler may touch: the sandboxed root and the limits
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub sandbox: Sandbox,
    pub config: EngineConfig,
}

impl ActionContext {
    pub fn new(sandbox: Sandbox, config: EngineConfig) -> Self {
        Self { sandbox, config }
    }

    pub fn quota(&self) -> QuotaGuard<'_> {
        QuotaGuard::new(self.sandbox.root(), &self.config)
    }
}

/// Signature shared by every action handler
pub type ActionHandler = fn(&ActionContext, ActionRequest, &mut Messages);

/// Maps an action kind to the function that executes it
pub fn handler_for(action: ActionKind) -> ActionHandler {
    match action {
        ActionKind::Upload => handle_upload,
        ActionKind::Add => handle_add,
        ActionKind::Delete => handle_delete,
        ActionKind::Rename => handle_rename,
        ActionKind::Move | ActionKind::Copy => handle_transfer,
        ActionKind::Unzip => handle_unzip,
    }
}

/// Validates a request and dispatches it to its handler.
///
/// Validation failures abort the request before any filesystem access.
pub fn handle_action(ctx: &ActionContext, request: ActionRequest) -> Messages {
    let mut messages = Messages::new();

    if let Err(err) = validate_request(&request) {
        messages.push_error(err.into());
        return messages;
    }

    info!(
        "Processing {} (path: {:?}, current: {:?}, kind: {:?})",
        request.action, request.path, request.current_path, request.kind
    );
    handler_for(request.action)(ctx, request, &mut messages);
    messages
}

fn validate_request(request: &ActionRequest) -> Result<(), ValidationError> {
    // New folders are always directories, whatever kind the caller sent
    let name_kind = match request.action {
        ActionKind::Add => EntryKind::Dir,
        _ => request.kind,
    };
    validation::validate(&request.path, request.name.as_deref(), name_kind)?;
    validation::validate_path(&request.current_path)
}

fn required_name(request: &ActionRequest, kind: EntryKind) -> Result<&str, ValidationError> {
    request
        .name
        .as_deref()
        .ok_or(ValidationError::MissingName(kind))
}

/// Reject names whose extension is not whitelisted, or that have none
fn check_extension(config: &EngineConfig, name: &str) -> Result<(), ActionError> {
    if !config.restricts_extensions() {
        return Ok(());
    }
    match extension_of(name) {
        Some(ext) if config.allows_extension(ext) => Ok(()),
        Some(ext) => Err(ActionError::ExtensionNotAllowed {
            ext: ext.to_string(),
            name: name.to_string(),
        }),
        None => Err(ActionError::NoExtension(name.to_string())),
    }
}

/// Cross-check written bytes against the whitelist
fn check_content(
    config: &EngineConfig,
    path: &Path,
    reject: impl FnOnce() -> ActionError,
) -> Result<(), ActionError> {
    if !config.restricts_extensions() {
        return Ok(());
    }
    let sniffed = sniff::sniff(path).map_err(|e| ActionError::Unexpected(e.to_string()))?;
    if sniffed.matches_whitelist(&config.extensions) {
        Ok(())
    } else {
        warn!(
            "Sniffed type {} of {} matches no allowed extension",
            sniffed.mime(),
            path.display()
        );
        Err(reject())
    }
}

// ─── Upload ────────────────────────────────────────────────────────────────

fn handle_upload(ctx: &ActionContext, request: ActionRequest, messages: &mut Messages) {
    let dir = match ctx.sandbox.resolve(&request.path) {
        Ok(dir) => dir,
        Err(err) => {
            messages.push_error(err.into());
            return;
        }
    };

    let quota = ctx.quota();
    for file in request.files {
        if let Err(err) = upload_file(ctx, &quota, &dir, file) {
            messages.push_error(err);
        }
    }

    if messages.is_empty() {
        messages.push("All files uploaded successfully");
    }
}

fn upload_file(
    ctx: &ActionContext,
    quota: &QuotaGuard<'_>,
    dir: &Path,
    mut file: UploadedFile,
) -> Result<(), ActionError> {
    validation::validate_name(&file.name, EntryKind::File)?;
    quota.check_upload(&file.name, file.size)?;
    check_extension(&ctx.config, &file.name)?;

    let final_name = conflict::resolve(dir, &file.name.replace(' ', "_"))?;
    let failure = || format!("File couldn't be uploaded : {}", file.name);

    let limit = ctx.config.max_file_size_bytes();
    let staged = filesystem::stage(dir, &mut file.source, limit)
        .map_err(|e| ActionError::filesystem(failure(), e))?;

    // The declared size is untrusted; the stream itself must fit too
    if staged.len() > limit {
        return Err(QuotaError::FileTooLarge {
            name: file.name.clone(),
            max_kb: ctx.config.max_file_size_kb,
        }
        .into());
    }
    // Staged bytes already sit under the root and count towards its total
    if ctx.config.check_space {
        quota.check_total_space(&file.name, 0)?;
    }

    check_content(&ctx.config, staged.path(), || {
        ActionError::ContentNotAllowed(file.name.clone())
    })?;

    let written = staged.len();
    staged
        .persist(&dir.join(&final_name))
        .map_err(|e| ActionError::filesystem(failure(), e))?;

    info!(
        "Uploaded {} as {} ({} bytes) into {}",
        file.name,
        final_name,
        written,
        dir.display()
    );
    Ok(())
}

// ─── Add ───────────────────────────────────────────────────────────────────

fn handle_add(ctx: &ActionContext, request: ActionRequest, messages: &mut Messages) {
    messages.record(create_folder(ctx, &request));
}

fn create_folder(ctx: &ActionContext, request: &ActionRequest) -> Result<String, ActionError> {
    let name = required_name(request, EntryKind::Dir)?;
    ctx.quota().check_folder_count()?;

    let path = ctx.sandbox.resolve_child(&request.path, name)?;
    fs::create_dir(&path).map_err(|e| {
        ActionError::filesystem(format!("Folder couldn't be created : {}", name), e)
    })?;

    info!("Created folder {}", path.display());
    Ok(format!("Folder created successfully : {}", name))
}

// ─── Rename ────────────────────────────────────────────────────────────────

fn handle_rename(ctx: &ActionContext, request: ActionRequest, messages: &mut Messages) {
    messages.record(rename_entry(ctx, &request));
}

fn rename_entry(ctx: &ActionContext, request: &ActionRequest) -> Result<String, ActionError> {
    let new_name = required_name(request, request.kind)?;
    let (parent, old_name) = split_last(&request.path)
        .ok_or_else(|| ValidationError::InvalidPath(request.path.clone()))?;

    if request.kind == EntryKind::File {
        let old_ext = extension_of(old_name);
        if old_ext != extension_of(new_name) {
            return Err(ActionError::ExtensionMismatch {
                old_ext: old_ext.map(str::to_string),
            });
        }
    }

    let failure = || match request.kind {
        EntryKind::Dir => format!("Folder couldn't be renamed to {}", new_name),
        EntryKind::File => format!("File couldn't be renamed to {}", new_name),
    };

    let source = ctx.sandbox.resolve(&request.path)?;
    let target = ctx.sandbox.resolve_child(&parent, new_name)?;
    if target.symlink_metadata().is_ok() {
        return Err(ActionError::filesystem(
            failure(),
            io::Error::from(io::ErrorKind::AlreadyExists),
        ));
    }

    fs::rename(&source, &target).map_err(|e| ActionError::filesystem(failure(), e))?;

    info!("Renamed {} to {}", source.display(), target.display());
    Ok(match request.kind {
        EntryKind::Dir => format!("Folder renamed successfully from {} to {}", old_name, new_name),
        EntryKind::File => format!("File renamed successfully from {} to {}", old_name, new_name),
    })
}

// ─── Delete ────────────────────────────────────────────────────────────────

fn handle_delete(ctx: &ActionContext, request: ActionRequest, messages: &mut Messages) {
    messages.record(delete_entry(ctx, &request));
}

fn delete_entry(ctx: &ActionContext, request: &ActionRequest) -> Result<String, ActionError> {
    if is_root(&request.path) {
        return Err(ActionError::RootDeletionRejected);
    }
    let (_, name) = split_last(&request.path).ok_or(ActionError::RootDeletionRejected)?;
    let path = ctx.sandbox.resolve(&request.path)?;

    match request.kind {
        EntryKind::Dir => {
            fs::remove_dir_all(&path).map_err(|e| {
                ActionError::filesystem(format!("Folder couldn't be deleted : {}", name), e)
            })?;
            info!("Deleted folder {}", path.display());
            Ok(format!("Folder deleted successfully : {}", name))
        }
        EntryKind::File => {
            fs::remove_file(&path).map_err(|e| {
                ActionError::filesystem(format!("File couldn't be deleted : {}", name), e)
            })?;
            info!("Deleted file {}", path.display());
            Ok(format!("File deleted successfully : {}", name))
        }
    }
}

// ─── Move / Copy ───────────────────────────────────────────────────────────

fn handle_transfer(ctx: &ActionContext, request: ActionRequest, messages: &mut Messages) {
    messages.record(transfer_entry(ctx, &request));
}

fn transfer_entry(ctx: &ActionContext, request: &ActionRequest) -> Result<String, ActionError> {
    // Also covers a root source, which contains every destination
    if is_within(&request.path, &request.current_path) {
        return Err(ActionError::SelfMoveRejected);
    }
    let (_, name) = split_last(&request.path).ok_or(ActionError::SelfMoveRejected)?;

    let source = ctx.sandbox.resolve(&request.path)?;
    let target = ctx.sandbox.resolve_child(&request.current_path, name)?;
    if target.symlink_metadata().is_ok() {
        return Err(ActionError::DestinationExists);
    }

    let failure = |e: io::Error| ActionError::filesystem("File/folder couldn't be moved/copied.", e);

    let verb = if request.action == ActionKind::Move {
        fs::rename(&source, &target).map_err(failure)?;
        "moved"
    } else {
        let is_dir = source.symlink_metadata().map_err(failure)?.is_dir();
        if ctx.config.check_space {
            let size = quota::size_of(&source)?;
            ctx.quota().check_total_space(name, size)?;
        }
        if is_dir {
            filesystem::copy_dir_recursive(&source, &target).map_err(failure)?;
        } else {
            fs::copy(&source, &target).map_err(failure)?;
        }
        "copied"
    };

    info!("{} {} to {}", verb, source.display(), target.display());
    Ok(format!("File/folder {} successfully : {}", verb, name))
}

// ─── Unzip ─────────────────────────────────────────────────────────────────

fn handle_unzip(ctx: &ActionContext, request: ActionRequest, messages: &mut Messages) {
    if request.kind == EntryKind::Dir {
        messages.push_error(ActionError::NotAnArchive);
        return;
    }

    if let Err(err) = extract_archive(ctx, &request, messages) {
        messages.push_error(err);
    }

    if messages.is_empty() {
        messages.push("Extraction completed successfully.");
    }
}

/// Extract whitelisted entries of the archive named by `path` from the
/// current directory into the current directory.
///
/// Per-entry rejections are recorded and extraction continues; any other
/// failure aborts with a single generic message.
fn extract_archive(
    ctx: &ActionContext,
    request: &ActionRequest,
    messages: &mut Messages,
) -> Result<(), ActionError> {
    let (_, archive_name) = split_last(&request.path).ok_or(ActionError::ArchiveUnreadable)?;
    let dest = ctx.sandbox.resolve(&request.current_path)?;
    let archive_path = ctx.sandbox.resolve_child(&request.current_path, archive_name)?;

    let unreadable = |detail: String| {
        warn!("Could not unzip {}: {}", archive_path.display(), detail);
        ActionError::ArchiveUnreadable
    };

    let file = File::open(&archive_path).map_err(|e| unreadable(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;
    let quota = ctx.quota();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| unreadable(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        if ctx.config.restricts_extensions()
            && !extension_of(&entry_name).is_some_and(|ext| ctx.config.allows_extension(ext))
        {
            debug!("Skipping archive entry {}", entry_name);
            continue;
        }

        let outcome = match entry.enclosed_name() {
            Some(relative) if validation::validate_path(&entry_name).is_ok() => {
                let size = entry.size();
                quota
                    .check_upload(&entry_name, size)
                    .map_err(ActionError::from)
                    .and_then(|_| {
                        extract_entry(ctx, &dest, &relative, &mut entry, &entry_name)
                    })
            }
            _ => Err(ActionError::ArchiveEntryNotAllowed(entry_name.clone())),
        };

        match outcome {
            Ok(()) => {}
            Err(
                err @ (ActionError::ArchiveEntryNotAllowed(_)
                | ActionError::Conflict(_)
                | ActionError::Quota(QuotaError::FileTooLarge { .. })
                | ActionError::Quota(QuotaError::TotalSpaceExceeded { .. })
                | ActionError::Quota(QuotaError::TooManyFolders { .. })),
            ) => messages.push_error(err),
            Err(err) => return Err(unreadable(err.to_string())),
        }
    }

    Ok(())
}

fn extract_entry(
    ctx: &ActionContext,
    dest: &Path,
    relative: &Path,
    entry: &mut dyn io::Read,
    entry_name: &str,
) -> Result<(), ActionError> {
    let target = dest.join(relative);
    let (Some(parent), Some(file_name)) = (target.parent(), target.file_name()) else {
        return Err(ActionError::ArchiveEntryNotAllowed(entry_name.to_string()));
    };

    // Checked on the deepest existing ancestor, before anything is created
    if !ctx.sandbox.contains(parent) {
        return Err(ActionError::ArchiveEntryNotAllowed(entry_name.to_string()));
    }

    let quota = ctx.quota();
    let missing = parent
        .ancestors()
        .take_while(|ancestor| *ancestor != dest)
        .filter(|ancestor| ancestor.symlink_metadata().is_err())
        .count();
    if missing > 0 {
        quota.check_new_folders(missing)?;
    }
    fs::create_dir_all(parent)
        .map_err(|e| ActionError::filesystem("Could not create extraction folder", e))?;

    let final_name = conflict::resolve(parent, &file_name.to_string_lossy())?;
    let limit = ctx.config.max_file_size_bytes();
    let staged = filesystem::stage(parent, entry, limit)
        .map_err(|e| ActionError::filesystem("Could not write archive entry", e))?;
    if staged.len() > limit {
        return Err(QuotaError::FileTooLarge {
            name: entry_name.to_string(),
            max_kb: ctx.config.max_file_size_kb,
        }
        .into());
    }
    // The header size is untrusted; recheck with the staged bytes in place
    if ctx.config.check_space {
        quota.check_total_space(entry_name, 0)?;
    }

    check_content(&ctx.config, staged.path(), || {
        ActionError::ArchiveEntryNotAllowed(entry_name.to_string())
    })?;

    staged
        .persist(&parent.join(&final_name))
        .map_err(|e| ActionError::filesystem("Could not write archive entry", e))?;
    info!("Extracted {} to {}", entry_name, parent.join(&final_name).display());
    Ok(())
}
