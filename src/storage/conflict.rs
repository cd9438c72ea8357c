//! Collision-safe naming
//!
//! Picks a file name that does not yet exist in a directory by inserting a
//! numeric counter before the extension.

use std::path::Path;

use crate::error::ConflictError;

/// Number of counter values probed before giving up
pub const MAX_SUFFIXES: usize = 1000;

fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).symlink_metadata().is_ok()
}

/// Return `desired` unchanged when free, otherwise the first free
/// `name.N.ext` (or `name.N` without an extension) for N in `0..1000`.
pub fn resolve(dir: &Path, desired: &str) -> Result<String, ConflictError> {
    if !exists(dir, desired) {
        return Ok(desired.to_string());
    }

    let candidate = |i: usize| match desired.rfind('.') {
        Some(dot) => format!("{}.{}{}", &desired[..dot], i, &desired[dot..]),
        None => format!("{}.{}", desired, i),
    };

    (0..MAX_SUFFIXES)
        .map(candidate)
        .find(|name| !exists(dir, name))
        .ok_or_else(|| ConflictError::Exhausted(desired.to_string()))
}
