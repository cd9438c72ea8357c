//! Error handlers
//!
//! Logs action errors at a level matching their severity.

use crate::error::types::{ActionError, QuotaError};
use log::{error, warn};

/// Log an action error before it is reported to the caller
pub fn handle_error(err: &ActionError) {
    match err {
        ActionError::Filesystem { message, source } => {
            error!("Filesystem failure: {} ({})", message, source)
        }
        ActionError::Unexpected(detail) => error!("Unexpected failure: {}", detail),
        ActionError::Quota(QuotaError::Scan(e)) => error!("Quota scan failed: {}", e),
        other if is_rejection(other) => warn!("Action rejected: {}", other),
        other => error!("Action failed: {}", other),
    }
}

/// Whether the error is a rule rejection rather than an operational failure
pub fn is_rejection(err: &ActionError) -> bool {
    !matches!(
        err,
        ActionError::Filesystem { .. }
            | ActionError::Unexpected(_)
            | ActionError::ArchiveUnreadable
            | ActionError::Quota(QuotaError::Scan(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_rejections_and_failures_are_distinguished() {
        assert!(is_rejection(&ActionError::RootDeletionRejected));
        assert!(is_rejection(&ActionError::SelfMoveRejected));
        assert!(!is_rejection(&ActionError::Unexpected("boom".into())));
        assert!(!is_rejection(&ActionError::filesystem(
            "File couldn't be deleted : a.txt",
            io::Error::from(io::ErrorKind::PermissionDenied),
        )));
    }
}
