//! File system storage management
//!
//! Path validation, quotas, collision-safe naming, content sniffing and the
//! low-level file operations the action handlers build on.

pub mod conflict;
pub mod filesystem;
pub mod quota;
pub mod sniff;
pub mod validation;

pub use quota::QuotaGuard;
pub use sniff::SniffedType;
pub use validation::Sandbox;
