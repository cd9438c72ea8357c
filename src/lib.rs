pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod navigate;
pub mod storage;

pub use actions::{ActionKind, ActionRequest, EntryKind, UploadedFile};
pub use config::EngineConfig;
pub use engine::FileManager;
