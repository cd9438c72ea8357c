//! Engine core functionality
//!
//! The `FileManager` façade over validation, dispatch and tree building.

pub mod core;

pub use self::core::FileManager;
