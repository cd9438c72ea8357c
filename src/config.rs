//! Configuration management for the RAX file manager
//!
//! Limits and whitelists are loaded once and handed to the engine at
//! construction; nothing here is mutated while requests are processed.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Engine configuration: the sandbox root plus every quota and whitelist
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Root directory all actions are confined to
    /// Environment: FILEMANAGER_BASE_PATH
    pub base_path: String,

    /// Maximum number of directories under the root, the root included
    pub max_folders: usize,

    /// Total space allowed under the root, in KB
    pub max_space_kb: u64,

    /// Largest single upload, in KB
    pub max_file_size_kb: u64,

    /// Allowed file extensions without the dot; empty means unrestricted
    /// Environment: FILEMANAGER_EXTENSIONS (comma separated)
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Enforce `max_space_kb` on uploads
    pub check_space: bool,

    /// Report consumed space to the presentation layer
    pub show_space: bool,
}

impl EngineConfig {
    /// Configuration rooted at `base_path` with the default limits
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            max_folders: 50,
            max_space_kb: 5 * 1024,
            max_file_size_kb: 5 * 1024,
            extensions: Vec::new(),
            check_space: true,
            show_space: true,
        }
    }

    /// Load configuration from defaults, an optional TOML file and environment overrides.
    ///
    /// Without an explicit file, `config.toml` in the working directory is used
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("max_folders", 50_i64)?
            .set_default("max_space_kb", 5 * 1024_i64)?
            .set_default("max_file_size_kb", 5 * 1024_i64)?
            .set_default("extensions", Vec::<String>::new())?
            .set_default("check_space", true)?
            .set_default("show_space", true)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix("FILEMANAGER")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("extensions"),
            )
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.base_path.is_empty() {
            return Err(config::ConfigError::Message(
                "base_path cannot be empty".into(),
            ));
        }

        if self.max_folders == 0 {
            return Err(config::ConfigError::Message(
                "max_folders must be greater than 0".into(),
            ));
        }

        if self.max_file_size_kb == 0 {
            return Err(config::ConfigError::Message(
                "max_file_size_kb must be greater than 0".into(),
            ));
        }

        if self.check_space && self.max_space_kb == 0 {
            return Err(config::ConfigError::Message(
                "max_space_kb must be greater than 0 when check_space is enabled".into(),
            ));
        }

        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.'))
        {
            return Err(config::ConfigError::Message(format!(
                "extensions must be given without dots: {ext:?}"
            )));
        }

        Ok(())
    }

    /// Get the root as PathBuf
    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.base_path)
    }

    /// Largest single upload in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb * 1024
    }

    /// Total space allowance in bytes
    pub fn max_space_bytes(&self) -> u64 {
        self.max_space_kb * 1024
    }

    /// Whether any extension whitelist is in force
    pub fn restricts_extensions(&self) -> bool {
        !self.extensions.is_empty()
    }

    /// Whether `ext` is on the whitelist
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|allowed| allowed == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_limits() {
        let config = EngineConfig::new("/srv/files");
        assert_eq!(config.max_file_size_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.max_space_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.max_folders, 50);
        assert!(!config.restricts_extensions());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::new("");
        assert!(config.validate().is_err());

        config.base_path = "/srv/files".into();
        config.max_folders = 0;
        assert!(config.validate().is_err());

        config.max_folders = 10;
        config.extensions = vec![".py".into()];
        assert!(config.validate().is_err());

        config.extensions = vec!["py".into()];
        assert!(config.validate().is_ok());
        assert!(config.allows_extension("py"));
        assert!(!config.allows_extension("exe"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filemanager.toml");
        std::fs::write(
            &path,
            "base_path = \"/srv/files\"\nmax_folders = 7\nextensions = [\"py\", \"zip\"]\ncheck_space = false\n",
        )
        .unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_path, "/srv/files");
        assert_eq!(config.max_folders, 7);
        assert_eq!(config.max_file_size_kb, 5 * 1024);
        assert_eq!(config.extensions, vec!["py".to_string(), "zip".to_string()]);
        assert!(!config.check_space);
        assert!(config.show_space);
    }
}
