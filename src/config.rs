//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/listree/listree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `LISTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{RootPolicy, TreeBuilderConfig, DEFAULT_PK};

/// Environment variable prefix for overrides, e.g. `LISTREE_FK=parent`.
pub const ENV_PREFIX: &str = "LISTREE";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Unified configuration for listree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Record field holding the node id
    pub pk: String,
    /// Record field holding the parent id
    pub fk: String,
    /// Field name under which nested exports store children
    pub children_field: String,
    /// Handling of inputs without exactly one parentless record
    pub root_policy: RootPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pk: DEFAULT_PK.into(),
            fk: "parent_id".into(),
            children_field: "children".into(),
            root_policy: RootPolicy::Strict,
        }
    }
}

/// Get the XDG config directory for listree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "listree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("listree.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; must exist when given
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_layers(global.as_deref(), config_file, ENV_PREFIX)
    }

    #[instrument(level = "debug")]
    pub(crate) fn load_layers(
        global: Option<&Path>,
        config_file: Option<&Path>,
        env_prefix: &str,
    ) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("pk", defaults.pk)?
            .set_default("fk", defaults.fk)?
            .set_default("children_field", defaults.children_field)?
            .set_default("root_policy", "strict")?;

        if let Some(global_path) = global {
            debug!("global config: {}", global_path.display());
            builder = builder.add_source(File::from(global_path).required(false));
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(SettingsError::NotFound(path.to_path_buf()));
            }
            debug!("config file: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__"),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Builder configuration derived from these settings.
    pub fn builder_config(&self) -> TreeBuilderConfig {
        TreeBuilderConfig::new(self.fk.clone())
            .with_pk(self.pk.clone())
            .with_root_policy(self.root_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load_layers(None, None, "LISTREE_TEST_NOTHING").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_explicit_file_overrides_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join("local.toml");
        fs::write(&global, "fk = \"up\"\nchildren_field = \"kids\"\n").unwrap();
        fs::write(&local, "fk = \"parent\"\n").unwrap();

        let settings = Settings::load_layers(
            Some(global.as_path()),
            Some(local.as_path()),
            "LISTREE_TEST_LAYERS",
        )
        .unwrap();
        assert_eq!(settings.fk, "parent");
        assert_eq!(settings.children_field, "kids");
        assert_eq!(settings.pk, "id");
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("local.toml");
        fs::write(&local, "fk = \"parent\"\n").unwrap();
        std::env::set_var("LISTREE_TEST_ENVOVR_FK", "owner");
        std::env::set_var("LISTREE_TEST_ENVOVR_ROOT_POLICY", "last_wins");

        let settings =
            Settings::load_layers(None, Some(local.as_path()), "LISTREE_TEST_ENVOVR").unwrap();
        assert_eq!(settings.fk, "owner");
        assert_eq!(settings.root_policy, RootPolicy::LastWins);

        std::env::remove_var("LISTREE_TEST_ENVOVR_FK");
        std::env::remove_var("LISTREE_TEST_ENVOVR_ROOT_POLICY");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Settings::load_layers(None, Some(Path::new("/nonexistent/listree.toml")), "X");
        assert!(matches!(result, Err(SettingsError::NotFound(_))));
    }

    #[test]
    fn test_builder_config_carries_fields() {
        let settings = Settings {
            pk: "key".into(),
            fk: "up".into(),
            root_policy: RootPolicy::LastWins,
            ..Settings::default()
        };
        let config = settings.builder_config();
        assert_eq!(config.pk(), "key");
        assert_eq!(config.fk().unwrap(), "up");
        assert_eq!(config.root_policy, RootPolicy::LastWins);
    }
}
