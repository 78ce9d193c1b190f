use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::environment::Environment;
use crate::shared::SyncerConfig;

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides (`APP_NAME`, `APP_ONLINE_DDL__ENABLED`).
const ENV_PREFIX: &str = "APP";

/// Separator for nested keys in environment variable overrides.
const ENV_SEPARATOR: &str = "__";

/// Keys whose environment overrides are comma-separated lists.
const LIST_PARSE_KEYS: &[&str] = &[
    "block_allow_list.do_dbs",
    "block_allow_list.ignore_dbs",
    "online_ddl.shadow_table_rules",
    "online_ddl.trash_table_rules",
];

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("configuration directory `{0}` does not exist")]
    MissingDirectory(PathBuf),

    #[error("no `{stem}.{{yaml,yml,json}}` file in `{directory}`")]
    MissingFile { stem: String, directory: PathBuf },

    #[error("failed to locate the configuration: {0}")]
    Location(#[from] io::Error),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl SyncerConfig {
    /// Loads the task configuration from `./configuration`.
    ///
    /// `base.*` is read first, then the file named after `APP_ENVIRONMENT` (`dev` or `prod`),
    /// then `APP_`-prefixed environment variables. Nested keys use double underscores and list
    /// values are comma-separated (`APP_BLOCK_ALLOW_LIST__IGNORE_DBS=s1,s2`).
    pub fn load() -> Result<Self, LoadConfigError> {
        let directory = std::env::current_dir()?.join(CONFIGURATION_DIR);
        Self::load_from_dir(&directory, Environment::load()?)
    }

    /// Loads the task configuration from `directory` for `environment`.
    pub fn load_from_dir(
        directory: &Path,
        environment: Environment,
    ) -> Result<Self, LoadConfigError> {
        if !directory.is_dir() {
            return Err(LoadConfigError::MissingDirectory(directory.to_path_buf()));
        }

        let base = find_file(directory, "base")?;
        let overlay = find_file(directory, environment.as_str())?;

        let mut overrides = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_PARSE_KEYS {
            overrides = overrides.with_list_parse_key(key);
        }

        let config: SyncerConfig = config::Config::builder()
            .add_source(config::File::from(base))
            .add_source(config::File::from(overlay))
            .add_source(overrides)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

fn find_file(directory: &Path, stem: &str) -> Result<PathBuf, LoadConfigError> {
    CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadConfigError::MissingFile {
            stem: stem.to_string(),
            directory: directory.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.yaml"),
            "name: base-task\nblock_allow_list:\n  ignore_dbs: [s1]\n",
        )
        .unwrap();
        fs::write(dir.path().join("prod.yaml"), "name: prod-task\n").unwrap();

        let config = SyncerConfig::load_from_dir(dir.path(), Environment::Prod).unwrap();

        assert_eq!(config.name, "prod-task");
        assert_eq!(config.block_allow_list.ignore_dbs, vec!["s1".to_string()]);
        assert!(!config.online_ddl.enabled);
    }

    #[test]
    fn test_json_files_are_supported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.json"), r#"{"name": "json-task"}"#).unwrap();
        fs::write(
            dir.path().join("dev.json"),
            r#"{"online_ddl": {"enabled": true}}"#,
        )
        .unwrap();

        let config = SyncerConfig::load_from_dir(dir.path(), Environment::Dev).unwrap();

        assert_eq!(config.name, "json-task");
        assert!(config.online_ddl.enabled);
        assert!(!config.online_ddl.shadow_table_rules.is_empty());
    }

    #[test]
    fn test_missing_files_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.yaml"), "name: task\n").unwrap();

        let err = SyncerConfig::load_from_dir(dir.path(), Environment::Dev).unwrap_err();
        assert!(matches!(err, LoadConfigError::MissingFile { ref stem, .. } if stem == "dev"));

        let err = SyncerConfig::load_from_dir(&dir.path().join("nope"), Environment::Dev)
            .unwrap_err();
        assert!(matches!(err, LoadConfigError::MissingDirectory(_)));
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.yaml"), "name: [unterminated\n").unwrap();
        fs::write(dir.path().join("dev.yaml"), "name: task\n").unwrap();

        let err = SyncerConfig::load_from_dir(dir.path(), Environment::Dev).unwrap_err();

        assert!(matches!(err, LoadConfigError::Config(_)));
    }
}
