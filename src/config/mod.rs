use crate::models::UserConfig;
use crate::services::bookmarks::{JsonFileKvStore, KvBookmarkStore};
use ::config::{Config, Environment, File, FileFormat};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "MailSift Data";

/// Prefix for environment overrides, e.g. `MAILSIFT_PREVIEW__COUNT=20`.
pub const ENV_PREFIX: &str = "MAILSIFT";

const SETTINGS_FILE: &str = "settings.yaml";
const STORAGE_FILE: &str = "storage.json";

/// Configuration manager for the data directory.
///
/// Manages two files:
/// - Settings (`settings.yaml`): filter defaults, preview and logging options
/// - Storage (`storage.json`): key-value store holding saved keyword bookmarks
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    storage_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            storage_path: config_dir.join(STORAGE_FILE),
            config_dir,
        })
    }

    /// Load user settings.
    ///
    /// Layers, lowest precedence first: built-in defaults, `settings.yaml`
    /// (optional), then `MAILSIFT_*` environment variables with `__` between
    /// section and key.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.settings_path.exists() {
            tracing::info!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let layered = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let config: UserConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings: {:?}", config);
        Ok(config)
    }

    /// Save user settings to `settings.yaml`.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Write default settings unless a settings file already exists.
    ///
    /// Returns `true` when a file was written.
    pub fn init_user_config(&self, overwrite: bool) -> Result<bool> {
        if self.settings_path.exists() && !overwrite {
            tracing::info!("Settings already exist at {}", self.settings_path);
            return Ok(false);
        }

        self.save_user_config(&UserConfig::default())?;
        Ok(true)
    }

    /// Bookmark store backed by `storage.json` in the data directory.
    pub fn bookmark_store(&self) -> KvBookmarkStore<JsonFileKvStore> {
        KvBookmarkStore::new(JsonFileKvStore::new(&self.storage_path))
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn storage_path(&self) -> &Utf8Path {
        &self.storage_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_paths() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.settings_path().ends_with("settings.yaml"));
        assert!(manager.storage_path().ends_with("storage.json"));
    }

    #[test]
    fn test_load_defaults_without_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        let config = manager.load_user_config().unwrap();
        assert_eq!(config.filters.output_format, OutputFormat::SameAsInput);
        assert_eq!(config.preview.count, 100);
    }

    #[test]
    fn test_load_save_user_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = UserConfig::default();
        config.filters.remove_numeric_start = true;
        config.filters.keywords = "spam, promo".to_string();
        config.filters.output_format = OutputFormat::Xlsx;
        manager.save_user_config(&config).unwrap();

        let loaded = manager.load_user_config().unwrap();
        assert!(loaded.filters.remove_numeric_start);
        assert_eq!(loaded.filters.keywords, "spam, promo");
        assert_eq!(loaded.filters.output_format, OutputFormat::Xlsx);
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.init_user_config(false).unwrap());

        fs::write(manager.settings_path(), "preview:\n  count: 7\n").unwrap();
        assert!(!manager.init_user_config(false).unwrap());
        assert_eq!(manager.load_user_config().unwrap().preview.count, 7);

        assert!(manager.init_user_config(true).unwrap());
        assert_eq!(manager.load_user_config().unwrap().preview.count, 100);
    }

    #[test]
    fn test_bookmark_store_uses_storage_file() {
        use crate::services::bookmarks::BookmarkStore;

        let (manager, _temp_dir) = create_test_config_manager();
        manager.bookmark_store().save("spam").unwrap();

        assert!(manager.storage_path().exists());
        assert_eq!(manager.bookmark_store().load_all().unwrap(), vec!["spam"]);
    }
}
