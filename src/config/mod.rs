use crate::models::ForwarderSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

pub const SETTINGS_FILE_NAME: &str = "Forwarder Settings.yaml";
pub const WARNINGS_TO_SUPPRESS_FILE_NAME: &str = "Warnings To Suppress.json";

/// Configuration problems that stop a run before any record is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No asset output directory is configured")]
    OutputDirectoryNotConfigured,

    #[error("Cannot find output directory specified in settings: {0}")]
    OutputDirectoryNotFound(Utf8PathBuf),

    #[error("Cannot find the mods folder specified in settings: {0}")]
    ModsFolderNotFound(Utf8PathBuf),

    #[error("Could not find the list of known missing files (expected at: {0})")]
    SuppressionListMissing(Utf8PathBuf),

    #[error("Could not parse the list of known missing files (expected at: {path}): {source}")]
    SuppressionListInvalid {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration manager for the settings file and the known missing files list.
///
/// Manages two files in the configuration directory:
/// - `Forwarder Settings.yaml`: plugins to forward, paths, mode and toggles
/// - `Warnings To Suppress.json`: asset paths known to be missing
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    warnings_to_suppress_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "Forwarder Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
            warnings_to_suppress_path: config_dir.join(WARNINGS_TO_SUPPRESS_FILE_NAME),
            config_dir,
        })
    }

    /// Load the settings file.
    ///
    /// # Returns
    /// The loaded settings, or defaults if the file doesn't exist
    pub fn load_settings(&self) -> Result<ForwarderSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(ForwarderSettings::default());
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: ForwarderSettings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!(
            "Loaded settings from {} ({} plugins to forward)",
            self.settings_path,
            settings.plugins_to_forward.len()
        );
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save_settings(&self, settings: &ForwarderSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the list of known missing files.
    ///
    /// The file is a JSON array of asset paths. Entries written with doubled backslashes
    /// are unescaped once more (`\\` -> `\`) so they match paths as stored in records.
    /// A missing or malformed file is only an error when `suppression_enabled`.
    pub fn load_warnings_to_suppress(&self, suppression_enabled: bool) -> Result<Vec<String>> {
        let path = &self.warnings_to_suppress_path;

        if !path.exists() {
            if suppression_enabled {
                return Err(ConfigError::SuppressionListMissing(path.clone()).into());
            }
            tracing::debug!("No list of known missing files at {}", path);
            return Ok(Vec::new());
        }

        let file_contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read list of known missing files: {}", path))?;

        let entries: Vec<String> = match serde_json::from_str(&file_contents) {
            Ok(entries) => entries,
            Err(source) if suppression_enabled => {
                return Err(ConfigError::SuppressionListInvalid {
                    path: path.clone(),
                    source,
                }
                .into());
            }
            Err(e) => {
                tracing::warn!("Ignoring unparseable list of known missing files {}: {}", path, e);
                return Ok(Vec::new());
            }
        };

        let warnings: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.replace("\\\\", "\\"))
            .collect();

        if suppression_enabled {
            tracing::info!(
                "Found list of known missing files to suppress (contains {} entries).",
                warnings.len()
            );
        }

        Ok(warnings)
    }

    /// Check the directories a run depends on before anything is processed.
    pub fn validate_runnability(settings: &ForwarderSettings) -> Result<(), ConfigError> {
        let output = &settings.asset_output_directory;
        if output.as_str().is_empty() {
            return Err(ConfigError::OutputDirectoryNotConfigured);
        }
        if !output.is_dir() {
            return Err(ConfigError::OutputDirectoryNotFound(output.clone()));
        }

        if settings.has_mods_folder() && !settings.mods_folder_path.is_dir() {
            return Err(ConfigError::ModsFolderNotFound(
                settings.mods_folder_path.clone(),
            ));
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn warnings_to_suppress_path(&self) -> &Utf8Path {
        &self.warnings_to_suppress_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.settings_path().ends_with(SETTINGS_FILE_NAME));
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = ForwarderSettings::default();
        settings.copy_extra_assets = false;
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings().unwrap();
        assert!(!loaded.copy_extra_assets);
    }

    #[test]
    fn test_missing_settings_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let loaded = manager.load_settings().unwrap();
        assert!(loaded.copy_extra_assets);
    }

    #[test]
    fn test_warnings_unescaped() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(
            manager.warnings_to_suppress_path(),
            r#"["textures\\\\actors\\\\skin.dds", "plain.dds"]"#,
        )
        .unwrap();

        let warnings = manager.load_warnings_to_suppress(true).unwrap();
        assert_eq!(warnings, vec!["textures\\actors\\skin.dds", "plain.dds"]);
    }

    #[test]
    fn test_missing_warnings_file() {
        let (manager, _temp_dir) = create_test_config_manager();

        assert!(manager.load_warnings_to_suppress(false).unwrap().is_empty());

        let err = manager.load_warnings_to_suppress(true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::SuppressionListMissing(_))
        ));
    }

    #[test]
    fn test_malformed_warnings_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.warnings_to_suppress_path(), "{ not json").unwrap();

        assert!(manager.load_warnings_to_suppress(false).unwrap().is_empty());
        assert!(manager.load_warnings_to_suppress(true).is_err());
    }

    #[test]
    fn test_validate_runnability() {
        let (manager, _temp_dir) = create_test_config_manager();
        let mut settings = ForwarderSettings::default();

        assert!(matches!(
            ConfigManager::validate_runnability(&settings),
            Err(ConfigError::OutputDirectoryNotConfigured)
        ));

        settings.asset_output_directory = manager.config_dir().join("missing");
        assert!(matches!(
            ConfigManager::validate_runnability(&settings),
            Err(ConfigError::OutputDirectoryNotFound(_))
        ));

        settings.asset_output_directory = manager.config_dir().to_path_buf();
        assert!(ConfigManager::validate_runnability(&settings).is_ok());

        settings.mods_folder_path = manager.config_dir().join("mods");
        assert!(matches!(
            ConfigManager::validate_runnability(&settings),
            Err(ConfigError::ModsFolderNotFound(_))
        ));
    }
}
