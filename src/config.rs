use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_LOCALE;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub i18n: I18nConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct I18nConfig {
    // Persisted language preference; "auto" follows the system locale
    pub language: String,
    pub default_locale: String,
    // Directory of <locale>.json files replacing the bundled copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_dir: Option<PathBuf>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            default_locale: DEFAULT_LOCALE.to_string(),
            catalog_dir: None,
        }
    }
}

impl Config {
    /// Read the config file, writing the defaults when it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(config_dir) = path.parent() {
            fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to save config {}", path.display()))?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CI18N_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coach-i18n")
            .join("config.toml")
    }

    /// The preferred language tag, or `None` when neither the config nor the
    /// environment names one.
    pub fn get_effective_language(&self) -> Option<String> {
        if self.i18n.language != "auto" {
            return Some(self.i18n.language.clone());
        }
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.i18n.language, "auto");
        assert_eq!(config.i18n.default_locale, "en");
        assert!(path.exists());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.i18n.language = "bg".to_string();
        config.i18n.catalog_dir = Some(PathBuf::from("/srv/site/locales"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.i18n.language, "bg");
        assert_eq!(loaded.i18n.catalog_dir, Some(PathBuf::from("/srv/site/locales")));
        assert_eq!(loaded.get_effective_language().as_deref(), Some("bg"));
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[i18n]\nlanguage = \"en\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.i18n.language, "en");
        assert_eq!(loaded.i18n.default_locale, "en");
        assert!(loaded.i18n.catalog_dir.is_none());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[i18n\nlanguage = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
