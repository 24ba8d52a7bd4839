//! Configuration management for textlens
//!
//! Loads the TOML configuration, applies profile and environment overrides
//! and validates the result before any command runs.

use crate::error::{Result, TextlensError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub api: ApiConfig,
    pub render: RenderConfig,
    pub export: ExportConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
    /// Profile applied when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Analysis service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

/// Table sizes used when rendering results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub word_frequency_limit: usize,
    pub pos_limit: usize,
    pub keyword_limit: usize,
    pub ngram_limit: usize,
    /// Characters of a similarity label shown before truncation
    pub label_width: usize,
}

/// Where downloaded artifacts are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

/// Comprehensive report defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub title: String,
    pub basic: bool,
    pub advanced: bool,
    pub interactive: bool,
    pub json: bool,
    pub data: bool,
    pub summary: bool,
    /// Generate interactive charts right after every analysis
    pub auto_generate_interactive: bool,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_generate_interactive: Option<bool>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        Self::read(path)?.resolve(None)
    }

    /// Parse a configuration file as written, without any overrides
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TextlensError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TextlensError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TextlensError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with `profile` (or the active profile) applied
    pub fn load_with_profile(path: &Path, profile: Option<&str>) -> Result<Self> {
        Self::read(path)?.resolve(profile)
    }

    /// Apply the selected profile, then environment overrides, then validate.
    ///
    /// Without an explicit `profile` the active profile is used, if any.
    pub fn resolve(self, profile: Option<&str>) -> Result<Self> {
        self.resolve_with(profile, std::env::vars())
    }

    fn resolve_with<I>(mut self, profile: Option<&str>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let profile = profile
            .map(str::to_string)
            .or_else(|| self.meta.active_profile.clone());
        if let Some(profile) = profile {
            self.apply_profile(&profile)?;
            tracing::debug!("Applied profile '{}'", profile);
        }

        self.apply_overrides(vars);
        ConfigValidator::validate(&self)?;
        Ok(self)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| TextlensError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(base_url) = overrides.base_url {
            self.api.base_url = base_url;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.export.output_dir = output_dir;
        }
        if let Some(auto) = overrides.auto_generate_interactive {
            self.report.auto_generate_interactive = auto;
        }
        Ok(())
    }

    /// Make `profile` the default for later loads
    pub fn set_active_profile(&mut self, profile: &str) -> Result<()> {
        if !self.profiles.contains_key(profile) {
            return Err(TextlensError::Config(format!("Unknown profile: {}", profile)));
        }
        self.meta.active_profile = Some(profile.to_string());
        self.meta.last_modified = current_timestamp();
        Ok(())
    }

    /// Apply overrides in the environment variable format
    /// TEXTLENS_SECTION__KEY=value
    fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("TEXTLENS_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "API__BASE_URL" => {
                self.api.base_url = value.to_string();
            }
            "EXPORT__OUTPUT_DIR" => {
                self.export.output_dir = PathBuf::from(value);
            }
            "REPORT__TITLE" => {
                self.report.title = value.to_string();
            }
            "REPORT__AUTO_GENERATE_INTERACTIVE" => {
                self.report.auto_generate_interactive =
                    value
                        .parse()
                        .map_err(|_| TextlensError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Cannot parse '{}' as boolean", value),
                        })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Look up a single value by dotted key, e.g. `api.base_url`
    pub fn get_value(&self, key: &str) -> Result<toml::Value> {
        let root = toml::Value::try_from(self)?;
        key.split('.')
            .try_fold(&root, |node, part| node.get(part))
            .cloned()
            .ok_or_else(|| TextlensError::Config(format!("Unknown configuration key: {}", key)))
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            TextlensError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("textlens").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
                active_profile: None,
            },
            api: ApiConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
            },
            render: RenderConfig {
                word_frequency_limit: 30,
                pos_limit: 20,
                keyword_limit: 20,
                ngram_limit: 20,
                label_width: 20,
            },
            export: ExportConfig {
                output_dir: PathBuf::from("~/textlens/downloads"),
            },
            report: ReportConfig {
                title: "中文文本分析完整報告".to_string(),
                basic: true,
                advanced: true,
                interactive: true,
                json: true,
                data: true,
                summary: true,
                auto_generate_interactive: false,
            },
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.api.base_url = "http://analysis.local:8080".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.render.word_frequency_limit, 30);
        assert_eq!(loaded.report.title, "中文文本分析完整報告");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/textlens.toml")).unwrap_err();
        assert!(matches!(err, TextlensError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_apply_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "staging".to_string(),
            ProfileOverrides {
                base_url: Some("http://staging:3000".to_string()),
                ..Default::default()
            },
        );

        config.apply_profile("staging").unwrap();
        assert_eq!(config.api.base_url, "http://staging:3000");
        assert!(config.apply_profile("missing").is_err());
    }

    fn staging_config() -> Config {
        let mut config = Config::default();
        config.profiles.insert(
            "staging".to_string(),
            ProfileOverrides {
                base_url: Some("http://staging:3000".to_string()),
                ..Default::default()
            },
        );
        config
    }

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_override_beats_profile() {
        let config = staging_config()
            .resolve_with(
                Some("staging"),
                env(&[("TEXTLENS_API__BASE_URL", "http://from-env:9000")]),
            )
            .unwrap();
        assert_eq!(config.api.base_url, "http://from-env:9000");

        let config = staging_config()
            .resolve_with(Some("staging"), env(&[]))
            .unwrap();
        assert_eq!(config.api.base_url, "http://staging:3000");
    }

    #[test]
    fn test_active_profile_used_by_default() {
        let mut config = staging_config();
        config.set_active_profile("staging").unwrap();

        let config = config.resolve_with(None, env(&[])).unwrap();
        assert_eq!(config.api.base_url, "http://staging:3000");
    }

    #[test]
    fn test_resolve_validates_env_values() {
        let result = Config::default().resolve_with(
            None,
            env(&[("TEXTLENS_API__BASE_URL", "not a url")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_profile() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        staging_config().save(&path).unwrap();

        let config = Config::read(&path)
            .unwrap()
            .resolve_with(Some("staging"), env(&[]))
            .unwrap();
        assert_eq!(config.api.base_url, "http://staging:3000");
        assert!(Config::load_with_profile(&path, Some("missing")).is_err());
    }

    #[test]
    fn test_set_active_profile() {
        let mut config = Config::default();
        assert!(config.set_active_profile("lab").is_err());

        config
            .profiles
            .insert("lab".to_string(), ProfileOverrides::default());
        config.set_active_profile("lab").unwrap();
        assert_eq!(config.meta.active_profile.as_deref(), Some("lab"));
    }

    #[test]
    fn test_get_value() {
        let config = Config::default();
        let value = config.get_value("render.label_width").unwrap();
        assert_eq!(value.as_integer(), Some(20));
        assert!(config.get_value("render.nope").is_err());
    }
}
