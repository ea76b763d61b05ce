//! Typed TOML configuration for voxnote.
//!
//! Every field has a hard-coded default; a user config file only overlays
//! the fields it actually sets. There is no dynamic key tree — the CLI
//! `config get`/`config set` commands operate over a closed key set.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Result, VoxnoteError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub transcription: TranscriptionConfig,
    pub cleanup: CleanupConfig,
    pub processing: ProcessingConfig,
}

/// Obsidian vault output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    /// Root of the Obsidian vault. Must be set before processing.
    pub path: Option<PathBuf>,
    pub output_folder: String,
    pub filename_pattern: String,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub model: String,
    /// Optional language hint (e.g. "en", "zh"). None lets the API detect.
    pub language: Option<String>,
}

/// Text-rewrite configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleanupConfig {
    pub model: String,
}

/// Deterministic cleanup pass configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessingConfig {
    pub filler_words: Vec<String>,
    pub filler_words_chinese: Vec<String>,
    /// One of "low", "moderate", "high".
    pub aggressiveness: String,
    /// Accepted for forward compatibility; heading detection is not
    /// implemented and this flag currently has no effect.
    pub add_headings: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: None,
            output_folder: defaults::DEFAULT_OUTPUT_FOLDER.to_string(),
            filename_pattern: defaults::DEFAULT_FILENAME_PATTERN.to_string(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: defaults::TRANSCRIPTION_MODEL.to_string(),
            language: None,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            model: defaults::CLEANUP_MODEL.to_string(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            filler_words: defaults::default_filler_words(),
            filler_words_chinese: defaults::default_filler_words_chinese(),
            aggressiveness: "moderate".to_string(),
            add_headings: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoxnoteError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VoxnoteError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if the file is missing.
    ///
    /// Only a missing file falls back to defaults; invalid TOML still errors.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(VoxnoteError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Save configuration as TOML, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| VoxnoteError::Other(format!(
            "Failed to serialize configuration: {e}"
        )))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment variable overrides.
    ///
    /// Supported environment variables:
    /// - VOXNOTE_VAULT → vault.path
    /// - VOXNOTE_MODEL → transcription.model
    /// - VOXNOTE_LANGUAGE → transcription.language
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(vault) = std::env::var("VOXNOTE_VAULT")
            && !vault.is_empty()
        {
            self.vault.path = Some(PathBuf::from(vault));
        }

        if let Ok(model) = std::env::var("VOXNOTE_MODEL")
            && !model.is_empty()
        {
            self.transcription.model = model;
        }

        if let Ok(language) = std::env::var("VOXNOTE_LANGUAGE")
            && !language.is_empty()
        {
            self.transcription.language = Some(language);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxnote/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxnote")
            .join("config.toml")
    }

    /// Resolve the API key from the environment.
    ///
    /// `.env` loading (dotenvy) happens once at startup in main.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(defaults::API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(VoxnoteError::ConfigValidation {
                message: format!(
                    "API key not found in environment variable {}. \
                     Set it in your environment or a .env file.",
                    defaults::API_KEY_ENV
                ),
            }),
        }
    }

    /// Validate that required configuration is present.
    ///
    /// These are the only errors fatal to a whole invocation; they are
    /// raised before any recording is processed.
    pub fn validate(&self) -> Result<()> {
        let vault = self.vault.path.as_ref().ok_or_else(|| {
            VoxnoteError::ConfigValidation {
                message: "Obsidian vault path not configured. \
                          Set it with `voxnote config set vault.path /path/to/vault`"
                    .to_string(),
            }
        })?;

        if !vault.exists() {
            return Err(VoxnoteError::ConfigValidation {
                message: format!("Vault path does not exist: {}", vault.display()),
            });
        }

        if !vault.is_dir() {
            return Err(VoxnoteError::ConfigValidation {
                message: format!("Vault path is not a directory: {}", vault.display()),
            });
        }

        self.api_key()?;

        Ok(())
    }

    /// Read a configuration value by key.
    ///
    /// The key set is closed; unknown keys are an error.
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "vault.path" => self
                .vault
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unset)".to_string()),
            "vault.output_folder" => self.vault.output_folder.clone(),
            "vault.filename_pattern" => self.vault.filename_pattern.clone(),
            "transcription.model" => self.transcription.model.clone(),
            "transcription.language" => self
                .transcription
                .language
                .clone()
                .unwrap_or_else(|| "auto".to_string()),
            "cleanup.model" => self.cleanup.model.clone(),
            "processing.aggressiveness" => self.processing.aggressiveness.clone(),
            "processing.add_headings" => self.processing.add_headings.to_string(),
            _ => {
                return Err(VoxnoteError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "unknown configuration key".to_string(),
                });
            }
        };
        Ok(value)
    }

    /// Set a configuration value by key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "vault.path" => self.vault.path = Some(PathBuf::from(value)),
            "vault.output_folder" => self.vault.output_folder = value.to_string(),
            "vault.filename_pattern" => self.vault.filename_pattern = value.to_string(),
            "transcription.model" => self.transcription.model = value.to_string(),
            "transcription.language" => {
                self.transcription.language = if value == "auto" || value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "cleanup.model" => self.cleanup.model = value.to_string(),
            "processing.aggressiveness" => {
                if !matches!(value, "low" | "moderate" | "high") {
                    return Err(VoxnoteError::ConfigInvalidValue {
                        key: key.to_string(),
                        message: "must be one of: low, moderate, high".to_string(),
                    });
                }
                self.processing.aggressiveness = value.to_string();
            }
            "processing.add_headings" => {
                self.processing.add_headings = match value {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => {
                        return Err(VoxnoteError::ConfigInvalidValue {
                            key: key.to_string(),
                            message: "must be a boolean".to_string(),
                        });
                    }
                };
            }
            _ => {
                return Err(VoxnoteError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "unknown configuration key".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Combined English + Chinese filler word list for the cleanup pass.
    pub fn filler_words(&self) -> Vec<String> {
        let mut words = self.processing.filler_words.clone();
        words.extend(self.processing.filler_words_chinese.iter().cloned());
        words
    }
}
