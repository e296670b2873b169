//! Configuration management for jiradump.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/jiradump/config.toml`
//! - **Windows**: `%APPDATA%\jiradump\config.toml`
//!
//! Passwords are never written to the config file.
//!
//! # Example
//!
//! ```toml
//! [jira]
//! url = "jira.example.com"
//! username = "reporter"
//!
//! [export]
//! projects = ["ABC", "XYZ"]
//! outdir = "./data"
//!
//! [custom_fields]
//! customfield_11520 = "line_of_business"
//! ```

use crate::types::{CustomFieldSpec, DEFAULT_MAX_RESULTS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "jiradump";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Jira connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraConfig>,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Custom field identifier -> CSV column name
    #[serde(default, skip_serializing_if = "CustomFieldSpec::is_empty")]
    pub custom_fields: CustomFieldSpec,
}

/// Jira connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Jira host without scheme (e.g., "jira.example.com")
    pub url: String,
    /// Username for basic auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Project keys to export, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    /// Output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdir: Option<PathBuf>,
    /// Page size for search requests
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Restrict the export to one issue type (e.g., "Story")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    /// Keep the description column (markdown stripped)
    #[serde(default)]
    pub include_description: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            outdir: None,
            max_results: DEFAULT_MAX_RESULTS,
            issue_type: None,
            include_description: false,
        }
    }
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `jira.url`, `export.outdir`,
    /// `custom_fields.customfield_11520`). `export.projects` takes a comma
    /// separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "jira" => {
                let config = self.jira.get_or_insert_with(|| JiraConfig {
                    url: String::new(),
                    username: None,
                });
                match field {
                    "url" => config.url = value.to_string(),
                    "username" | "user" => config.username = Some(value.to_string()),
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown Jira config field: {}",
                            field
                        )))
                    }
                }
            }
            "export" => {
                let config = &mut self.export;
                match field {
                    "projects" | "project_ids" => {
                        config.projects = value
                            .split(',')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(str::to_string)
                            .collect();
                    }
                    "outdir" => config.outdir = Some(PathBuf::from(value)),
                    "max_results" => {
                        config.max_results = value.parse().map_err(|_| {
                            Error::Config(format!("Invalid max_results value: {}", value))
                        })?;
                    }
                    "issue_type" => config.issue_type = Some(value.to_string()),
                    "include_description" => {
                        config.include_description = value.parse().map_err(|_| {
                            Error::Config(format!(
                                "Invalid include_description value: {}",
                                value
                            ))
                        })?;
                    }
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown export config field: {}",
                            field
                        )))
                    }
                }
            }
            "custom_fields" => self.custom_fields.insert(field, value),
            _ => {
                return Err(Error::Config(format!("Unknown section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `jira.url`, `export.max_results`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "jira" => {
                let Some(config) = &self.jira else {
                    return Ok(None);
                };
                match field {
                    "url" => Ok(Some(config.url.clone())),
                    "username" | "user" => Ok(config.username.clone()),
                    _ => Err(Error::Config(format!(
                        "Unknown Jira config field: {}",
                        field
                    ))),
                }
            }
            "export" => {
                let config = &self.export;
                match field {
                    "projects" | "project_ids" => Ok(if config.projects.is_empty() {
                        None
                    } else {
                        Some(config.projects.join(","))
                    }),
                    "outdir" => Ok(config.outdir.as_ref().map(|p| p.display().to_string())),
                    "max_results" => Ok(Some(config.max_results.to_string())),
                    "issue_type" => Ok(config.issue_type.clone()),
                    "include_description" => Ok(Some(config.include_description.to_string())),
                    _ => Err(Error::Config(format!(
                        "Unknown export config field: {}",
                        field
                    ))),
                }
            }
            "custom_fields" => Ok(self
                .custom_fields
                .iter()
                .find(|e| e.id == field)
                .map(|e| e.name.clone())),
            _ => Err(Error::Config(format!("Unknown section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Tests
// =============================================================================
