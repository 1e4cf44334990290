//! Configuration management for lsgit
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (LSGIT_*)
//! 3. Config file (~/.config/lsgit/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings for the external status probe
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Shell used to run the probe script
    pub shell: String,

    /// Path to the git executable the script invokes
    pub git_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            git_path: "git".to_string(),
        }
    }
}

/// How annotations are laid out
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// Text placed between branch, remote and fast-forward fields
    pub separator: String,

    /// Text appended after the last field
    pub trailer: String,

    /// Pad every field to the widest value in the current table
    pub align: bool,

    /// Tag identifying annotations placed by this renderer
    pub owner: String,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            separator: "-".to_string(),
            trailer: " ".to_string(),
            align: true,
            owner: "lsgit".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Probe configuration
    pub probe: ProbeConfig,

    /// Annotation appearance
    pub annotation: AnnotationStyle,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/lsgit/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lsgit").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - LSGIT_SHELL: Shell that runs the probe
    /// - LSGIT_GIT_PATH: Path to git executable
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(shell) = std::env::var("LSGIT_SHELL") {
            self.probe.shell = shell;
        }

        if let Ok(git_path) = std::env::var("LSGIT_GIT_PATH") {
            self.probe.git_path = git_path;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, shell: Option<String>, git_path: Option<String>) -> Self {
        if let Some(shell) = shell {
            self.probe.shell = shell;
        }

        if let Some(git_path) = git_path {
            self.probe.git_path = git_path;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(shell: Option<String>, git_path: Option<String>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(shell, git_path))
    }
}
