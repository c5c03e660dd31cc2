use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// database_path = "/var/lib/weatherlog/observations.db"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API key used when a command does not supply one.
    pub api_key: Option<String>,

    /// Overrides the default location of the observations database.
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Resolve the credential for a provider call: an explicit argument
    /// wins over the configured key.
    pub fn resolve_api_key(&self, cli_key: Option<String>) -> Result<String> {
        cli_key.or_else(|| self.api_key.clone()).ok_or_else(|| {
            anyhow!(
                "No API key given.\n\
                 Hint: pass the key as an argument or run `weatherlog configure` to store one."
            )
        })
    }

    /// Where the observations database lives: the configured override,
    /// or the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = project_dirs()?;
        Ok(dirs.data_dir().join("observations.db"))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weatherlog", "weatherlog")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
