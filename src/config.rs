//! Configuration Management
//!
//! Handles persistent configuration storage for the `dlp` CLI.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gcp::client::{ClientConfig, DEFAULT_ENDPOINT};

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used project ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// Service endpoint override (e.g. a regional endpoint)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Page size sent when a list command leaves it unset
    #[serde(default)]
    pub page_size: Option<i32>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dlp").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path; a missing or unreadable file yields the default
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project_id.clone())
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Get effective endpoint (CLI > config > service default)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Set project and save
    pub fn set_project(&mut self, project_id: &str) -> Result<()> {
        if !crate::gcp::auth::validate_project_id(project_id) {
            anyhow::bail!("Invalid project ID format: {:?}", project_id);
        }
        self.project_id = Some(project_id.to_string());
        self.save()
    }

    /// Build the client settings for this run
    pub fn to_client_config(&self, cli_endpoint: Option<&str>) -> ClientConfig {
        let config = ClientConfig::default().with_endpoint(self.effective_endpoint(cli_endpoint));
        match self.page_size {
            Some(size) if size > 0 => config.with_page_size(size),
            _ => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("dlp-config-test-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from(&scratch_path("missing"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path("roundtrip");
        let config = Config {
            project_id: Some("my-project-1".into()),
            endpoint: Some("https://dlp.europe-west1.rep.googleapis.com".into()),
            page_size: Some(50),
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_is_default() {
        let path = scratch_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_set_project_rejects_invalid_id() {
        let mut config = Config {
            project_id: Some("kept-project".into()),
            ..Config::default()
        };
        assert!(config.set_project("Bad_Project").is_err());
        assert!(config.set_project("").is_err());
        assert_eq!(config.project_id.as_deref(), Some("kept-project"));
    }

    #[test]
    fn test_cli_wins() {
        let config = Config {
            project_id: Some("from-config".into()),
            endpoint: Some("http://config".into()),
            page_size: None,
        };
        assert_eq!(
            config.effective_project(Some("from-cli")).as_deref(),
            Some("from-cli")
        );
        assert_eq!(config.effective_project(None).as_deref(), Some("from-config"));
        assert_eq!(config.effective_endpoint(Some("http://cli")), "http://cli");
        assert_eq!(config.effective_endpoint(None), "http://config");
        assert_eq!(Config::default().effective_endpoint(None), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_client_config_page_size() {
        let config = Config {
            page_size: Some(25),
            ..Config::default()
        };
        let client = config.to_client_config(Some("http://localhost:9999"));
        assert_eq!(client.page_size, Some(25));
        assert_eq!(client.endpoint, "http://localhost:9999");

        let zero = Config {
            page_size: Some(0),
            ..Config::default()
        };
        assert_eq!(zero.to_client_config(None).page_size, None);
    }
}
