//! `.streamlit/config.toml` written during setup

use crate::error::{Error, Result};
use crate::settings::FrontendSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Streamlit configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamlitConfig {
    /// `[server]` table
    pub server: ServerSection,
    /// `[browser]` table
    pub browser: BrowserSection,
}

/// `[server]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Listen port
    pub port: u16,
    /// Do not open a browser
    pub headless: bool,
    /// Bind address
    pub address: String,
}

/// `[browser]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSection {
    /// Streamlit telemetry
    #[serde(rename = "gatherUsageStats")]
    pub gather_usage_stats: bool,
}

impl StreamlitConfig {
    /// Config matching the frontend settings, telemetry off
    #[must_use]
    pub fn from_frontend(frontend: &FrontendSettings) -> Self {
        Self {
            server: ServerSection {
                port: frontend.port,
                headless: frontend.headless,
                address: frontend.host.clone(),
            },
            browser: BrowserSection {
                gather_usage_stats: false,
            },
        }
    }

    /// TOML text
    ///
    /// # Errors
    /// Returns [`Error::Serialize`] if serialization fails.
    pub fn render(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Serialize {
            what: "streamlit config",
            message: e.to_string(),
        })
    }

    /// Write to `path` unless a file is already there
    ///
    /// Returns `true` when the file was created.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn write_if_missing(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(path, self.render()?).map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), "Wrote Streamlit config");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_contains_sections() {
        let config = StreamlitConfig::from_frontend(&FrontendSettings::default());
        let text = config.render().unwrap();
        assert!(text.contains("[server]"));
        assert!(text.contains("port = 8501"));
        assert!(text.contains("gatherUsageStats = false"));
    }

    #[test]
    fn test_write_if_missing_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".streamlit").join("config.toml");
        let config = StreamlitConfig::from_frontend(&FrontendSettings::default());

        assert!(config.write_if_missing(&path).unwrap());
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();
        assert!(!config.write_if_missing(&path).unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[server]\nport = 9999\n"
        );
    }
}
