//! Launcher settings
//!
//! Contains all configuration structures for the launcher. Values come from
//! [`crate::loader`]; the `Default` impls mirror `config/default.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Launcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LauncherSettings {
    /// Interpreter discovery
    #[serde(default)]
    pub python: PythonSettings,
    /// Web dashboard
    #[serde(default)]
    pub frontend: FrontendSettings,
    /// Agent runtime
    #[serde(default)]
    pub backend: BackendSettings,
    /// Child process supervision
    #[serde(default)]
    pub supervisor: SupervisorSettings,
    /// Python packages checked during setup and validation
    #[serde(default)]
    pub dependencies: DependencySettings,
}

/// Interpreter discovery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonSettings {
    /// Names tried on `PATH`, in order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
    /// Explicit interpreter path, skips discovery
    #[serde(default)]
    pub interpreter: Option<String>,
    /// Oldest supported interpreter
    #[serde(default = "default_min_version")]
    pub min_version: String,
    /// First interpreter version the backend framework breaks on
    #[serde(default = "default_backend_max_version")]
    pub backend_max_version: String,
}

impl Default for PythonSettings {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            interpreter: None,
            min_version: default_min_version(),
            backend_max_version: default_backend_max_version(),
        }
    }
}

fn default_candidates() -> Vec<String> {
    vec!["python3".to_string(), "python".to_string()]
}

fn default_min_version() -> String {
    "3.8".to_string()
}

fn default_backend_max_version() -> String {
    "3.13".to_string()
}

/// Web dashboard settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendSettings {
    /// Streamlit script, relative to the project root
    #[serde(default = "default_app")]
    pub app: String,
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Default port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Ports probed by setup and validation
    #[serde(default = "default_probe_ports")]
    pub probe_ports: Vec<u16>,
    /// Run Streamlit without opening a browser
    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            app: default_app(),
            host: default_host(),
            port: default_port(),
            probe_ports: default_probe_ports(),
            headless: true,
        }
    }
}

impl FrontendSettings {
    /// URL the dashboard is served on
    #[must_use]
    pub fn url(&self, host: &str, port: u16) -> String {
        let host = if host == "0.0.0.0" { "localhost" } else { host };
        format!("http://{}:{}", host, port)
    }
}

fn default_app() -> String {
    "src/frontend/app.py".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_probe_ports() -> Vec<u16> {
    vec![8501, 8502, 8503]
}

fn default_true() -> bool {
    true
}

/// Agent runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Agent runtime script, relative to the project root
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Any one of these must be importable before a backend mode starts
    #[serde(default = "default_orchestration_modules")]
    pub orchestration_modules: Vec<String>,
    /// Working directory handed to the agents
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            orchestration_modules: default_orchestration_modules(),
            work_dir: None,
        }
    }
}

impl BackendSettings {
    /// Configured work directory, or `<data-local-dir>/repomaster/workspace`
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("repomaster")
                .join("workspace")
        })
    }
}

fn default_entry() -> String {
    "launcher.py".to_string()
}

fn default_orchestration_modules() -> Vec<String> {
    vec!["autogen".to_string(), "autogen_agentchat".to_string()]
}

/// Child supervision settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorSettings {
    /// Seconds to wait for the child after an interrupt before killing it
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
        }
    }
}

impl SupervisorSettings {
    /// Grace period as a duration
    #[must_use]
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

fn default_grace_secs() -> u64 {
    5
}

/// A Python package and the module it installs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Name passed to pip
    pub package: String,
    /// Name passed to `import`
    pub import: String,
    /// What it is used for
    #[serde(default)]
    pub description: String,
}

impl DependencySpec {
    /// Shorthand constructor
    #[must_use]
    pub fn new(package: &str, import: &str, description: &str) -> Self {
        Self {
            package: package.to_string(),
            import: import.to_string(),
            description: description.to_string(),
        }
    }
}

/// Critical and optional packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySettings {
    /// Setup fails without these
    #[serde(default)]
    pub critical: Vec<DependencySpec>,
    /// Features degrade without these
    #[serde(default)]
    pub optional: Vec<DependencySpec>,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            critical: vec![
                DependencySpec::new("streamlit", "streamlit", "Web framework"),
                DependencySpec::new("pandas", "pandas", "Data processing"),
                DependencySpec::new("requests", "requests", "HTTP requests"),
                DependencySpec::new("openai", "openai", "OpenAI API client"),
                DependencySpec::new("tiktoken", "tiktoken", "Token counting"),
                DependencySpec::new("python-dotenv", "dotenv", "Environment variables"),
            ],
            optional: vec![
                DependencySpec::new("PyMuPDF", "fitz", "PDF processing"),
                DependencySpec::new("Pillow", "PIL", "Image processing"),
                DependencySpec::new("plotly", "plotly", "Data visualization"),
                DependencySpec::new("beautifulsoup4", "bs4", "HTML parsing"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_url() {
        let frontend = FrontendSettings::default();
        assert_eq!(frontend.url("localhost", 8501), "http://localhost:8501");
        assert_eq!(frontend.url("0.0.0.0", 8502), "http://localhost:8502");
    }

    #[test]
    fn test_work_dir_override() {
        let backend = BackendSettings {
            work_dir: Some(PathBuf::from("/tmp/rm-work")),
            ..BackendSettings::default()
        };
        assert_eq!(backend.work_dir(), PathBuf::from("/tmp/rm-work"));
        assert!(BackendSettings::default().work_dir().ends_with("repomaster/workspace"));
    }

    #[test]
    fn test_dotenv_import_name() {
        let deps = DependencySettings::default();
        let dotenv = deps
            .critical
            .iter()
            .find(|d| d.package == "python-dotenv")
            .unwrap();
        assert_eq!(dotenv.import, "dotenv");
    }
}
