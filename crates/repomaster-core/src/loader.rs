//! Settings loading
//!
//! Handles loading launcher settings from embedded defaults, the project
//! override file, and the environment.

use crate::error::Result;
use crate::layout::ProjectLayout;
use crate::settings::LauncherSettings;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use tracing::debug;

/// Embedded default settings (compiled into binary)
pub const DEFAULT_SETTINGS: &str = include_str!("../config/default.toml");

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "REPOMASTER";

/// Load settings for the project at `layout`
///
/// # Errors
/// Returns an error when a source is malformed or a value has the wrong type.
pub fn load_settings(layout: &ProjectLayout) -> Result<LauncherSettings> {
    load_settings_with_env(layout, None)
}

/// Same as [`load_settings`], reading overrides from `env` instead of the
/// process environment when given
///
/// # Errors
/// Returns an error when a source is malformed or a value has the wrong type.
pub fn load_settings_with_env(
    layout: &ProjectLayout,
    env: Option<HashMap<String, String>>,
) -> Result<LauncherSettings> {
    let override_file = layout.launcher_settings();
    debug!(path = %override_file.display(), "Loading launcher settings");

    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
        // 2. Project overrides (optional)
        .add_source(File::from(override_file).required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") lets REPOMASTER_FRONTEND__PORT work; the
        // default would require REPOMASTER__FRONTEND__PORT.
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        let settings = load_settings_with_env(&layout, no_env()).unwrap();
        assert_eq!(settings, LauncherSettings::default());
    }

    #[test]
    fn test_project_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::create_dir_all(layout.config_dir()).unwrap();
        std::fs::write(
            layout.launcher_settings(),
            "[frontend]\nport = 9000\n\n[backend]\nentry = \"agents/run.py\"\n",
        )
        .unwrap();

        let settings = load_settings_with_env(&layout, no_env()).unwrap();
        assert_eq!(settings.frontend.port, 9000);
        assert_eq!(settings.frontend.host, "localhost");
        assert_eq!(settings.backend.entry, "agents/run.py");
        assert_eq!(settings.dependencies.critical.len(), 6);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::create_dir_all(layout.config_dir()).unwrap();
        std::fs::write(layout.launcher_settings(), "[frontend]\nport = 9000\n").unwrap();

        let env = HashMap::from([
            ("REPOMASTER_FRONTEND__PORT".to_string(), "8600".to_string()),
            ("REPOMASTER_SUPERVISOR__GRACE_SECS".to_string(), "2".to_string()),
        ]);
        let settings = load_settings_with_env(&layout, Some(env)).unwrap();
        assert_eq!(settings.frontend.port, 8600);
        assert_eq!(settings.supervisor.grace_secs, 2);
    }

    #[test]
    fn test_malformed_override_is_error() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::create_dir_all(layout.config_dir()).unwrap();
        std::fs::write(layout.launcher_settings(), "[frontend]\nport = \"not a port\"\n").unwrap();

        assert!(load_settings_with_env(&layout, no_env()).is_err());
    }
}
