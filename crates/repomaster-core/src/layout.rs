//! Project file locations relative to the RepoMaster root

use std::path::{Path, PathBuf};

/// Config directory name
pub const CONFIG_DIR: &str = "configs";

/// Env file name inside [`CONFIG_DIR`]
pub const ENV_FILE: &str = ".env";

/// Example env file shipped with the project
pub const ENV_EXAMPLE_FILE: &str = "env.example";

/// Optional launcher settings override inside [`CONFIG_DIR`]
pub const LAUNCHER_SETTINGS_FILE: &str = "launcher.toml";

/// Resolved paths for one project checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `configs/`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// `configs/.env`
    #[must_use]
    pub fn env_file(&self) -> PathBuf {
        self.config_dir().join(ENV_FILE)
    }

    /// `configs/env.example`
    #[must_use]
    pub fn env_example(&self) -> PathBuf {
        self.config_dir().join(ENV_EXAMPLE_FILE)
    }

    /// `configs/launcher.toml`
    #[must_use]
    pub fn launcher_settings(&self) -> PathBuf {
        self.config_dir().join(LAUNCHER_SETTINGS_FILE)
    }

    /// `.streamlit/config.toml`
    #[must_use]
    pub fn streamlit_config(&self) -> PathBuf {
        self.root.join(".streamlit").join("config.toml")
    }

    /// Requirements file to install from
    ///
    /// `requirements-minimal.txt` wins when present since the full list pins
    /// packages that do not build on newer interpreters.
    #[must_use]
    pub fn requirements(&self) -> PathBuf {
        let minimal = self.root.join("requirements-minimal.txt");
        if minimal.exists() {
            minimal
        } else {
            self.root.join("requirements.txt")
        }
    }

    /// Resolve a project-relative path (absolute paths pass through)
    #[must_use]
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = ProjectLayout::new("/srv/repomaster");
        assert_eq!(layout.env_file(), PathBuf::from("/srv/repomaster/configs/.env"));
        assert_eq!(
            layout.env_example(),
            PathBuf::from("/srv/repomaster/configs/env.example")
        );
        assert_eq!(
            layout.streamlit_config(),
            PathBuf::from("/srv/repomaster/.streamlit/config.toml")
        );
        assert_eq!(layout.resolve("/abs/app.py"), PathBuf::from("/abs/app.py"));
        assert_eq!(
            layout.resolve("src/frontend/app.py"),
            PathBuf::from("/srv/repomaster/src/frontend/app.py")
        );
    }

    #[test]
    fn test_requirements_prefers_minimal() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        assert!(layout.requirements().ends_with("requirements.txt"));

        std::fs::write(temp.path().join("requirements-minimal.txt"), "openai\n").unwrap();
        assert!(layout.requirements().ends_with("requirements-minimal.txt"));
    }
}
