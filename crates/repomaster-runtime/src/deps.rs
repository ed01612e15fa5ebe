//! Python dependency probes and installation

use std::path::Path;

use async_trait::async_trait;
use repomaster_core::DependencySpec;
use tracing::{info, warn};

use crate::error::{Result, RuntimeError};
use crate::python::Interpreter;

/// PyMuPDF release known to install where newer wheels fail
pub const PYMUPDF_FALLBACK: &str = "PyMuPDF==1.23.26";

/// Result of trying to import one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    /// `import` succeeded
    Available,
    /// `import` failed with this error line
    Missing(String),
}

impl ImportStatus {
    /// Whether the import succeeded
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Something that can tell whether a Python module imports
#[async_trait]
pub trait ModuleProbe: Send + Sync {
    /// Try to import `module`
    async fn probe(&self, module: &str) -> ImportStatus;
}

#[async_trait]
impl ModuleProbe for Interpreter {
    async fn probe(&self, module: &str) -> ImportStatus {
        let statement = format!("import {module}");
        match self.run(&["-c", &statement], None).await {
            Ok(_) => ImportStatus::Available,
            Err(RuntimeError::CommandFailed { stderr, .. }) => {
                ImportStatus::Missing(import_error_line(&stderr, module))
            }
            Err(e) => ImportStatus::Missing(e.to_string()),
        }
    }
}

/// Last non-empty line of a traceback, which carries the exception text
#[must_use]
pub fn import_error_line(stderr: &str, module: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("No module named '{module}'"))
}

/// Return the first importable module of `modules`
///
/// # Errors
/// [`RuntimeError::MissingDependency`] carrying the interpreter's import
/// error for the first module when none of them import.
pub async fn require_any(probe: &dyn ModuleProbe, modules: &[String]) -> Result<String> {
    let mut first_error = None;
    for module in modules {
        match probe.probe(module).await {
            ImportStatus::Available => return Ok(module.clone()),
            ImportStatus::Missing(detail) => {
                first_error.get_or_insert(detail);
            }
        }
    }
    Err(RuntimeError::MissingDependency {
        module: modules.join(" or "),
        detail: first_error.unwrap_or_else(|| "no modules configured".to_string()),
    })
}

/// One dependency and whether it imports
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    /// What was checked
    pub spec: DependencySpec,
    /// Probe result
    pub status: ImportStatus,
}

/// Probe every dependency in `specs`, in order
pub async fn check_all(probe: &dyn ModuleProbe, specs: &[DependencySpec]) -> Vec<DependencyStatus> {
    let mut out = Vec::with_capacity(specs.len());
    for spec in specs {
        let status = probe.probe(&spec.import).await;
        out.push(DependencyStatus {
            spec: spec.clone(),
            status,
        });
    }
    out
}

/// How the requirements install ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Everything installed
    Installed,
    /// The requirements failed on PyMuPDF and the pinned release was installed instead
    PdfFallback,
    /// PyMuPDF could not be installed at all; PDF features are unavailable
    WithoutPdf(String),
}

/// `python -m pip install <args>`
///
/// # Errors
/// [`RuntimeError::CommandFailed`] with pip's stderr.
pub async fn pip_install(python: &Interpreter, args: &[&str], cwd: Option<&Path>) -> Result<()> {
    let mut full = vec!["-m", "pip", "install"];
    full.extend_from_slice(args);
    python.run(&full, cwd).await.map(|_| ())
}

/// Upgrade pip, then install the requirements file
///
/// A failure that mentions PyMuPDF is retried with [`PYMUPDF_FALLBACK`];
/// if that fails too the install continues without PDF support.
///
/// # Errors
/// [`RuntimeError::CommandFailed`] when the install fails for another reason.
pub async fn install_requirements(
    python: &Interpreter,
    requirements: &Path,
    cwd: Option<&Path>,
) -> Result<InstallOutcome> {
    info!("Upgrading pip");
    if let Err(e) = pip_install(python, &["--upgrade", "pip"], cwd).await {
        warn!(error = %e, "pip upgrade failed, continuing");
    }

    let req = requirements.to_string_lossy();
    info!(requirements = %req, "Installing requirements");
    match pip_install(python, &["-r", &req], cwd).await {
        Ok(()) => Ok(InstallOutcome::Installed),
        Err(RuntimeError::CommandFailed { stderr, .. }) if mentions_pymupdf(&stderr) => {
            warn!("Requirements failed on PyMuPDF, trying {}", PYMUPDF_FALLBACK);
            // Uninstall failures are expected when nothing was installed
            let _ = python
                .run(&["-m", "pip", "uninstall", "PyMuPDF", "-y"], cwd)
                .await;
            match pip_install(python, &[PYMUPDF_FALLBACK], cwd).await {
                Ok(()) => Ok(InstallOutcome::PdfFallback),
                Err(e) => Ok(InstallOutcome::WithoutPdf(e.to_string())),
            }
        }
        Err(e) => Err(e),
    }
}

fn mentions_pymupdf(text: &str) -> bool {
    text.to_ascii_lowercase().contains("pymupdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct FakeProbe {
        installed: HashSet<&'static str>,
    }

    #[async_trait]
    impl ModuleProbe for FakeProbe {
        async fn probe(&self, module: &str) -> ImportStatus {
            if self.installed.contains(module) {
                ImportStatus::Available
            } else {
                ImportStatus::Missing(format!(
                    "ModuleNotFoundError: No module named '{module}'"
                ))
            }
        }
    }

    fn probe(installed: &[&'static str]) -> FakeProbe {
        FakeProbe {
            installed: installed.iter().copied().collect(),
        }
    }

    #[test]
    fn test_import_error_line() {
        let stderr = "Traceback (most recent call last):\n  File \"<string>\", line 1, in <module>\nModuleNotFoundError: No module named 'autogen'\n\n";
        assert_eq!(
            import_error_line(stderr, "autogen"),
            "ModuleNotFoundError: No module named 'autogen'"
        );
        assert_eq!(import_error_line("", "x"), "No module named 'x'");
    }

    #[test]
    fn test_mentions_pymupdf() {
        assert!(mentions_pymupdf("error: Failed building wheel for PyMuPDF"));
        assert!(!mentions_pymupdf("error: Failed building wheel for numpy"));
    }

    #[tokio::test]
    async fn test_require_any_picks_first_available() {
        let modules = vec!["autogen".to_string(), "autogen_agentchat".to_string()];
        let found = require_any(&probe(&["autogen_agentchat"]), &modules)
            .await
            .unwrap();
        assert_eq!(found, "autogen_agentchat");
    }

    #[tokio::test]
    async fn test_require_any_reports_import_error() {
        let modules = vec!["autogen".to_string(), "autogen_agentchat".to_string()];
        let err = require_any(&probe(&[]), &modules).await.unwrap_err();
        match err {
            RuntimeError::MissingDependency { module, detail } => {
                assert_eq!(module, "autogen or autogen_agentchat");
                assert_eq!(detail, "ModuleNotFoundError: No module named 'autogen'");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_all_keeps_order() {
        let specs = vec![
            DependencySpec::new("streamlit", "streamlit", "Web framework"),
            DependencySpec::new("python-dotenv", "dotenv", "Environment variables"),
        ];
        let statuses = check_all(&probe(&["dotenv"]), &specs).await;
        assert_eq!(statuses.len(), 2);
        assert!(!statuses[0].status.is_available());
        assert!(statuses[1].status.is_available());
    }
}
