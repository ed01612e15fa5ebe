//! Python interpreter discovery
//!
//! Finds a usable interpreter from the configured candidates, parses its
//! version and answers the questions setup and launch ask about it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use repomaster_core::PythonSettings;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, RuntimeError};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern is a valid regex")
});

/// `major.minor.patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch level, 0 when not given
    pub patch: u32,
}

impl PythonVersion {
    /// Construct from parts
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the first version number found in `text`
    ///
    /// Accepts `3.8`, `3.11.4` and `Python 3.12.1` alike.
    ///
    /// # Errors
    /// Returns [`RuntimeError::VersionParse`] when no version is present.
    pub fn parse(text: &str) -> Result<Self> {
        let caps = VERSION_RE
            .captures(text)
            .ok_or_else(|| RuntimeError::VersionParse(text.trim().to_string()))?;
        let num = |i: usize| -> Result<u32> {
            caps.get(i)
                .map_or(Ok(0), |m| m.as_str().parse::<u32>())
                .map_err(|_| RuntimeError::VersionParse(text.trim().to_string()))
        };
        Ok(Self::new(num(1)?, num(2)?, num(3)?))
    }

    /// `major.minor` only
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for PythonVersion {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A runnable interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    program: PathBuf,
    version: PythonVersion,
}

impl Interpreter {
    /// Interpreter at `program` with a known version
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, version: PythonVersion) -> Self {
        Self {
            program: program.into(),
            version,
        }
    }

    /// Program used to run Python
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Detected version
    #[must_use]
    pub fn version(&self) -> PythonVersion {
        self.version
    }

    /// Fail unless the version is at least `min`
    ///
    /// # Errors
    /// Returns [`RuntimeError::PythonTooOld`].
    pub fn ensure_at_least(&self, min: PythonVersion) -> Result<()> {
        if self.version >= min {
            Ok(())
        } else {
            Err(RuntimeError::PythonTooOld {
                found: self.version.to_string(),
                required: min.short(),
            })
        }
    }

    /// Whether the version is at or above `limit`
    #[must_use]
    pub fn is_at_or_above(&self, limit: PythonVersion) -> bool {
        self.version >= limit
    }

    /// Full path of the program, resolved on `PATH` when it is a bare name
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        if self.program.components().count() > 1 {
            return self.program.clone();
        }
        self.program
            .to_str()
            .and_then(resolve_path)
            .unwrap_or_else(|| self.program.clone())
    }

    /// Run the interpreter with `args`, capturing output
    ///
    /// # Errors
    /// Returns [`RuntimeError::Spawn`] if the process cannot start and
    /// [`RuntimeError::CommandFailed`] on a non-zero exit.
    pub async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        debug!(program = %self.program.display(), ?args, "Running interpreter");

        let output = cmd.output().await.map_err(|source| RuntimeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            Err(RuntimeError::CommandFailed { code, stderr })
        }
    }
}

/// Find an interpreter according to `settings`
///
/// An explicit `interpreter` is the only candidate when set; otherwise the
/// `candidates` are tried in order and the first one that runs wins. The
/// minimum version is checked against the winner.
///
/// # Errors
/// [`RuntimeError::PythonNotFound`] when nothing runs,
/// [`RuntimeError::PythonTooOld`] when the winner is too old.
pub async fn discover(settings: &PythonSettings) -> Result<Interpreter> {
    let candidates: Vec<String> = match &settings.interpreter {
        Some(explicit) => vec![explicit.clone()],
        None => settings.candidates.clone(),
    };

    for candidate in &candidates {
        if let Some(interpreter) = try_python(candidate).await {
            let min = PythonVersion::parse(&settings.min_version)?;
            interpreter.ensure_at_least(min)?;
            debug!(
                program = %interpreter.program.display(),
                version = %interpreter.version,
                "Found Python interpreter"
            );
            return Ok(interpreter);
        }
    }

    Err(RuntimeError::PythonNotFound { tried: candidates })
}

/// Run `<candidate> --version` and parse the result
async fn try_python(candidate: &str) -> Option<Interpreter> {
    let output = Command::new(candidate).arg("--version").output().await.ok()?;
    if !output.status.success() {
        debug!(candidate, "Interpreter candidate exited with failure");
        return None;
    }

    // Python 2 prints its version on stderr
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    match PythonVersion::parse(&text) {
        Ok(version) => Some(Interpreter::new(candidate, version)),
        Err(e) => {
            warn!(candidate, error = %e, "Unrecognised --version output");
            None
        }
    }
}

/// Resolve a command name to its full path
fn resolve_path(command: &str) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let which_cmd = "where";
    #[cfg(not(target_os = "windows"))]
    let which_cmd = "which";

    let output = std::process::Command::new(which_cmd)
        .arg(command)
        .output()
        .ok()?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let first_line = path_str.lines().next()?.trim();
        if !first_line.is_empty() {
            return Some(PathBuf::from(first_line));
        }
    }
    None
}

/// Active virtual environment or conda prefix, if any
#[must_use]
pub fn active_virtualenv() -> Option<String> {
    virtualenv_from(|key| std::env::var(key).ok())
}

fn virtualenv_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["VIRTUAL_ENV", "CONDA_PREFIX"]
        .into_iter()
        .filter_map(lookup)
        .find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!(PythonVersion::parse("3.8").unwrap(), PythonVersion::new(3, 8, 0));
        assert_eq!(
            PythonVersion::parse("Python 3.11.4\n").unwrap(),
            PythonVersion::new(3, 11, 4)
        );
        assert_eq!("3.13".parse::<PythonVersion>().unwrap().short(), "3.13");
        assert!(PythonVersion::parse("Python").is_err());
    }

    #[test]
    fn test_version_ordering() {
        let v = |s: &str| PythonVersion::parse(s).unwrap();
        assert!(v("3.10.0") > v("3.9.18"));
        assert!(v("3.13.0") >= v("3.13"));
        assert!(v("3.12.7") < v("3.13"));
    }

    #[test]
    fn test_ensure_at_least() {
        let old = Interpreter::new("python3", PythonVersion::new(3, 7, 9));
        let err = old.ensure_at_least(PythonVersion::new(3, 8, 0)).unwrap_err();
        assert_eq!(err.to_string(), "Python 3.7.9 is too old. Minimum required: 3.8");

        let new = Interpreter::new("python3", PythonVersion::new(3, 13, 1));
        assert!(new.ensure_at_least(PythonVersion::new(3, 8, 0)).is_ok());
        assert!(new.is_at_or_above(PythonVersion::new(3, 13, 0)));
    }

    #[test]
    fn test_virtualenv_lookup() {
        let none = virtualenv_from(|_| None);
        assert!(none.is_none());

        let conda = virtualenv_from(|key| match key {
            "VIRTUAL_ENV" => Some(String::new()),
            "CONDA_PREFIX" => Some("/opt/conda".to_string()),
            _ => None,
        });
        assert_eq!(conda.as_deref(), Some("/opt/conda"));
    }

    #[tokio::test]
    async fn test_discover_reports_tried_candidates() {
        let settings = PythonSettings {
            candidates: vec!["definitely-not-python-xyz".to_string()],
            ..PythonSettings::default()
        };
        match discover(&settings).await {
            Err(RuntimeError::PythonNotFound { tried }) => {
                assert_eq!(tried, vec!["definitely-not-python-xyz".to_string()]);
            }
            other => panic!("expected PythonNotFound, got {other:?}"),
        }
    }
}
