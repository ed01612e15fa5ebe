//! Launch plans
//!
//! A [`LaunchPlan`] is the fully resolved command for one child process.
//! Building a plan has no side effects; only [`LaunchPlan::spawn`] starts
//! anything.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use repomaster_core::{BackendMode, LauncherSettings, ProjectLayout};
use tokio::process::{Child, Command};
use tracing::info;

use crate::error::{Result, RuntimeError};

/// Resolved program, arguments, directory and environment
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Short name for logs and panels
    pub label: String,
    /// Program to execute
    pub program: PathBuf,
    /// Arguments after the program
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Extra environment for the child
    pub env: BTreeMap<String, String>,
}

impl LaunchPlan {
    /// Shell-like rendering for display
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(char::is_whitespace) {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }

    /// Command with inherited stdio, killed if dropped while running
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .envs(&self.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    /// Start the child
    ///
    /// # Errors
    /// [`RuntimeError::Spawn`] when the program cannot be started.
    pub fn spawn(&self) -> Result<Child> {
        info!(label = %self.label, command = %self.command_line(), "Starting child process");
        self.to_command().spawn().map_err(|source| RuntimeError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

impl fmt::Debug for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // env values carry API keys
        f.debug_struct("LaunchPlan")
            .field("label", &self.label)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds launch plans for one project
pub struct LaunchPlanner<'a> {
    layout: &'a ProjectLayout,
    settings: &'a LauncherSettings,
    python: PathBuf,
    env: BTreeMap<String, String>,
}

impl<'a> LaunchPlanner<'a> {
    /// Planner running children with `python`
    pub fn new(
        layout: &'a ProjectLayout,
        settings: &'a LauncherSettings,
        python: impl Into<PathBuf>,
    ) -> Self {
        let mut env = BTreeMap::new();
        env.insert("PYTHONIOENCODING".to_string(), "utf-8".to_string());
        Self {
            layout,
            settings,
            python: python.into(),
            env,
        }
    }

    /// Add variables passed to every child (usually the `.env` pairs)
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Streamlit dashboard on `host:port`
    #[must_use]
    pub fn frontend(&self, host: &str, port: u16) -> LaunchPlan {
        let frontend = &self.settings.frontend;
        let app = self.layout.resolve(&frontend.app);
        LaunchPlan {
            label: "frontend".to_string(),
            program: self.python.clone(),
            args: vec![
                "-m".to_string(),
                "streamlit".to_string(),
                "run".to_string(),
                app.display().to_string(),
                "--server.port".to_string(),
                port.to_string(),
                "--server.address".to_string(),
                host.to_string(),
                "--server.headless".to_string(),
                frontend.headless.to_string(),
            ],
            cwd: self.layout.root().to_path_buf(),
            env: self.env.clone(),
        }
    }

    /// Agent runtime in `mode`, working in `work_dir`
    #[must_use]
    pub fn backend(&self, mode: BackendMode, work_dir: &Path) -> LaunchPlan {
        let entry = self.layout.resolve(&self.settings.backend.entry);
        LaunchPlan {
            label: format!("backend:{}", mode.as_str()),
            program: self.python.clone(),
            args: vec![
                entry.display().to_string(),
                "--mode".to_string(),
                "backend".to_string(),
                "--backend-mode".to_string(),
                mode.as_str().to_string(),
                "--work-dir".to_string(),
                work_dir.display().to_string(),
            ],
            cwd: self.layout.root().to_path_buf(),
            env: self.env.clone(),
        }
    }

    /// Plans for the dashboard and every backend mode
    #[must_use]
    pub fn all(&self, work_dir: &Path) -> Vec<LaunchPlan> {
        let frontend = &self.settings.frontend;
        let mut plans = vec![self.frontend(&frontend.host, frontend.port)];
        plans.extend(BackendMode::ALL.iter().map(|m| self.backend(*m, work_dir)));
        plans
    }
}
