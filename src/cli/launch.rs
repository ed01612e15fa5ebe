//! `repomaster launch`: run the dashboard or one agent mode

use std::path::PathBuf;

use anyhow::Context as _;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Args;
use repomaster_core::util::truncate_front;
use repomaster_core::{BackendMode, EnvFile, Error as CoreError, LaunchMode};
use repomaster_runtime::deps::require_any;
use repomaster_runtime::supervisor;
use repomaster_runtime::{ports, python, ExitOutcome, Interpreter, LaunchPlanner, PythonVersion, ShutdownListener};
use tracing::{info, warn};

use super::display::{Color, Ui};
use super::Context;

/// Characters of the work directory shown in the startup panel
const PANEL_WORK_DIR_CHARS: usize = 20;

#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// What to run
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(LaunchMode::NAMES.to_vec())
            .try_map(|s| s.parse::<LaunchMode>())
    )]
    pub mode: LaunchMode,

    /// Agent mode (required with --mode backend)
    #[arg(
        long,
        required_if_eq("mode", "backend"),
        value_parser = PossibleValuesParser::new(BackendMode::NAMES.to_vec())
            .try_map(|s| s.parse::<BackendMode>())
    )]
    pub backend_mode: Option<BackendMode>,

    /// Dashboard port (default from launcher settings)
    #[arg(long)]
    pub streamlit_port: Option<u16>,

    /// Dashboard bind address
    #[arg(long)]
    pub streamlit_host: Option<String>,

    /// Working directory for the agent
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Launch even when configs/.env is missing or the key is not set
    #[arg(long)]
    pub skip_config_check: bool,
}

/// Service to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Frontend,
    Backend(BackendMode),
}

impl Target {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Frontend => "Web Interface",
            Self::Backend(mode) => mode.display_name(),
        }
    }
}

/// Resolved launch request, shared by `launch` and `start`
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub work_dir: Option<PathBuf>,
    pub skip_config_check: bool,
}

impl LaunchArgs {
    fn target(&self) -> anyhow::Result<Target> {
        match (self.mode, self.backend_mode) {
            (LaunchMode::Frontend, _) => Ok(Target::Frontend),
            (LaunchMode::Backend, Some(mode)) => Ok(Target::Backend(mode)),
            (LaunchMode::Backend, None) => {
                anyhow::bail!("--backend-mode is required with --mode backend")
            }
        }
    }

    fn options(&self) -> LaunchOptions {
        LaunchOptions {
            host: self.streamlit_host.clone(),
            port: self.streamlit_port,
            work_dir: self.work_dir.clone(),
            skip_config_check: self.skip_config_check,
        }
    }
}

pub async fn run(ctx: &Context, args: LaunchArgs) -> anyhow::Result<i32> {
    let target = args.target()?;
    let outcome = launch_target(ctx, target, &args.options()).await?;
    Ok(outcome.exit_code())
}

/// Check, plan, spawn and supervise one service
pub async fn launch_target(
    ctx: &Context,
    target: Target,
    opts: &LaunchOptions,
) -> anyhow::Result<ExitOutcome> {
    let ui = &ctx.ui;
    let env = load_env(ctx, opts.skip_config_check)?;

    if !opts.skip_config_check {
        if let Some(env) = &env {
            if let Err(e) = env.require_api_key() {
                ui.error(&e.to_string());
                ui.tip("Run 'repomaster deploy' to configure your API keys");
                return Err(e.into());
            }
        }
    }

    let python = python::discover(&ctx.settings.python)
        .await
        .context("Cannot launch without a Python interpreter")?;

    let frontend = &ctx.settings.frontend;
    let host = opts.host.clone().unwrap_or_else(|| frontend.host.clone());
    let port = opts.port.unwrap_or(frontend.port);
    let work_dir = opts
        .work_dir
        .clone()
        .unwrap_or_else(|| ctx.settings.backend.work_dir());

    // Nothing is printed or spawned until the preflight passes
    match target {
        Target::Frontend => ports::ensure_available(&host, port)?,
        Target::Backend(_) => preflight_backend(ctx, &python).await?,
    }

    let service = match target {
        Target::Frontend => format!("{} (port {port})", target.display_name()),
        Target::Backend(_) => target.display_name().to_string(),
    };
    let shown_dir = match target {
        Target::Frontend => ctx.layout.root().display().to_string(),
        Target::Backend(_) => work_dir.display().to_string(),
    };
    startup_panel(ui, env.as_ref(), &service, &shown_dir);

    let mut planner = LaunchPlanner::new(&ctx.layout, &ctx.settings, python.program());
    if let Some(env) = &env {
        planner = planner.with_env(env.vars().clone());
    }
    let plan = match target {
        Target::Frontend => planner.frontend(&host, port),
        Target::Backend(mode) => {
            std::fs::create_dir_all(&work_dir)
                .with_context(|| format!("Failed to create work directory {}", work_dir.display()))?;
            planner.backend(mode, &work_dir)
        }
    };

    println!();
    match target {
        Target::Frontend => {
            ui.colored(Color::Green, "🌐 Starting Web Interface...");
            ui.colored(
                Color::Cyan,
                &format!("💡 Access the dashboard at: {}", frontend.url(&host, port)),
            );
        }
        Target::Backend(mode) => {
            ui.colored(Color::Green, &format!("🤖 Starting {}...", mode.display_name()));
        }
    }
    ui.tip("Press Ctrl+C to stop the service");
    ui.colored(Color::Cyan, &format!("Command: {}", plan.command_line()));
    println!();

    let listener = ShutdownListener::install();
    let outcome = supervisor::run(&plan, listener.token(), ctx.settings.supervisor.grace()).await?;
    drop(listener);

    println!();
    report_outcome(ui, &outcome);
    Ok(outcome)
}

fn load_env(ctx: &Context, skip_config_check: bool) -> anyhow::Result<Option<EnvFile>> {
    match ctx.load_env() {
        Ok(env) => Ok(Some(env)),
        Err(e) if skip_config_check => {
            warn!(error = %e, "Continuing without configs/.env");
            Ok(None)
        }
        Err(e @ CoreError::ConfigNotFound { .. }) => {
            ctx.ui.error(&e.to_string());
            ctx.ui.tip("Run 'repomaster deploy' to set up RepoMaster");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn preflight_backend(ctx: &Context, python: &Interpreter) -> anyhow::Result<()> {
    let modules = &ctx.settings.backend.orchestration_modules;
    let found = require_any(python, modules).await?;
    info!(module = %found, "Orchestration dependency available");

    let max = PythonVersion::parse(&ctx.settings.python.backend_max_version)?;
    if python.is_at_or_above(max) {
        ctx.ui.warning(&format!(
            "Python {} may not be supported by the agent framework (tested below {})",
            python.version(),
            max.short()
        ));
    }
    Ok(())
}

/// Four-step startup summary
pub fn panel_lines(env: Option<&EnvFile>, service: &str, work_dir: &str) -> Vec<String> {
    let environment = match env {
        Some(env) => format!("✅ Loaded from {}", env.path().display()),
        None => "❌ Failed to load .env".to_string(),
    };
    let api = match env.map(EnvFile::api_settings) {
        Some(api) if api.api_key.is_some() => format!("✅ {} {}", api.provider, api.model),
        Some(api) => format!("⚠️  {} {} (API key not configured)", api.provider, api.model),
        None => "⚠️  Not configured".to_string(),
    };

    vec![
        format!("[1/4] 📁 Environment Setup... {environment}"),
        format!("[2/4] 🔑 API Configuration... {api}"),
        format!(
            "[3/4] ⚙️  Service Configuration... ✅ {service}, Work: {}",
            truncate_front(work_dir, PANEL_WORK_DIR_CHARS)
        ),
        "[4/4] 🚀 Service Launch... ✅ Ready!".to_string(),
    ]
}

fn startup_panel(ui: &Ui, env: Option<&EnvFile>, service: &str, work_dir: &str) {
    println!("{}", ui.paint(Color::Header, &ui.boxed(&["🚀 RepoMaster Startup"])));
    for line in panel_lines(env, service, work_dir) {
        ui.line(&line);
    }
}

fn report_outcome(ui: &Ui, outcome: &ExitOutcome) {
    match outcome {
        ExitOutcome::Exited { code: Some(0) } => ui.success("Service stopped normally"),
        ExitOutcome::Exited { code: Some(code) } => {
            ui.warning(&format!("Service stopped with code {code}"))
        }
        ExitOutcome::Exited { code: None } => ui.warning("Service was terminated by a signal"),
        ExitOutcome::Interrupted { .. } => ui.success("Service stopped"),
        ExitOutcome::Killed => ui.warning("Service did not stop in time and was killed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: LaunchArgs,
    }

    fn parse(argv: &[&str]) -> Result<LaunchArgs, clap::Error> {
        let mut full = vec!["repomaster"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).map(|h| h.args)
    }

    #[test]
    fn test_parse_frontend() {
        let args = parse(&["--mode", "frontend", "--streamlit-port", "8600"]).unwrap();
        assert_eq!(args.target().unwrap(), Target::Frontend);
        assert_eq!(args.options().port, Some(8600));
    }

    #[test]
    fn test_parse_backend() {
        let args = parse(&["--mode", "backend", "--backend-mode", "deepsearch"]).unwrap();
        assert_eq!(args.target().unwrap(), Target::Backend(BackendMode::DeepSearch));
    }

    #[test]
    fn test_backend_requires_backend_mode() {
        assert!(parse(&["--mode", "backend"]).is_err());
    }

    #[test]
    fn test_unknown_modes_rejected() {
        assert!(parse(&["--mode", "desktop"]).is_err());
        assert!(parse(&["--mode", "backend", "--backend-mode", "Unified"]).is_err());
    }

    #[test]
    fn test_panel_with_env() {
        let env = EnvFile::parse(
            "/srv/rm/configs/.env",
            "OPENAI_API_KEY=real-key-123456\nOPENAI_MODEL=glm-4.5\n",
        )
        .unwrap();
        let lines = panel_lines(
            Some(&env),
            "Deep Search Agent",
            "/home/user/.local/share/repomaster/workspace",
        );
        assert_eq!(lines[0], "[1/4] 📁 Environment Setup... ✅ Loaded from /srv/rm/configs/.env");
        assert_eq!(lines[1], "[2/4] 🔑 API Configuration... ✅ openai glm-4.5");
        assert_eq!(
            lines[2],
            "[3/4] ⚙️  Service Configuration... ✅ Deep Search Agent, Work: ...repomaster/workspace"
        );
        assert_eq!(lines[3], "[4/4] 🚀 Service Launch... ✅ Ready!");
    }

    #[test]
    fn test_panel_without_env() {
        let lines = panel_lines(None, "Web Interface (port 8501)", "/srv/rm");
        assert_eq!(lines[0], "[1/4] 📁 Environment Setup... ❌ Failed to load .env");
        assert!(lines[1].contains("Not configured"));
    }
}
