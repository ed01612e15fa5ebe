//! `repomaster deploy`: first-time setup in eight steps

use clap::Args;
use repomaster_core::{CheckResult, CheckStatus, EnvFile, StreamlitConfig};
use repomaster_runtime::deps::install_requirements;
use repomaster_runtime::{InstallOutcome, Interpreter, ModuleProbe};
use tracing::{error, info};

use super::display::{Color, Ui};
use super::setup::{self, prompts};
use super::validate;
use super::Context;

const TOTAL_STEPS: usize = 8;

#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Continue after failed steps
    #[arg(long)]
    pub quick: bool,

    /// Check the current setup without installing anything
    #[arg(long, conflicts_with = "fix_deps")]
    pub validate_only: bool,

    /// Only install dependencies
    #[arg(long)]
    pub fix_deps: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// One deployment step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Python,
    VirtualEnv,
    Install,
    Imports,
    Configuration,
    Ports,
    Functionality,
}

impl Step {
    const ALL: [Step; 7] = [
        Self::Python,
        Self::VirtualEnv,
        Self::Install,
        Self::Imports,
        Self::Configuration,
        Self::Ports,
        Self::Functionality,
    ];

    /// Position in the `[n/8]` numbering
    pub fn number(self) -> usize {
        match self {
            Self::Python => 1,
            Self::VirtualEnv => 2,
            Self::Install => 3,
            Self::Imports => 4,
            Self::Configuration => 5,
            Self::Ports => 6,
            Self::Functionality => 7,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Python => "🐍 Checking Python Version",
            Self::VirtualEnv => "📁 Checking Virtual Environment",
            Self::Install => "📦 Installing Dependencies",
            Self::Imports => "🔍 Validating Critical Imports",
            Self::Configuration => "⚙️  Validating Configuration",
            Self::Ports => "🔌 Checking Port Availability",
            Self::Functionality => "🧪 Testing Basic Functionality",
        }
    }
}

/// Steps to run for the given flags; the report always follows
pub fn plan_steps(args: &DeployArgs) -> Vec<Step> {
    if args.fix_deps {
        return vec![Step::Python, Step::Install];
    }
    Step::ALL
        .into_iter()
        .filter(|s| !(args.validate_only && *s == Step::Install))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
    pub critical: bool,
}

/// Fixes and issues collected across the steps
#[derive(Debug, Default)]
pub struct Deployment {
    pub fixes: Vec<String>,
    pub issues: Vec<Issue>,
    interpreter: Option<Interpreter>,
}

impl Deployment {
    fn fixed(&mut self, message: impl Into<String>) {
        self.fixes.push(message.into());
    }

    fn issue(&mut self, message: impl Into<String>, critical: bool) {
        self.issues.push(Issue {
            message: message.into(),
            critical,
        });
    }

    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.critical)
    }

    /// Print results and record failures as critical issues; true when none failed
    fn absorb(&mut self, ui: &Ui, results: &[CheckResult]) -> bool {
        self.absorb_where(ui, results, |_| true)
    }

    /// Like [`Deployment::absorb`], recording only failures that `record` accepts
    fn absorb_where(
        &mut self,
        ui: &Ui,
        results: &[CheckResult],
        record: impl Fn(&CheckResult) -> bool,
    ) -> bool {
        let mut ok = true;
        for result in results {
            validate::print_result(ui, result);
            if result.status == CheckStatus::Fail {
                ok = false;
                if record(result) {
                    self.issue(format!("{}: {}", result.name, result.message), true);
                }
            }
        }
        ok
    }

    /// Import results; missing packages are reported once, through the aggregate row
    fn absorb_imports(&mut self, ui: &Ui, results: &[CheckResult]) -> bool {
        self.absorb_where(ui, results, |r| r.name == validate::CRITICAL_DEPENDENCIES)
    }
}

pub async fn run(ctx: &Context, args: DeployArgs) -> anyhow::Result<i32> {
    let ui = &ctx.ui;
    println!(
        "{}",
        ui.paint(
            Color::Cyan,
            &ui.boxed(&[
                "",
                "🚀 RepoMaster Deployment Script",
                "",
                "Automated setup and dependency management",
                "",
            ])
        )
    );
    if args.validate_only {
        ui.info("Running validation only...");
    } else if args.fix_deps {
        ui.info("Fixing dependencies only...");
    }

    let mut state = Deployment::default();
    for step in plan_steps(&args) {
        ui.step(step.number(), TOTAL_STEPS, step.title());
        let ok = match run_step(ctx, &mut state, step).await {
            Ok(ok) => ok,
            Err(e) if prompts::is_cancelled(&e) => {
                ui.error("Deployment interrupted by user");
                state.issue("Deployment interrupted by user", true);
                false
            }
            Err(e) => {
                error!(step = ?step, error = %e, "Deployment step failed");
                ui.error(&format!("Unexpected error in deployment step: {e:#}"));
                state.issue(format!("Step {} failed: {e}", step.number()), true);
                false
            }
        };
        if !ok && !args.quick {
            break;
        }
    }

    let success = report(ui, &state);
    Ok(if success { 0 } else { 1 })
}

async fn run_step(ctx: &Context, state: &mut Deployment, step: Step) -> anyhow::Result<bool> {
    let ui = &ctx.ui;
    match step {
        Step::Python => {
            let (results, interpreter) = validate::python_checks(&ctx.settings.python).await;
            state.interpreter = interpreter;
            Ok(state.absorb(ui, &results))
        }
        Step::VirtualEnv => {
            let result = validate::venv_check();
            validate::print_result(ui, &result);
            Ok(true)
        }
        Step::Install => install(ctx, state).await,
        Step::Imports => {
            let probe = state.interpreter.as_ref().map(|i| i as &dyn ModuleProbe);
            let results = validate::dependency_checks(probe, &ctx.settings.dependencies).await;
            Ok(state.absorb_imports(ui, &results))
        }
        Step::Configuration => configure(ctx, state),
        Step::Ports => {
            let frontend = &ctx.settings.frontend;
            let results = validate::port_checks(&frontend.host, &frontend.probe_ports);
            Ok(state.absorb(ui, &results))
        }
        Step::Functionality => {
            let results = validate::plan_checks(ctx, state.interpreter.as_ref()).await;
            Ok(state.absorb(ui, &results))
        }
    }
}

async fn install(ctx: &Context, state: &mut Deployment) -> anyhow::Result<bool> {
    let ui = &ctx.ui;
    let Some(interpreter) = state.interpreter.clone() else {
        ui.error("No Python interpreter to install with");
        state.issue("Dependency installation failed: no Python interpreter", true);
        return Ok(false);
    };

    let requirements = ctx.layout.requirements();
    if !requirements.exists() {
        ui.error(&format!("{} not found", requirements.display()));
        state.issue("Missing critical file: requirements.txt", true);
        return Ok(false);
    }

    ui.info("Upgrading pip and installing requirements...");
    match install_requirements(&interpreter, &requirements, Some(ctx.layout.root())).await {
        Ok(InstallOutcome::Installed) => {
            ui.success("Dependencies installed successfully");
            state.fixed("Installed dependencies");
            Ok(true)
        }
        Ok(InstallOutcome::PdfFallback) => {
            ui.success("Fixed PyMuPDF installation");
            state.fixed("Fixed PyMuPDF version conflict");
            Ok(true)
        }
        Ok(InstallOutcome::WithoutPdf(detail)) => {
            ui.warning("Could not fix PyMuPDF. PDF features will be disabled.");
            state.issue(format!("PyMuPDF unavailable: {detail}"), false);
            Ok(true)
        }
        Err(e) => {
            ui.error(&format!("Failed to install dependencies: {e}"));
            state.issue("Dependency installation failed", true);
            Ok(false)
        }
    }
}

fn configure(ctx: &Context, state: &mut Deployment) -> anyhow::Result<bool> {
    let ui = &ctx.ui;
    let layout = &ctx.layout;
    let interactive = setup::is_interactive();
    let env_path = layout.env_file();

    if env_path.exists() {
        ui.success("Environment configuration - Found");
        let mut env = EnvFile::load(&env_path)?;
        let missing = env.missing_required();
        if missing.is_empty() {
            ui.success("Environment variables configured");
        } else {
            ui.warning(&format!("Missing environment variables: {}", missing.join(", ")));
        }
        if interactive && setup::offer_api_key(&mut env, ui)? {
            state.fixed("Saved OPENAI_API_KEY");
        }
        report_key(ui, state, &env);
    } else {
        ui.warning("Environment configuration - Missing");
        let created = setup::create_env(layout, ui, interactive)?;
        ui.success(created.describe());
        state.fixed(created.describe());
        let mut env = EnvFile::load(&env_path)?;
        if interactive && setup::offer_api_key(&mut env, ui)? {
            state.fixed("Saved OPENAI_API_KEY");
        }
        report_key(ui, state, &env);
    }

    let streamlit_path = layout.streamlit_config();
    if StreamlitConfig::from_frontend(&ctx.settings.frontend).write_if_missing(&streamlit_path)? {
        ui.success("Streamlit configuration - Created");
        state.fixed(format!("Created {}", streamlit_path.display()));
    } else {
        ui.success("Streamlit configuration - Found");
    }
    info!("Configuration step finished");
    Ok(true)
}

/// A key that is still unset is an issue, but not a critical one
fn report_key(ui: &Ui, state: &mut Deployment, env: &EnvFile) {
    let status = env.api_key_status();
    if status.is_configured() {
        ui.success("API key configured");
    } else {
        ui.warning(&format!("API key {}", status.reason()));
        ui.tip(&format!("Get your key from {}", setup::API_KEY_URL));
        state.issue(format!("OPENAI_API_KEY is {}", status.reason()), false);
    }
}

/// Step 8; true when no critical issue was recorded
fn report(ui: &Ui, state: &Deployment) -> bool {
    ui.step(TOTAL_STEPS, TOTAL_STEPS, "📋 Generating Deployment Report");
    println!();
    ui.colored(Color::Bold, "🎯 Deployment Summary");
    ui.line(&"=".repeat(50));

    if !state.fixes.is_empty() {
        println!();
        ui.colored(Color::Green, "✅ Fixes Applied:");
        for fix in &state.fixes {
            ui.line(&format!("  • {fix}"));
        }
    }
    if !state.issues.is_empty() {
        println!();
        ui.colored(Color::Yellow, "⚠️  Issues Found:");
        for issue in &state.issues {
            let marker = if issue.critical { " (critical)" } else { "" };
            ui.line(&format!("  • {}{marker}", issue.message));
        }
    }

    println!();
    if state.has_critical() {
        ui.colored(Color::Red, "❌ Deployment has critical issues");
        ui.colored(Color::Yellow, "Please fix the issues above before running RepoMaster");
        false
    } else {
        ui.colored(Color::Green, "🎉 Deployment Successful!");
        println!();
        ui.colored(Color::Cyan, "🚀 Ready to launch RepoMaster:");
        ui.line("  • Frontend: repomaster launch --mode frontend");
        ui.line("  • Backend:  repomaster launch --mode backend --backend-mode unified");
        ui.line("  • Interactive: repomaster start");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_run_has_every_step() {
        let steps = plan_steps(&DeployArgs::default());
        assert_eq!(steps, Step::ALL.to_vec());
        let numbers: Vec<usize> = steps.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_validate_only_skips_install() {
        let args = DeployArgs {
            validate_only: true,
            ..DeployArgs::default()
        };
        let steps = plan_steps(&args);
        assert!(!steps.contains(&Step::Install));
        assert_eq!(steps.len(), 6);
    }

    #[test]
    fn test_fix_deps_only_installs() {
        let args = DeployArgs {
            fix_deps: true,
            ..DeployArgs::default()
        };
        assert_eq!(plan_steps(&args), vec![Step::Python, Step::Install]);
    }

    #[test]
    fn test_only_critical_issues_fail() {
        let mut state = Deployment::default();
        state.issue("OPENAI_API_KEY is placeholder value", false);
        assert!(!state.has_critical());
        assert!(report(&Ui::plain(), &state));

        state.issue("Missing critical file: requirements.txt", true);
        assert!(state.has_critical());
        assert!(!report(&Ui::plain(), &state));
    }

    #[test]
    fn test_absorb_records_failures() {
        let mut state = Deployment::default();
        let ok = state.absorb(
            &Ui::plain(),
            &[
                CheckResult::pass("Port 8501", "Port 8501 is available"),
                CheckResult::warn("Port 8502", "Port 8502 is in use"),
            ],
        );
        assert!(ok);
        assert!(state.issues.is_empty());

        let ok = state.absorb(
            &Ui::plain(),
            &[CheckResult::fail("Port availability", "No available ports for Streamlit")],
        );
        assert!(!ok);
        assert!(state.has_critical());
    }

    #[test]
    fn test_missing_package_reported_once() {
        let mut state = Deployment::default();
        let ok = state.absorb_imports(
            &Ui::plain(),
            &[
                CheckResult::fail("Dependency: streamlit", "Web UI - No module named 'streamlit'"),
                CheckResult::warn("Optional: PyMuPDF", "PDF support - optional"),
                CheckResult::fail(validate::CRITICAL_DEPENDENCIES, "Missing: streamlit"),
            ],
        );
        assert!(!ok);
        assert_eq!(state.issues.len(), 1);
        assert_eq!(state.issues[0].message, "Critical dependencies: Missing: streamlit");
        assert!(state.issues[0].critical);
    }
}
