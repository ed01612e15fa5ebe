//! `repomaster validate`: setup readiness checks
//!
//! Every check yields a [`CheckResult`]; the report's success rate decides
//! the exit status. `deploy` reuses the individual check groups.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Args;
use repomaster_core::env::keys;
use repomaster_core::{
    load_settings, mask_api_key, CheckResult, CheckStatus, DependencySettings, EnvFile, Fix, KeyStatus,
    LauncherSettings, ProjectLayout, PythonSettings, ValidationReport, Verdict,
};
use repomaster_runtime::deps::{self, check_all, require_any};
use repomaster_runtime::{ports, python, ImportStatus, Interpreter, LaunchPlanner, ModuleProbe, PythonVersion};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::display::{Color, Ui};
use super::setup::API_KEY_URL;
use super::Context;

const VENV_HINT: &str = "python -m venv venv && source venv/bin/activate";

const DEPLOY_HINT: &str = "Run 'repomaster deploy' to create it";

#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Skip the launcher settings and launch plan checks
    #[arg(long)]
    pub quick: bool,

    /// Apply automatic fixes (pip installs, copying env.example) and re-check
    #[arg(long)]
    pub fix: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    pub fn quick() -> Self {
        Self {
            quick: true,
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    success_rate: f64,
    verdict: Verdict,
    passed: usize,
    total: usize,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

pub async fn run(ctx: &Context, args: ValidateArgs) -> anyhow::Result<i32> {
    let ui = &ctx.ui;
    if !args.json {
        println!(
            "{}",
            ui.paint(
                Color::Cyan,
                &ui.boxed(&["", "🔍 RepoMaster Setup Validation", "", "Comprehensive system readiness check", ""])
            )
        );
        ui.colored(Color::Cyan, "Running validation checks...");
    }

    let (mut report, interpreter) = collect(ctx, args.quick).await;

    if args.fix && report.fixes().any(|(_, fix)| fix.is_automatic()) {
        let applied = apply_fixes(ctx, &report, interpreter.as_ref(), !args.json).await;
        if applied > 0 {
            report = collect(ctx, args.quick).await.0;
        }
    }

    let verdict = report.verdict();
    if args.json {
        let json = JsonReport {
            generated_at: Utc::now(),
            success_rate: report.success_rate(),
            verdict,
            passed: report.passed(),
            total: report.total(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!();
        for result in &report.results {
            print_result(ui, result);
        }
        print_summary(ui, &report);
    }

    Ok(if verdict.is_success() { 0 } else { 1 })
}

/// Run every check group in order
pub async fn collect(ctx: &Context, quick: bool) -> (ValidationReport, Option<Interpreter>) {
    let layout = &ctx.layout;
    let settings = &ctx.settings;
    let mut report = ValidationReport::new();

    let (results, interpreter) = python_checks(&settings.python).await;
    report.extend(results);
    report.push(venv_check());
    report.extend(
        dependency_checks(
            interpreter.as_ref().map(|i| i as &dyn ModuleProbe),
            &settings.dependencies,
        )
        .await,
    );
    report.extend(project_file_checks(layout, settings));
    report.extend(env_checks(layout));
    report.extend(port_checks(&settings.frontend.host, &settings.frontend.probe_ports));
    report.push(readability_check(layout, settings));
    if !quick {
        report.extend(plan_checks(ctx, interpreter.as_ref()).await);
    }

    debug!(
        total = report.total(),
        passed = report.passed(),
        "Validation checks finished"
    );
    (report, interpreter)
}

/// Interpreter discovery, minimum version and backend ceiling
pub async fn python_checks(settings: &PythonSettings) -> (Vec<CheckResult>, Option<Interpreter>) {
    let interpreter = match python::discover(settings).await {
        Ok(interpreter) => interpreter,
        Err(e) => {
            let result = CheckResult::fail("Python version", e.to_string()).with_fix(Fix::manual(format!(
                "Install Python {} or newer",
                settings.min_version
            )));
            return (vec![result], None);
        }
    };

    let mut out = vec![CheckResult::pass(
        "Python version",
        format!(
            "Python {} is compatible ({})",
            interpreter.version(),
            interpreter.resolved_path().display()
        ),
    )];
    match PythonVersion::parse(&settings.backend_max_version) {
        Ok(max) if interpreter.is_at_or_above(max) => out.push(
            CheckResult::warn(
                "Backend Python compatibility",
                format!(
                    "Python {} is not supported by the agent framework yet; backend modes may fail",
                    interpreter.version()
                ),
            )
            .with_fix(Fix::manual(format!(
                "Use a Python release older than {} for the backend modes",
                max.short()
            ))),
        ),
        Ok(_) => {}
        Err(e) => out.push(CheckResult::warn("Backend Python compatibility", e.to_string())),
    }
    (out, Some(interpreter))
}

/// Active virtualenv or conda environment
pub fn venv_check() -> CheckResult {
    match python::active_virtualenv() {
        Some(prefix) => CheckResult::pass("Virtual environment", format!("Active: {prefix}")),
        None => CheckResult::warn("Virtual environment", "Not running in a virtual environment")
            .with_fix(Fix::manual(VENV_HINT)),
    }
}

/// Name of the aggregate row for the critical set
pub const CRITICAL_DEPENDENCIES: &str = "Critical dependencies";

/// Per-package import checks plus an aggregate for the critical set
pub async fn dependency_checks(
    probe: Option<&dyn ModuleProbe>,
    specs: &DependencySettings,
) -> Vec<CheckResult> {
    let Some(probe) = probe else {
        return vec![CheckResult::fail(
            CRITICAL_DEPENDENCIES,
            "No Python interpreter to import them with",
        )];
    };

    let mut out = Vec::new();
    let mut missing = Vec::new();
    for dep in check_all(probe, &specs.critical).await {
        let name = format!("Dependency: {}", dep.spec.package);
        match dep.status {
            ImportStatus::Available => {
                out.push(CheckResult::pass(name, format!("{} - OK", dep.spec.description)))
            }
            ImportStatus::Missing(detail) => {
                missing.push(dep.spec.package.clone());
                out.push(
                    CheckResult::fail(name, format!("{} - {detail}", dep.spec.description))
                        .with_fix(Fix::pip([dep.spec.package.as_str()])),
                );
            }
        }
    }
    for dep in check_all(probe, &specs.optional).await {
        let name = format!("Optional: {}", dep.spec.package);
        match dep.status {
            ImportStatus::Available => {
                out.push(CheckResult::pass(name, format!("{} - OK", dep.spec.description)))
            }
            ImportStatus::Missing(detail) => out.push(
                CheckResult::warn(name, format!("{} - optional: {detail}", dep.spec.description))
                    .with_fix(Fix::pip([dep.spec.package.as_str()])),
            ),
        }
    }

    out.push(if missing.is_empty() {
        CheckResult::pass(
            CRITICAL_DEPENDENCIES,
            format!("All {} critical packages import", specs.critical.len()),
        )
    } else {
        CheckResult::fail(CRITICAL_DEPENDENCIES, format!("Missing: {}", missing.join(", ")))
            .with_fix(Fix::pip(missing.iter().map(String::as_str)))
    });
    out
}

/// Files the launcher needs in the project checkout
pub fn project_file_checks(layout: &ProjectLayout, settings: &LauncherSettings) -> Vec<CheckResult> {
    let requirements = layout.requirements();
    let app = layout.resolve(&settings.frontend.app);
    let entry = layout.resolve(&settings.backend.entry);
    let streamlit = layout.streamlit_config();
    let wrong_root = "Run from the RepoMaster checkout or pass --root";

    vec![
        file_check("Requirements file", &requirements, CheckStatus::Warn, wrong_root),
        file_check("Frontend app", &app, CheckStatus::Fail, wrong_root),
        file_check("Backend entry point", &entry, CheckStatus::Fail, wrong_root),
        file_check("Streamlit config", &streamlit, CheckStatus::Warn, DEPLOY_HINT),
    ]
}

fn file_check(name: &str, path: &Path, missing: CheckStatus, hint: &str) -> CheckResult {
    if path.is_file() {
        return CheckResult::pass(name, format!("Found {}", path.display()));
    }
    let message = format!("Missing {}", path.display());
    let result = match missing {
        CheckStatus::Fail => CheckResult::fail(name, message),
        _ => CheckResult::warn(name, message),
    };
    result.with_fix(Fix::manual(hint))
}

/// `configs/.env` presence, required variables and key status
pub fn env_checks(layout: &ProjectLayout) -> Vec<CheckResult> {
    let path = layout.env_file();
    if !path.exists() {
        let example = layout.env_example();
        let result = if example.exists() {
            CheckResult::fail("Environment file", "configs/.env missing, env.example available").with_fix(
                Fix::CopyFile {
                    from: example,
                    to: path,
                },
            )
        } else {
            CheckResult::fail("Environment file", format!("{} not found", path.display()))
                .with_fix(Fix::manual(DEPLOY_HINT))
        };
        return vec![result];
    }

    let env = match EnvFile::load(&path) {
        Ok(env) => env,
        Err(e) => return vec![CheckResult::fail("Environment file", e.to_string())],
    };

    let mut out = vec![CheckResult::pass("Environment file", format!("Found {}", path.display()))];
    let missing = env.missing_required();
    out.push(if missing.is_empty() {
        CheckResult::pass("Required variables", "Environment variables configured")
    } else {
        CheckResult::fail("Required variables", format!("Missing: {}", missing.join(", ")))
            .with_fix(Fix::manual("Add them to configs/.env or run 'repomaster deploy'"))
    });
    out.push(match (env.api_key_status(), env.get(keys::OPENAI_API_KEY)) {
        (KeyStatus::Configured, Some(key)) => CheckResult::pass(
            "API key",
            format!("{} configured ({})", keys::OPENAI_API_KEY, mask_api_key(key)),
        ),
        (status, _) => CheckResult::fail(
            "API key",
            format!("{} is {}", keys::OPENAI_API_KEY, status.reason()),
        )
        .with_fix(Fix::manual(format!(
            "Get a key from {API_KEY_URL} and run 'repomaster deploy'"
        ))),
    });
    out
}

/// Per-port availability plus an aggregate
pub fn port_checks(host: &str, candidates: &[u16]) -> Vec<CheckResult> {
    let mut out = Vec::new();
    let mut available = Vec::new();
    for &port in candidates {
        let name = format!("Port {port}");
        if ports::is_available(host, port) {
            available.push(port.to_string());
            out.push(CheckResult::pass(name, format!("Port {port} is available")));
        } else {
            out.push(CheckResult::warn(name, format!("Port {port} is in use")));
        }
    }
    out.push(if available.is_empty() {
        CheckResult::fail("Port availability", "No available ports for Streamlit").with_fix(Fix::manual(
            "Stop the process using the port or launch with --streamlit-port",
        ))
    } else {
        CheckResult::pass(
            "Port availability",
            format!("Available ports: {}", available.join(", ")),
        )
    });
    out
}

/// Project files that exist must be readable
pub fn readability_check(layout: &ProjectLayout, settings: &LauncherSettings) -> CheckResult {
    let files: Vec<PathBuf> = vec![
        layout.env_file(),
        layout.requirements(),
        layout.resolve(&settings.frontend.app),
        layout.resolve(&settings.backend.entry),
    ];
    let unreadable: Vec<String> = files
        .iter()
        .filter(|p| p.exists())
        .filter(|p| std::fs::File::open(p).is_err())
        .map(|p| p.display().to_string())
        .collect();

    if unreadable.is_empty() {
        CheckResult::pass("File permissions", "All project files are readable")
    } else {
        CheckResult::fail("File permissions", format!("Not readable: {}", unreadable.join(", ")))
            .with_fix(Fix::manual(format!("chmod u+r {}", unreadable.join(" "))))
    }
}

/// Settings load, launch plan construction and the orchestration import
pub async fn plan_checks(ctx: &Context, interpreter: Option<&Interpreter>) -> Vec<CheckResult> {
    let settings = match load_settings(&ctx.layout) {
        Ok(settings) => settings,
        Err(e) => {
            return vec![CheckResult::fail("Launcher settings", e.to_string()).with_fix(Fix::manual(format!(
                "Fix or remove {}",
                ctx.layout.launcher_settings().display()
            )))]
        }
    };
    let source = if ctx.layout.launcher_settings().exists() {
        format!("defaults + {}", ctx.layout.launcher_settings().display())
    } else {
        "built-in defaults".to_string()
    };
    let mut out = vec![CheckResult::pass("Launcher settings", format!("Loaded {source}"))];

    let program = interpreter
        .map(|i| i.program().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("python3"));
    let plans = LaunchPlanner::new(&ctx.layout, &settings, program).all(&settings.backend.work_dir());
    let labels: Vec<&str> = plans.iter().map(|p| p.label.as_str()).collect();
    out.push(CheckResult::pass(
        "Launch plans",
        format!("{} plans built: {}", plans.len(), labels.join(", ")),
    ));

    if let Some(interpreter) = interpreter {
        out.push(match require_any(interpreter, &settings.backend.orchestration_modules).await {
            Ok(module) => CheckResult::pass("Orchestration dependency", format!("{module} imports")),
            Err(e) => CheckResult::warn("Orchestration dependency", e.to_string())
                .with_fix(Fix::manual("Install the agent framework listed in requirements.txt")),
        });
    }
    out
}

/// Apply automatic fixes; returns how many were applied
pub async fn apply_fixes(
    ctx: &Context,
    report: &ValidationReport,
    interpreter: Option<&Interpreter>,
    verbose: bool,
) -> usize {
    let ui = &ctx.ui;
    let mut packages = BTreeSet::new();
    let mut applied = 0;

    for (result, fix) in report.fixes() {
        match fix {
            Fix::PipInstall { packages: p } => packages.extend(p.iter().cloned()),
            Fix::CopyFile { from, to } => match copy_file(from, to) {
                Ok(()) => {
                    applied += 1;
                    info!(check = %result.name, "Applied fix: {fix}");
                    if verbose {
                        ui.success(&format!("Fixed {}: {fix}", result.name));
                    }
                }
                Err(e) => {
                    warn!(check = %result.name, error = %e, "Fix failed");
                    if verbose {
                        ui.error(&format!("Could not fix {}: {e:#}", result.name));
                    }
                }
            },
            Fix::Manual { .. } => {}
        }
    }

    if packages.is_empty() {
        return applied;
    }
    let Some(interpreter) = interpreter else {
        if verbose {
            ui.warning("Skipping pip installs: no Python interpreter found");
        }
        return applied;
    };
    let args: Vec<&str> = packages.iter().map(String::as_str).collect();
    if verbose {
        ui.info(&format!("Installing {}...", args.join(" ")));
    }
    match deps::pip_install(interpreter, &args, Some(ctx.layout.root())).await {
        Ok(()) => {
            applied += 1;
            if verbose {
                ui.success(&format!("Installed {}", args.join(" ")));
            }
        }
        Err(e) => {
            warn!(error = %e, "pip install failed");
            if verbose {
                ui.error(&format!("pip install failed: {e}"));
            }
        }
    }
    applied
}

fn copy_file(from: &Path, to: &Path) -> anyhow::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(from, to).with_context(|| format!("Failed to copy {}", from.display()))?;
    Ok(())
}

/// One result line, with its fix when not passing
pub fn print_result(ui: &Ui, result: &CheckResult) {
    let line = format!("{}: {}", result.name, result.message);
    match result.status {
        CheckStatus::Pass => ui.success(&line),
        CheckStatus::Warn => ui.warning(&line),
        CheckStatus::Fail => ui.error(&line),
    }
    if let (false, Some(fix)) = (result.passed(), &result.fix) {
        ui.line(&format!("     💡 Fix: {fix}"));
    }
}

fn print_summary(ui: &Ui, report: &ValidationReport) {
    println!();
    ui.colored(Color::Bold, "📋 Validation Report");
    ui.line(&"=".repeat(60));
    ui.colored(Color::Cyan, "Summary:");
    ui.line(&format!("  Total checks: {}", report.total()));
    ui.line(&format!("  Passed: {}", ui.paint(Color::Green, &report.passed().to_string())));
    ui.line(&format!(
        "  Warnings: {}",
        ui.paint(Color::Yellow, &report.count(CheckStatus::Warn).to_string())
    ));
    ui.line(&format!(
        "  Failed: {}",
        ui.paint(Color::Red, &report.count(CheckStatus::Fail).to_string())
    ));

    let rate = report.success_rate();
    println!();
    match report.verdict() {
        Verdict::Ready => {
            ui.colored(Color::Green, &format!("🎉 {} ({rate:.1}%)", Verdict::Ready.headline()));
            ui.colored(Color::Cyan, "You can start RepoMaster with:");
            ui.line("  • repomaster start");
            ui.line("  • repomaster launch --mode frontend");
        }
        Verdict::MostlyReady => {
            ui.warning(&format!("{} ({rate:.1}%)", Verdict::MostlyReady.headline()));
            ui.colored(Color::Cyan, "Consider fixing the issues above for optimal performance");
        }
        Verdict::NeedsAttention => {
            ui.error(&format!("{} ({rate:.1}%)", Verdict::NeedsAttention.headline()));
            ui.colored(Color::Cyan, "Please fix the critical issues before running RepoMaster");
            ui.colored(Color::Cyan, "Run: repomaster deploy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repomaster_core::DependencySpec;
    use std::net::TcpListener;
    use tempfile::TempDir;

    struct Installed(&'static [&'static str]);

    #[async_trait]
    impl ModuleProbe for Installed {
        async fn probe(&self, module: &str) -> ImportStatus {
            if self.0.contains(&module) {
                ImportStatus::Available
            } else {
                ImportStatus::Missing(format!("ModuleNotFoundError: No module named '{module}'"))
            }
        }
    }

    fn deps() -> DependencySettings {
        DependencySettings {
            critical: vec![
                DependencySpec::new("streamlit", "streamlit", "Web framework"),
                DependencySpec::new("python-dotenv", "dotenv", "Environment variables"),
            ],
            optional: vec![DependencySpec::new("PyMuPDF", "fitz", "PDF processing")],
        }
    }

    #[tokio::test]
    async fn test_dependency_checks_missing_critical() {
        let probe = Installed(&["streamlit"]);
        let results = dependency_checks(Some(&probe), &deps()).await;

        let dotenv = results.iter().find(|r| r.name == "Dependency: python-dotenv").unwrap();
        assert_eq!(dotenv.status, CheckStatus::Fail);
        assert!(dotenv.message.contains("No module named 'dotenv'"));

        let optional = results.iter().find(|r| r.name == "Optional: PyMuPDF").unwrap();
        assert_eq!(optional.status, CheckStatus::Warn);

        let aggregate = results.last().unwrap();
        assert_eq!(aggregate.status, CheckStatus::Fail);
        assert_eq!(aggregate.fix, Some(Fix::pip(["python-dotenv"])));
    }

    #[tokio::test]
    async fn test_dependency_checks_without_python() {
        let results = dependency_checks(None, &deps()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_env_checks_example_only_offers_copy() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::create_dir_all(layout.config_dir()).unwrap();
        std::fs::write(layout.env_example(), "OPENAI_API_KEY=x\n").unwrap();

        let results = env_checks(&layout);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].fix, Some(Fix::CopyFile { .. })));
    }

    #[test]
    fn test_env_checks_placeholder_key() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::create_dir_all(layout.config_dir()).unwrap();
        std::fs::write(
            layout.env_file(),
            "OPENAI_API_KEY=your_zai_api_key_here\nOPENAI_MODEL=glm-4.5\nOPENAI_BASE_URL=https://api.z.ai/api/paas/v4/\n",
        )
        .unwrap();

        let results = env_checks(&layout);
        let statuses: Vec<CheckStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![CheckStatus::Pass, CheckStatus::Pass, CheckStatus::Fail]);
        assert!(results[2].message.contains("placeholder"));
    }

    #[test]
    fn test_env_checks_configured_key_is_masked() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::create_dir_all(layout.config_dir()).unwrap();
        std::fs::write(layout.env_file(), "OPENAI_API_KEY=zai-1234567890abcdef\n").unwrap();

        let results = env_checks(&layout);
        assert_eq!(results[1].status, CheckStatus::Fail);
        assert_eq!(results[2].status, CheckStatus::Pass);
        assert!(!results[2].message.contains("1234567890"));
    }

    #[test]
    fn test_port_checks_busy_port() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let busy = listener.local_addr().unwrap().port();

        let results = port_checks("127.0.0.1", &[busy]);
        assert_eq!(results[0].status, CheckStatus::Warn);
        assert_eq!(results[1].status, CheckStatus::Fail);
    }

    #[test]
    fn test_project_file_checks() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        std::fs::write(temp.path().join("launcher.py"), "").unwrap();
        let results = project_file_checks(&layout, &LauncherSettings::default());

        let by_name = |n: &str| results.iter().find(|r| r.name == n).unwrap().status;
        assert_eq!(by_name("Requirements file"), CheckStatus::Warn);
        assert_eq!(by_name("Frontend app"), CheckStatus::Fail);
        assert_eq!(by_name("Backend entry point"), CheckStatus::Pass);
    }

    #[test]
    fn test_json_report_shape() {
        let mut report = ValidationReport::new();
        report.push(CheckResult::pass("Python version", "Python 3.11.4 is compatible"));
        let json = JsonReport {
            generated_at: Utc::now(),
            success_rate: report.success_rate(),
            verdict: report.verdict(),
            passed: report.passed(),
            total: report.total(),
            report: &report,
        };
        let value = serde_json::to_value(&json).unwrap();
        assert_eq!(value["verdict"], "ready");
        assert_eq!(value["results"][0]["status"], "pass");
        assert!(value["generated_at"].is_string());
    }
}
