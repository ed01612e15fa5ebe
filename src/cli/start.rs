//! `repomaster start`: interactive menu

use anyhow::Context as _;
use repomaster_core::{BackendMode, KeyStatus};
use repomaster_runtime::supervisor::INTERRUPTED_EXIT_CODE;
use repomaster_runtime::ShutdownListener;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::display::{Color, Ui};
use super::launch::{launch_target, LaunchOptions, Target};
use super::setup::{prompts, API_KEY_URL};
use super::{deploy, validate, Context};

/// One menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Launch(Target),
    Help,
    Reconfigure,
    HealthCheck,
    Exit,
}

const MENU: [(&str, MenuChoice, &str, &str); 9] = [
    (
        "1",
        MenuChoice::Launch(Target::Frontend),
        "🌐 Web Interface (Streamlit)",
        "Launch the web-based dashboard",
    ),
    (
        "2",
        MenuChoice::Launch(Target::Backend(BackendMode::Unified)),
        "🤖 Unified AI Assistant",
        "Intelligent multi-agent orchestration",
    ),
    (
        "3",
        MenuChoice::Launch(Target::Backend(BackendMode::DeepSearch)),
        "🔍 Deep Search Agent",
        "Specialized repository search and analysis",
    ),
    (
        "4",
        MenuChoice::Launch(Target::Backend(BackendMode::GeneralAssistant)),
        "💻 General Assistant",
        "Programming and development assistance",
    ),
    (
        "5",
        MenuChoice::Launch(Target::Backend(BackendMode::RepositoryAgent)),
        "📁 Repository Agent",
        "Repository exploration and understanding",
    ),
    ("6", MenuChoice::Help, "❓ Help", "Show detailed help information"),
    ("7", MenuChoice::Reconfigure, "⚙️ Reconfigure", "Run deployment setup again"),
    ("8", MenuChoice::HealthCheck, "🏥 Health Check", "Quick validation of the setup"),
    ("0", MenuChoice::Exit, "🚪 Exit", "Exit the launcher"),
];

impl MenuChoice {
    /// Menu key typed by the user
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        MENU.iter()
            .find(|(key, ..)| *key == input)
            .map(|(_, choice, ..)| *choice)
    }
}

pub async fn run(ctx: &Context) -> anyhow::Result<i32> {
    let ui = &ctx.ui;
    ui.banner("Your AI-powered GitHub repository assistant");

    if !ensure_configured(ctx).await? {
        return Ok(1);
    }

    // A cancelled prompt ends the launcher; a stdin read cut short by Ctrl+C
    // may still be pending, so the exit code goes straight to process exit.
    let interrupted = || -> anyhow::Result<i32> {
        println!();
        ui.warning("Launcher interrupted");
        Ok(INTERRUPTED_EXIT_CODE)
    };

    loop {
        let menu_ui = *ui;
        let choice = match interruptible(move || choose(&menu_ui)).await {
            Ok(choice) => choice,
            Err(e) if prompts::is_cancelled(&e) => return interrupted(),
            Err(e) => return Err(e),
        };

        match choice {
            MenuChoice::Exit => {
                ui.colored(Color::Cyan, "👋 Goodbye!");
                break;
            }
            MenuChoice::Help => {
                show_help(ctx);
                match pause(ui).await {
                    Err(e) if prompts::is_cancelled(&e) => return interrupted(),
                    other => other?,
                }
            }
            MenuChoice::Reconfigure => {
                ui.colored(Color::Cyan, "🚀 Running deployment setup...");
                if let Err(e) = deploy::run(ctx, deploy::DeployArgs::default()).await {
                    ui.error(&format!("Deployment error: {e:#}"));
                }
            }
            MenuChoice::HealthCheck => {
                if let Err(e) = validate::run(ctx, validate::ValidateArgs::quick()).await {
                    ui.error(&format!("Health check failed: {e:#}"));
                }
                match pause(ui).await {
                    Err(e) if prompts::is_cancelled(&e) => return interrupted(),
                    other => other?,
                }
            }
            MenuChoice::Launch(target) => {
                if let Err(e) = launch_target(ctx, target, &LaunchOptions::default()).await {
                    warn!(error = %e, "Launch failed");
                    ui.error(&format!("Error launching service: {e:#}"));
                }
                match ask_again().await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) if prompts::is_cancelled(&e) => return interrupted(),
                    Err(e) => return Err(e),
                }
            }
        }
    }
    Ok(0)
}

/// Run a blocking prompt that also ends on Ctrl+C or SIGTERM
///
/// Once a launch has installed the runtime's signal handlers, Ctrl+C no
/// longer stops a plain stdin read, so each prompt gets its own listener.
async fn interruptible<T, F>(prompt: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let listener = ShutdownListener::install();
    until_cancelled(listener.token(), prompt).await
}

async fn until_cancelled<T, F>(token: CancellationToken, prompt: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(prompts::Cancelled.into()),
        joined = tokio::task::spawn_blocking(prompt) => joined.context("Prompt task failed")?,
    }
}

/// Check the key and offer setup when it is not usable
async fn ensure_configured(ctx: &Context) -> anyhow::Result<bool> {
    if check_configuration(ctx) {
        return Ok(true);
    }

    println!();
    let run_setup = match interruptible(|| {
        prompts::confirm("Would you like to run the deployment setup now?", true, None)
    })
    .await
    {
        Ok(answer) => answer,
        Err(e) if prompts::is_cancelled(&e) => false,
        Err(e) => return Err(e),
    };
    if !run_setup {
        ctx.ui.error("Cannot proceed without proper configuration");
        return Ok(false);
    }

    ctx.ui.colored(Color::Cyan, "🚀 Running deployment setup...");
    if let Err(e) = deploy::run(ctx, deploy::DeployArgs::default()).await {
        ctx.ui.error(&format!("Deployment error: {e:#}"));
    }
    if check_configuration(ctx) {
        Ok(true)
    } else {
        ctx.ui.error("Configuration still invalid. Exiting.");
        Ok(false)
    }
}

fn check_configuration(ctx: &Context) -> bool {
    let ui = &ctx.ui;
    let env = match ctx.load_env() {
        Ok(env) => env,
        Err(e) => {
            ui.error(&e.to_string());
            ui.tip("Run 'repomaster deploy' to set up RepoMaster");
            return false;
        }
    };
    match env.api_key_status() {
        KeyStatus::Configured => {
            ui.success("Configuration validated");
            true
        }
        status => {
            ui.error(&format!("Z.ai API key not configured ({})", status.reason()));
            ui.tip("Run 'repomaster deploy' to configure your API keys");
            false
        }
    }
}

fn choose(ui: &Ui) -> anyhow::Result<MenuChoice> {
    println!();
    ui.colored(Color::Header, "🎯 Choose RepoMaster Mode");
    ui.line("Select how you want to run RepoMaster:");
    println!();
    for (key, _, name, description) in MENU {
        ui.colored(Color::Blue, &format!("{key}. {name}"));
        ui.line(&format!("   {description}"));
        println!();
    }

    loop {
        let input = prompts::text(&ui.render("Enter your choice (0-8):"), None)?;
        match MenuChoice::parse(&input) {
            Some(choice) => return Ok(choice),
            None => ui.warning("Invalid choice. Please enter a number from 0-8."),
        }
    }
}

async fn ask_again() -> anyhow::Result<bool> {
    println!();
    interruptible(|| prompts::confirm("Would you like to launch another mode?", false, None)).await
}

async fn pause(ui: &Ui) -> anyhow::Result<()> {
    let message = ui.paint(Color::Cyan, "Press Enter to continue...");
    interruptible(move || prompts::pause(&message)).await
}

/// Help text for every mode plus configuration notes
pub fn help_text(ctx: &Context) -> Vec<(Color, String)> {
    let port = ctx.settings.frontend.port;
    let url = ctx.settings.frontend.url(&ctx.settings.frontend.host, port);
    let mut out = vec![(Color::Header, "📖 RepoMaster Help".to_string())];

    let mut section = |title: &str, lines: &[&str]| {
        out.push((Color::Blue, String::new()));
        out.push((Color::Blue, title.to_string()));
        out.extend(lines.iter().map(|l| (Color::Bold, format!("   - {l}"))));
    };
    section(
        "🌐 Web Interface (Streamlit)",
        &[
            "Interactive web dashboard",
            "Visual interface for all RepoMaster features",
            "Best for beginners and visual users",
            format!("Access at: {url}").as_str(),
        ],
    );
    section(
        "🤖 Unified AI Assistant",
        &[
            "Intelligent multi-agent orchestration",
            "Automatically routes tasks to appropriate agents",
            "Recommended for most users",
        ],
    );
    section(
        "🔍 Deep Search Agent",
        &[
            "Specialized in repository search and analysis",
            "Advanced code exploration capabilities",
            "Best for research and discovery tasks",
        ],
    );
    section(
        "💻 General Assistant",
        &[
            "Programming and development assistance",
            "Code generation and debugging help",
        ],
    );
    section(
        "📁 Repository Agent",
        &[
            "Repository exploration and understanding",
            "Codebase analysis and documentation",
            "Best for understanding new codebases",
        ],
    );

    out.push((Color::Header, String::new()));
    out.push((Color::Header, "🔧 Configuration".to_string()));
    out.push((
        Color::Bold,
        format!("- Configuration file: {}", ctx.layout.env_file().display()),
    ));
    out.push((Color::Bold, format!("- Required: Z.ai API key from {API_KEY_URL}")));
    out.push((
        Color::Bold,
        "- Optional: SERPER_API_KEY, JINA_API_KEY for enhanced features".to_string(),
    ));
    out.push((
        Color::Bold,
        format!(
            "- Launcher settings: {} or REPOMASTER_<SECTION>__<KEY>",
            ctx.layout.launcher_settings().display()
        ),
    ));

    out.push((Color::Header, String::new()));
    out.push((Color::Header, "🚀 Quick Start".to_string()));
    for step in [
        "1. Run 'repomaster deploy' to set up RepoMaster",
        "2. Configure your Z.ai API key",
        "3. Use 'repomaster start' to launch interactively",
        "4. Or launch directly: 'repomaster launch --mode frontend'",
    ] {
        out.push((Color::Bold, step.to_string()));
    }
    out
}

fn show_help(ctx: &Context) {
    println!();
    for (color, line) in help_text(ctx) {
        match color {
            Color::Bold => ctx.ui.line(&line),
            other => ctx.ui.colored(other, &line),
        }
    }
    println!();
    ctx.ui.tip("Run 'repomaster check-api' to test the API key");
}
