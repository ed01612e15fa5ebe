//! CLI module for RepoMaster
//!
//! Provides the launcher commands:
//! - `deploy`: guided setup (dependencies, configuration, validation)
//! - `start`: interactive mode menu
//! - `launch`: start one frontend or backend mode directly
//! - `validate`: environment health checks
//! - `check-api` / `analyze`: live checks against the configured model endpoint

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use repomaster_core::{load_settings, EnvFile, LauncherSettings, ProjectLayout};

pub mod analyze;
pub mod check_api;
pub mod deploy;
pub mod display;
pub mod encoding;
pub mod launch;
pub mod setup;
pub mod start;
pub mod validate;

use display::Ui;

/// RepoMaster launcher CLI
#[derive(Parser, Debug)]
#[command(name = "repomaster")]
#[command(about = "Setup, validation and launcher for the RepoMaster repository assistant")]
#[command(version)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Whether diagnostics should be raised to debug
    pub fn verbose(&self) -> bool {
        matches!(&self.command, Some(Commands::Deploy(args)) if args.verbose)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch a frontend or backend mode
    Launch(launch::LaunchArgs),
    /// Interactive menu
    Start,
    /// Guided setup: dependencies, configuration, validation
    Deploy(deploy::DeployArgs),
    /// Check the environment and report readiness
    Validate(validate::ValidateArgs),
    /// Send one test message to the configured API
    CheckApi(check_api::CheckApiArgs),
    /// Ask the model to summarize a repository
    Analyze(analyze::AnalyzeArgs),
}

/// Shared state for every command
pub struct Context {
    pub layout: ProjectLayout,
    pub settings: LauncherSettings,
    pub ui: Ui,
}

impl Context {
    /// Resolve the project root and load launcher settings
    pub fn load(root: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };
        let layout = ProjectLayout::new(root);
        let settings = load_settings(&layout)
            .with_context(|| format!("Failed to load {}", layout.launcher_settings().display()))?;
        Ok(Self {
            layout,
            settings,
            ui: Ui::detect(),
        })
    }

    /// Read `configs/.env`
    pub fn load_env(&self) -> repomaster_core::Result<EnvFile> {
        EnvFile::load(self.layout.env_file())
    }
}

/// Run the CLI command, returning the process exit code
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(0);
    };

    let ctx = Context::load(cli.root)?;
    match command {
        Commands::Launch(args) => launch::run(&ctx, args).await,
        Commands::Start => start::run(&ctx).await,
        Commands::Deploy(args) => deploy::run(&ctx, args).await,
        Commands::Validate(args) => validate::run(&ctx, args).await,
        Commands::CheckApi(args) => check_api::run(&ctx, args).await,
        Commands::Analyze(args) => analyze::run(&ctx, args).await,
    }
}
