//! Creating and filling in `configs/.env`.
//!
//! Used by `deploy` (step 5) and by `start` when the key is missing:
//!   1. Copy `configs/env.example` when it exists
//!   2. Otherwise prompt for the keys (interactive) or write the template
//!   3. Offer to replace a placeholder key

pub mod prompts;

use anyhow::Context;
use repomaster_core::env::{keys, DEFAULT_BASE_URL, DEFAULT_MODEL};
use repomaster_core::{EnvFile, EnvTemplate, KeyStatus, ProjectLayout};
use std::io::IsTerminal;
use tracing::info;

use super::display::Ui;

/// Where API keys are issued
pub const API_KEY_URL: &str = "https://z.ai/model-api";

/// How a missing `.env` was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvCreation {
    /// Copied from `configs/env.example`
    CopiedExample,
    /// Written from keys entered at the prompt
    Entered,
    /// Written with the placeholder key
    Template,
}

impl EnvCreation {
    pub fn describe(self) -> &'static str {
        match self {
            Self::CopiedExample => "Created .env from example",
            Self::Entered => "Created .env with the entered API keys",
            Self::Template => "Created .env template (API key still to be set)",
        }
    }
}

/// Whether stdin is a terminal we can prompt on
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Create `configs/.env`, which must not exist yet
pub fn create_env(layout: &ProjectLayout, ui: &Ui, interactive: bool) -> anyhow::Result<EnvCreation> {
    let env_path = layout.env_file();
    let example = layout.env_example();

    if example.exists() {
        std::fs::create_dir_all(layout.config_dir())
            .with_context(|| format!("Failed to create {}", layout.config_dir().display()))?;
        std::fs::copy(&example, &env_path)
            .with_context(|| format!("Failed to copy {}", example.display()))?;
        info!(path = %env_path.display(), "Copied env.example");
        return Ok(EnvCreation::CopiedExample);
    }

    let (template, creation) = if interactive {
        (collect_keys(ui)?, EnvCreation::Entered)
    } else {
        (EnvTemplate::default(), EnvCreation::Template)
    };
    template
        .into_env_file(&env_path)?
        .save()
        .with_context(|| format!("Failed to write {}", env_path.display()))?;
    info!(path = %env_path.display(), "Wrote new .env");
    Ok(creation)
}

/// Ask for every key the template holds
pub fn collect_keys(ui: &Ui) -> anyhow::Result<EnvTemplate> {
    ui.header("🔑 API Configuration");
    ui.line(&format!("  Get your Z.ai API key from {API_KEY_URL}"));
    ui.line("  SERPER_API_KEY and JINA_API_KEY are optional; press Enter to skip.");
    println!();

    let api_key = prompts::password_required("Z.ai API key:")?;
    let model = prompts::text("Model:", Some(DEFAULT_MODEL))?;
    let base_url = prompts::text("Base URL:", Some(DEFAULT_BASE_URL))?;
    let serper = prompts::password("Serper API key (optional):")?;
    let jina = prompts::password("Jina API key (optional):")?;

    Ok(EnvTemplate {
        api_key,
        model,
        base_url,
        serper_api_key: non_empty(serper),
        jina_api_key: non_empty(jina),
        ..EnvTemplate::default()
    })
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Offer to replace a missing or placeholder key; returns whether the file changed
pub fn offer_api_key(env: &mut EnvFile, ui: &Ui) -> anyhow::Result<bool> {
    let status = env.api_key_status();
    if status == KeyStatus::Configured {
        return Ok(false);
    }
    ui.warning(&format!("{} is {}", keys::OPENAI_API_KEY, status.reason()));
    if !prompts::confirm("Enter your Z.ai API key now?", true, Some(API_KEY_URL))? {
        return Ok(false);
    }
    let key = prompts::password_required("Z.ai API key:")?;
    env.set(keys::OPENAI_API_KEY, &key);
    env.save()?;
    ui.success("API key saved");
    Ok(true)
}
