//! `repomaster analyze`: ask the model to summarize a repository

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Args;
use repomaster_llm::{analyze, ChatOutcome, RepoSummary};

use super::check_api::{load_client, print_described, Level};
use super::display::Color;
use super::Context;

const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Directory to analyze (default: the project root)
    pub path: Option<PathBuf>,

    /// File extension to collect
    #[arg(long, default_value = "py")]
    pub ext: String,
}

pub async fn run(ctx: &Context, args: AnalyzeArgs) -> anyhow::Result<i32> {
    let ui = &ctx.ui;
    ui.header("🔍 RepoMaster Self-Analysis");

    let Some((api, client)) = load_client(ctx, ANALYSIS_TIMEOUT) else {
        return Ok(1);
    };
    ui.line(&format!("🤖 Using {} via {}", client.model(), api.base_url));

    let root = args.path.unwrap_or_else(|| ctx.layout.root().to_path_buf());
    println!();
    ui.line("📊 Analyzing repository structure...");
    let summary = RepoSummary::scan(&root, &args.ext)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    ui.line(&format!("Found {} {} files", summary.count(), summary.extension));

    println!();
    ui.line("🧠 Asking the model to analyze the repository...");
    let outcome = analyze(&client, &summary).await;
    match &outcome {
        ChatOutcome::Replied(reply) => {
            ui.success("Analysis complete!");
            println!();
            ui.colored(Color::Bold, "🎯 AI Analysis Results:");
            ui.line(&"-".repeat(40));
            ui.line(reply.content.trim());
            ui.line(&"-".repeat(40));
        }
        ChatOutcome::InsufficientBalance(_) => print_described(
            ui,
            (
                Level::Warning,
                vec![
                    "Z.ai API configured correctly, but insufficient balance".to_string(),
                    "   The integration is working; with balance the model would return:".to_string(),
                    "   - Detailed code analysis".to_string(),
                    "   - Repository insights".to_string(),
                    "   - Architecture recommendations".to_string(),
                ],
            ),
        ),
        other => print_described(ui, super::check_api::describe(other)),
    }

    Ok(if analysis_succeeded(&outcome) { 0 } else { 1 })
}

/// A reply, or a funded-but-empty account; a rejected key is a failure here
pub fn analysis_succeeded(outcome: &ChatOutcome) -> bool {
    matches!(outcome, ChatOutcome::Replied(_) | ChatOutcome::InsufficientBalance(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repomaster_llm::ChatReply;

    #[test]
    fn test_reply_and_balance_succeed() {
        let reply = ChatOutcome::Replied(ChatReply {
            content: "A launcher for RepoMaster.".to_string(),
            model: "glm-4.5".to_string(),
        });
        assert!(analysis_succeeded(&reply));
        assert!(analysis_succeeded(&ChatOutcome::InsufficientBalance("1113".to_string())));
    }

    #[test]
    fn test_rejected_key_fails() {
        let outcome = ChatOutcome::KeyRejected("401 invalid api key".to_string());
        assert!(outcome.is_configured());
        assert!(!analysis_succeeded(&outcome));
        assert!(!analysis_succeeded(&ChatOutcome::Failed("timeout after 60000ms".to_string())));
    }
}
