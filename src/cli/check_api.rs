//! `repomaster check-api`: one-message connectivity test

use std::time::Duration;

use clap::Args;
use repomaster_core::{mask_api_key, ApiSettings};
use repomaster_llm::{probe_chat, ChatOutcome, ClientConfig, OpenAiCompatible, SearchProbe, ServiceStatus};

use super::display::Ui;
use super::Context;

#[derive(Args, Debug, Clone)]
pub struct CheckApiArgs {
    /// Also probe Serper and Jina when their keys are set
    #[arg(long)]
    pub search: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// Headline level and detail lines for a chat outcome
pub fn describe(outcome: &ChatOutcome) -> (Level, Vec<String>) {
    match outcome {
        ChatOutcome::Replied(reply) => (
            Level::Success,
            vec![
                "Z.ai API connection successful!".to_string(),
                format!("   Response: {}", reply.content.trim()),
            ],
        ),
        ChatOutcome::KeyRejected(detail) => (
            Level::Warning,
            vec![
                "API connection configured correctly, but the key was rejected".to_string(),
                "   Replace it with a valid Z.ai API key for full functionality".to_string(),
                format!("   Detail: {detail}"),
            ],
        ),
        ChatOutcome::InsufficientBalance(_) => (
            Level::Warning,
            vec![
                "Z.ai API configured correctly, but insufficient balance".to_string(),
                "   The integration works; top up the account to get replies".to_string(),
            ],
        ),
        ChatOutcome::Failed(detail) => (Level::Error, vec![format!("API connection failed: {detail}")]),
    }
}

pub fn print_described(ui: &Ui, (level, lines): (Level, Vec<String>)) {
    let mut lines = lines.into_iter();
    if let Some(headline) = lines.next() {
        match level {
            Level::Success => ui.success(&headline),
            Level::Warning => ui.warning(&headline),
            Level::Error => ui.error(&headline),
        }
    }
    for line in lines {
        ui.line(&line);
    }
}

/// Load `.env` and build the chat client, printing why when that is not possible
pub fn load_client(ctx: &Context, timeout: Duration) -> Option<(ApiSettings, OpenAiCompatible)> {
    let ui = &ctx.ui;
    let env = match ctx.load_env() {
        Ok(env) => env,
        Err(e) => {
            ui.error(&e.to_string());
            ui.tip("Run 'repomaster deploy' to create the configuration");
            return None;
        }
    };
    let api = env.api_settings();
    match ClientConfig::from_api_settings(&api) {
        Ok(config) => Some((api, OpenAiCompatible::new(config.with_timeout(timeout)))),
        Err(_) => {
            ui.error("Z.ai API key not configured properly");
            ui.line(&format!(
                "   Please set OPENAI_API_KEY in {}",
                ctx.layout.env_file().display()
            ));
            None
        }
    }
}

pub async fn run(ctx: &Context, args: CheckApiArgs) -> anyhow::Result<i32> {
    let ui = &ctx.ui;
    let timeout = Duration::from_secs(args.timeout);
    ui.header("🧪 Z.ai API Integration Test");

    let Some((api, client)) = load_client(ctx, timeout) else {
        return Ok(1);
    };

    ui.success("Configuration loaded:");
    ui.line(&format!(
        "   API Key: {}",
        api.api_key.as_deref().map(mask_api_key).unwrap_or_default()
    ));
    ui.line(&format!("   Base URL: {}", api.base_url));
    ui.line(&format!("   Model: {}", client.model()));

    println!();
    ui.line("🧪 Testing API connection...");
    let outcome = probe_chat(&client).await;
    print_described(ui, describe(&outcome));
    let mut ok = outcome.is_configured();

    if args.search {
        println!();
        ui.line("🔍 Testing search services...");
        let probe = SearchProbe::new(timeout)?;
        let serper = probe.serper(api.serper_api_key.as_deref()).await;
        let jina = probe.jina(api.jina_api_key.as_deref()).await;
        for (name, status) in [("Serper", serper), ("Jina", jina)] {
            ok &= report_service(ui, name, &status);
        }
    }

    Ok(if ok { 0 } else { 1 })
}

fn report_service(ui: &Ui, name: &str, status: &ServiceStatus) -> bool {
    let line = format!("{name}: {status}");
    match status {
        ServiceStatus::Skipped => {
            ui.info(&line);
            true
        }
        ServiceStatus::Ok => {
            ui.success(&line);
            true
        }
        ServiceStatus::Rejected(_) | ServiceStatus::Failed(_) => {
            ui.error(&line);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repomaster_llm::ChatReply;

    #[test]
    fn test_describe_reply() {
        let (level, lines) = describe(&ChatOutcome::Replied(ChatReply {
            content: " Yes, I'm working. ".to_string(),
            model: "glm-4.5".to_string(),
        }));
        assert_eq!(level, Level::Success);
        assert_eq!(lines[1], "   Response: Yes, I'm working.");
    }

    #[test]
    fn test_describe_balance_is_warning() {
        let (level, lines) = describe(&ChatOutcome::InsufficientBalance("1113".to_string()));
        assert_eq!(level, Level::Warning);
        assert!(lines[0].contains("insufficient balance"));
    }

    #[test]
    fn test_describe_failure() {
        let (level, lines) = describe(&ChatOutcome::Failed("timeout after 30000ms".to_string()));
        assert_eq!(level, Level::Error);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_skipped_service_is_not_a_failure() {
        assert!(report_service(&Ui::plain(), "Serper", &ServiceStatus::Skipped));
        assert!(!report_service(&Ui::plain(), "Jina", &ServiceStatus::Rejected(401)));
    }
}
