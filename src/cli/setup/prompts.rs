//! Prompt helpers with inquire → stdin fallback.
//!
//! When `inquire` cannot drive the terminal (not a TTY, piped input) every
//! prompt falls back to plain stdin. Ctrl+C, Esc and end of input all
//! surface as [`Cancelled`].

use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Text};
use std::io::{self, BufRead, Write};

/// The user cancelled a prompt or stdin closed
#[derive(Debug, thiserror::Error)]
#[error("Cancelled")]
pub struct Cancelled;

/// Whether `err` is a cancelled prompt
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.is::<Cancelled>()
}

fn cancelled(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Read a trimmed line from stdin; end of input is a cancellation.
fn read_line() -> anyhow::Result<String> {
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;
    if read == 0 {
        return Err(Cancelled.into());
    }
    Ok(input.trim().to_string())
}

fn ask(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    read_line()
}

/// Confirm prompt with fallback.
pub fn confirm(message: &str, default: bool, help: Option<&str>) -> anyhow::Result<bool> {
    let mut builder = Confirm::new(message).with_default(default);
    if let Some(h) = help {
        builder = builder.with_help_message(h);
    }
    match builder.prompt() {
        Ok(v) => Ok(v),
        Err(e) if cancelled(&e) => Err(Cancelled.into()),
        Err(_) => {
            let hint = if default { "Y/n" } else { "y/N" };
            if let Some(h) = help {
                println!("  {}", h);
            }
            let input = ask(&format!("? {} ({}) ", message, hint))?;
            Ok(parse_yes_no(&input, default))
        }
    }
}

fn parse_yes_no(input: &str, default: bool) -> bool {
    match input.to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

/// Masked prompt; empty input is allowed.
pub fn password(message: &str) -> anyhow::Result<String> {
    match Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
    {
        Ok(v) => Ok(v.trim().to_string()),
        Err(e) if cancelled(&e) => Err(Cancelled.into()),
        Err(_) => ask(&format!("  {} ", message)),
    }
}

/// Masked prompt that repeats until something is entered.
pub fn password_required(message: &str) -> anyhow::Result<String> {
    match Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(inquire::required!())
        .prompt()
    {
        Ok(v) => Ok(v.trim().to_string()),
        Err(e) if cancelled(&e) => Err(Cancelled.into()),
        Err(_) => loop {
            let input = ask(&format!("  {} ", message))?;
            if !input.is_empty() {
                return Ok(input);
            }
            println!("  (required)");
        },
    }
}

/// Free text; empty input takes `default`.
pub fn text(message: &str, default: Option<&str>) -> anyhow::Result<String> {
    let mut builder = Text::new(message);
    if let Some(d) = default {
        builder = builder.with_default(d);
    }
    match builder.prompt() {
        Ok(v) => Ok(v.trim().to_string()),
        Err(e) if cancelled(&e) => Err(Cancelled.into()),
        Err(_) => {
            let prompt = match default {
                Some(d) => format!("  {} [{}] ", message, d),
                None => format!("  {} ", message),
            };
            let input = ask(&prompt)?;
            Ok(match default {
                Some(d) if input.is_empty() => d.to_string(),
                _ => input,
            })
        }
    }
}

/// Wait for Enter.
pub fn pause(message: &str) -> anyhow::Result<()> {
    ask(&format!("\n{} ", message)).map(|_| ())
}
