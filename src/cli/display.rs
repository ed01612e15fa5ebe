//! Terminal output: colours, status lines and boxes

use std::io::IsTerminal;

use super::encoding;

/// Width of rules and boxes
const WIDTH: usize = 78;

/// ANSI colours used by the launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Magenta, section headers
    Header,
    /// Blue, menu entries
    Blue,
    /// Cyan, prompts and hints
    Cyan,
    /// Green
    Green,
    /// Yellow
    Yellow,
    /// Red
    Red,
    /// Bold
    Bold,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Self::Header => "\x1b[95m",
            Self::Blue => "\x1b[94m",
            Self::Cyan => "\x1b[96m",
            Self::Green => "\x1b[92m",
            Self::Yellow => "\x1b[93m",
            Self::Red => "\x1b[91m",
            Self::Bold => "\x1b[1m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Output settings for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ui {
    /// Replace emoji and box drawing with ASCII
    pub ascii: bool,
    /// Emit ANSI colour codes
    pub color: bool,
}

impl Ui {
    /// Settings for the current terminal
    pub fn detect() -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self {
            ascii: encoding::needs_ascii(),
            color,
        }
    }

    /// Plain output, for tests and pipes
    pub fn plain() -> Self {
        Self {
            ascii: false,
            color: false,
        }
    }

    /// Text as it will be printed
    pub fn render(&self, text: &str) -> String {
        if self.ascii {
            encoding::to_ascii(text)
        } else {
            text.to_string()
        }
    }

    /// Wrap `text` in a colour
    pub fn paint(&self, color: Color, text: &str) -> String {
        let text = self.render(text);
        if self.color {
            format!("{}{}{}", color.code(), text, RESET)
        } else {
            text
        }
    }

    pub fn line(&self, text: &str) {
        println!("{}", self.render(text));
    }

    pub fn colored(&self, color: Color, text: &str) {
        println!("{}", self.paint(color, text));
    }

    pub fn success(&self, message: &str) {
        self.colored(Color::Green, &format!("✅ {message}"));
    }

    pub fn warning(&self, message: &str) {
        self.colored(Color::Yellow, &format!("⚠️  {message}"));
    }

    pub fn error(&self, message: &str) {
        self.colored(Color::Red, &format!("❌ {message}"));
    }

    pub fn info(&self, message: &str) {
        self.colored(Color::Cyan, &format!("ℹ️  {message}"));
    }

    pub fn tip(&self, message: &str) {
        self.colored(Color::Yellow, &format!("💡 {message}"));
    }

    /// `[n/total] title`
    pub fn step(&self, n: usize, total: usize, title: &str) {
        println!();
        self.colored(Color::Bold, &format!("[{n}/{total}] {title}"));
    }

    /// Title between two rules
    pub fn header(&self, title: &str) {
        let rule = "═".repeat(WIDTH);
        println!();
        self.colored(Color::Header, &rule);
        self.colored(Color::Header, &format!("  {title}"));
        self.colored(Color::Header, &rule);
    }

    /// Lines inside a double-line box
    pub fn boxed(&self, lines: &[&str]) -> String {
        let inner = WIDTH - 2;
        let mut out = format!("╔{}╗\n", "═".repeat(inner));
        for line in lines {
            let used = display_width(line) + 2;
            let pad = inner.saturating_sub(used);
            out.push_str(&format!("║  {}{}║\n", line, " ".repeat(pad)));
        }
        out.push_str(&format!("╚{}╝", "═".repeat(inner)));
        self.render(&out)
    }

    /// Launcher banner
    pub fn banner(&self, subtitle: &str) {
        let text = self.boxed(&[
            "",
            "🚀 RepoMaster Interactive Launcher",
            "",
            subtitle,
            "",
        ]);
        println!();
        println!("{}", self.paint(Color::Header, &text));
        println!();
    }
}

/// Columns taken by `text`, counting emoji as two
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c {
            '\u{FE0F}' => 0,
            c if (c as u32) >= 0x1F000 => 2,
            _ => 1,
        })
        .sum()
}
