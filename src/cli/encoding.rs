//! ASCII fallback for terminals that cannot render UTF-8
//!
//! Emoji and box-drawing characters map to short ASCII tokens; anything
//! else outside ASCII becomes `?`.

/// Forces ASCII output when set to `1` or `true`
pub const ASCII_ENV: &str = "REPOMASTER_ASCII";

const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];

const VARIATION_SELECTOR: char = '\u{FE0F}';

fn replacement(c: char) -> Option<&'static str> {
    let text = match c {
        '✅' => "[OK]",
        '❌' => "[ERROR]",
        '⚠' => "[WARNING]",
        'ℹ' => "[INFO]",
        '💡' => "[TIP]",
        '🚀' => "[LAUNCH]",
        '🔄' => "[REFRESH]",
        '⭐' => "*",
        '📝' => "[NOTE]",
        '🎯' => "[TARGET]",
        '🌐' => "[WEB]",
        '🤖' => "[AI]",
        '🔍' => "[SEARCH]",
        '💻' => "[CODE]",
        '📁' => "[FOLDER]",
        '🏥' => "[HEALTH]",
        '❓' => "?",
        '⚙' => "[CONFIG]",
        '🚪' => "[EXIT]",
        '🔑' => "[KEY]",
        '📊' => "[CHART]",
        '🔧' => "[TOOL]",
        '📦' => "[PACKAGE]",
        '🎉' => "[SUCCESS]",
        '💥' => "[CRITICAL]",
        '🧪' => "[TEST]",
        '📋' => "[LIST]",
        '🐍' => "[PYTHON]",
        '👋' => "[BYE]",
        '📖' => "[HELP]",
        '🧠' => "[MODEL]",
        '🔌' => "[PORT]",
        '═' | '━' => "=",
        '║' | '│' => "|",
        '╔' | '╗' | '╚' | '╝' => "+",
        '─' => "-",
        '█' => "#",
        '•' => "*",
        '→' => "->",
        _ => return None,
    };
    Some(text)
}

/// Replace everything outside ASCII
#[must_use]
pub fn to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == VARIATION_SELECTOR {
            continue;
        }
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(replacement(c).unwrap_or("?"));
        }
    }
    out
}

/// Whether output should be ASCII for the current process environment
#[must_use]
pub fn needs_ascii() -> bool {
    needs_ascii_from(|key| std::env::var(key).ok())
}

/// Decide from `lookup`: the override wins, then the first non-empty
/// locale variable must name UTF-8
pub fn needs_ascii_from(lookup: impl Fn(&str) -> Option<String>) -> bool {
    if let Some(flag) = lookup(ASCII_ENV) {
        let flag = flag.trim().to_ascii_lowercase();
        if flag == "1" || flag == "true" {
            return true;
        }
    }

    LOCALE_VARS
        .into_iter()
        .filter_map(&lookup)
        .find(|v| !v.trim().is_empty())
        .is_some_and(|locale| {
            let locale = locale.to_ascii_lowercase();
            !(locale.contains("utf-8") || locale.contains("utf8"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_status_emoji() {
        assert_eq!(to_ascii("✅ Ready"), "[OK] Ready");
        assert_eq!(to_ascii("⚠️  Port busy"), "[WARNING]  Port busy");
        assert_eq!(to_ascii("ℹ️ note"), "[INFO] note");
    }

    #[test]
    fn test_box_drawing() {
        assert_eq!(to_ascii("╔══╗"), "+==+");
        assert_eq!(to_ascii("║ a → b ║"), "| a -> b |");
    }

    #[test]
    fn test_unknown_becomes_question_mark() {
        assert_eq!(to_ascii("余额 ok"), "?? ok");
    }

    #[test]
    fn test_override_forces_ascii() {
        assert!(needs_ascii_from(lookup(&[
            (ASCII_ENV, "1"),
            ("LANG", "en_US.UTF-8")
        ])));
    }

    #[test]
    fn test_locale_detection() {
        assert!(!needs_ascii_from(lookup(&[("LANG", "en_US.UTF-8")])));
        assert!(!needs_ascii_from(lookup(&[("LC_ALL", "C.utf8")])));
        assert!(needs_ascii_from(lookup(&[("LANG", "C")])));
        assert!(needs_ascii_from(lookup(&[
            ("LC_ALL", "POSIX"),
            ("LANG", "en_US.UTF-8")
        ])));
        // unset locale means the terminal decides
        assert!(!needs_ascii_from(lookup(&[])));
    }
}
