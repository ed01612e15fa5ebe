//! The `configs/.env` configuration file
//!
//! Parsing goes through `dotenvy` so quoting and escapes behave exactly like
//! the loader the Python side uses. Values are kept in a map and handed to
//! child processes explicitly; loading never touches this process's
//! environment. Edits are applied to the raw text so comments and ordering
//! survive a rewrite.

use crate::error::{Error, Result};
use crate::util::mask_api_key;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Variable names understood by the launcher and the agents it starts
pub mod keys {
    /// Provider selector
    pub const DEFAULT_API_PROVIDER: &str = "DEFAULT_API_PROVIDER";
    /// LLM API key (required)
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// LLM model name
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    /// OpenAI-compatible endpoint
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    /// Serper search API key (optional)
    pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
    /// Jina reader API key (optional)
    pub const JINA_API_KEY: &str = "JINA_API_KEY";
}

/// Value written by setup until the user supplies a real key
pub const API_KEY_PLACEHOLDER: &str = "your_zai_api_key_here";

/// Default provider selector
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default model (Z.ai GLM)
pub const DEFAULT_MODEL: &str = "glm-4.5";

/// Default OpenAI-compatible endpoint (Z.ai)
pub const DEFAULT_BASE_URL: &str = "https://api.z.ai/api/paas/v4/";

/// Variables that must appear in a structurally valid file
pub const REQUIRED_VARS: &[&str] = &[keys::OPENAI_API_KEY, keys::OPENAI_MODEL, keys::OPENAI_BASE_URL];

/// State of the required API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Present and not the placeholder
    Configured,
    /// Absent or empty
    Missing,
    /// Still the value written by setup
    Placeholder,
}

impl KeyStatus {
    /// Classify a raw value
    #[must_use]
    pub fn classify(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Missing,
            Some(v) if v == API_KEY_PLACEHOLDER => Self::Placeholder,
            Some(_) => Self::Configured,
        }
    }

    /// True only for [`KeyStatus::Configured`]
    #[must_use]
    pub fn is_configured(self) -> bool {
        self == Self::Configured
    }

    /// Short reason used in messages
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Configured => "configured",
            Self::Missing => "missing",
            Self::Placeholder => "placeholder value",
        }
    }
}

/// A parsed `.env` file
#[derive(Clone)]
pub struct EnvFile {
    path: PathBuf,
    raw: String,
    values: BTreeMap<String, String>,
}

impl EnvFile {
    /// Read and parse the file at `path`
    ///
    /// # Errors
    /// [`Error::ConfigNotFound`] when the file does not exist, otherwise I/O or parse errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(path, raw)
    }

    /// Parse `.env` content that lives (or will live) at `path`
    ///
    /// # Errors
    /// Returns [`Error::EnvParse`] on malformed lines.
    pub fn parse(path: impl Into<PathBuf>, raw: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let raw = raw.into();
        let mut values = BTreeMap::new();

        for item in dotenvy::from_read_iter(raw.as_bytes()) {
            let (key, value) = item.map_err(|e| Error::EnvParse {
                path: path.clone(),
                message: e.to_string(),
            })?;
            values.insert(key, value);
        }

        debug!(path = %path.display(), vars = values.len(), "Parsed env file");
        Ok(Self { path, raw, values })
    }

    /// An empty file that has not been written yet
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            raw: String::new(),
            values: BTreeMap::new(),
        }
    }

    /// Location of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of `key` if set to something non-blank
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Whether `key` is assigned at all (possibly to an empty string)
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All parsed pairs, for passing to child processes
    #[must_use]
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Required variables that are not assigned
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| !self.contains(key))
            .collect()
    }

    /// Status of `OPENAI_API_KEY`
    #[must_use]
    pub fn api_key_status(&self) -> KeyStatus {
        KeyStatus::classify(self.values.get(keys::OPENAI_API_KEY).map(String::as_str))
    }

    /// Fail unless the API key is configured
    ///
    /// # Errors
    /// Returns [`Error::ApiKeyNotConfigured`] for a missing or placeholder key.
    pub fn require_api_key(&self) -> Result<()> {
        let status = self.api_key_status();
        if status.is_configured() {
            Ok(())
        } else {
            Err(Error::ApiKeyNotConfigured {
                key: keys::OPENAI_API_KEY.to_string(),
                reason: status.reason().to_string(),
            })
        }
    }

    /// Typed view of the API-related variables with defaults applied
    #[must_use]
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            provider: self
                .get(keys::DEFAULT_API_PROVIDER)
                .unwrap_or(DEFAULT_PROVIDER)
                .to_string(),
            api_key: self
                .api_key_status()
                .is_configured()
                .then(|| self.get(keys::OPENAI_API_KEY))
                .flatten()
                .map(String::from),
            model: self.get(keys::OPENAI_MODEL).unwrap_or(DEFAULT_MODEL).to_string(),
            base_url: self
                .get(keys::OPENAI_BASE_URL)
                .unwrap_or(DEFAULT_BASE_URL)
                .to_string(),
            serper_api_key: self.get(keys::SERPER_API_KEY).map(String::from),
            jina_api_key: self.get(keys::JINA_API_KEY).map(String::from),
        }
    }

    /// Assign `key`, replacing an existing (or commented-out) line in place
    /// and appending otherwise
    pub fn set(&mut self, key: &str, value: &str) {
        let assignment = format!("{}={}", key, quote_value(value));
        let mut lines: Vec<String> = self.raw.lines().map(String::from).collect();

        let active = lines.iter().position(|l| assigns(l, key));
        let commented = || {
            lines.iter().position(|l| {
                l.trim_start()
                    .strip_prefix('#')
                    .is_some_and(|rest| assigns(rest, key))
            })
        };

        match active.or_else(commented) {
            Some(idx) => lines[idx] = assignment,
            None => lines.push(assignment),
        }

        let mut raw = lines.join("\n");
        raw.push('\n');
        self.raw = raw;
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Current file content
    #[must_use]
    pub fn render(&self) -> &str {
        &self.raw
    }

    /// Write the file, creating `configs/` if needed
    ///
    /// # Errors
    /// Returns an I/O error if the directory or file cannot be written.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&self.path, &self.raw).map_err(|e| Error::io(&self.path, e))
    }
}

impl fmt::Debug for EnvFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvFile")
            .field("path", &self.path)
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Whether `line` assigns `key` (`KEY=`, `KEY =`, or `export KEY=`)
fn assigns(line: &str, key: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").unwrap_or(line);
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$'));
    if !needs_quotes {
        return value.to_string();
    }
    // single quotes are literal in dotenv syntax
    if !value.contains('\'') && !value.is_empty() {
        return format!("'{}'", value);
    }
    // double quotes expand `$NAME`, so `$` is escaped too
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{}\"", escaped)
}

/// API-related settings resolved from the env file
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Provider selector (`openai`)
    pub provider: String,
    /// Configured API key, `None` when missing or placeholder
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// OpenAI-compatible endpoint
    pub base_url: String,
    /// Serper key, if any
    pub serper_api_key: Option<String>,
    /// Jina key, if any
    pub jina_api_key: Option<String>,
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |k: &Option<String>| k.as_deref().map(mask_api_key);
        f.debug_struct("ApiSettings")
            .field("provider", &self.provider)
            .field("api_key", &masked(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("serper_api_key", &masked(&self.serper_api_key))
            .field("jina_api_key", &masked(&self.jina_api_key))
            .finish()
    }
}

/// Content for a freshly created `.env`
#[derive(Debug, Clone)]
pub struct EnvTemplate {
    /// Provider selector
    pub provider: String,
    /// API key, the placeholder when not supplied
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Endpoint
    pub base_url: String,
    /// Optional Serper key
    pub serper_api_key: Option<String>,
    /// Optional Jina key
    pub jina_api_key: Option<String>,
}

impl Default for EnvTemplate {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: API_KEY_PLACEHOLDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            serper_api_key: None,
            jina_api_key: None,
        }
    }
}

impl EnvTemplate {
    /// Render the file body
    #[must_use]
    pub fn render(&self) -> String {
        let mut content = String::from("# RepoMaster Environment Variables\n\n");

        content.push_str("# ===================\n");
        content.push_str("# LLM API (OpenAI-compatible, Z.ai by default)\n");
        content.push_str("# ===================\n");
        content.push_str(&format!("{}={}\n", keys::DEFAULT_API_PROVIDER, self.provider));
        content.push_str(&format!("{}={}\n", keys::OPENAI_API_KEY, quote_value(&self.api_key)));
        content.push_str(&format!("{}={}\n", keys::OPENAI_MODEL, self.model));
        content.push_str(&format!("{}={}\n", keys::OPENAI_BASE_URL, self.base_url));

        content.push_str("\n# ===================\n");
        content.push_str("# Search & document APIs (optional)\n");
        content.push_str("# ===================\n");
        match &self.serper_api_key {
            Some(key) => content.push_str(&format!("{}={}\n", keys::SERPER_API_KEY, quote_value(key))),
            None => content.push_str(&format!("# {}=your_serper_api_key\n", keys::SERPER_API_KEY)),
        }
        match &self.jina_api_key {
            Some(key) => content.push_str(&format!("{}={}\n", keys::JINA_API_KEY, quote_value(key))),
            None => content.push_str(&format!("# {}=your_jina_api_key\n", keys::JINA_API_KEY)),
        }

        content
    }

    /// Parse the rendered template as an [`EnvFile`] located at `path`
    ///
    /// # Errors
    /// Only fails if a supplied value breaks dotenv syntax.
    pub fn into_env_file(self, path: impl Into<PathBuf>) -> Result<EnvFile> {
        EnvFile::parse(path, self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> EnvFile {
        EnvFile::parse("configs/.env", content).unwrap()
    }

    #[test]
    fn test_configured_key() {
        let env = parse("OPENAI_API_KEY=abc123.realkey\nOPENAI_MODEL=glm-4.5\n");
        assert_eq!(env.api_key_status(), KeyStatus::Configured);
        assert!(env.require_api_key().is_ok());
    }

    #[test]
    fn test_placeholder_key_not_configured() {
        let env = parse("OPENAI_API_KEY=your_zai_api_key_here\n");
        assert_eq!(env.api_key_status(), KeyStatus::Placeholder);
        let err = env.require_api_key().unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_absent_or_empty_key_not_configured() {
        assert_eq!(parse("OPENAI_MODEL=glm-4.5\n").api_key_status(), KeyStatus::Missing);
        assert_eq!(parse("OPENAI_API_KEY=\n").api_key_status(), KeyStatus::Missing);
        assert_eq!(parse("OPENAI_API_KEY=\"   \"\n").api_key_status(), KeyStatus::Missing);
    }

    #[test]
    fn test_missing_required_vars() {
        let env = parse("OPENAI_API_KEY=x\n# OPENAI_MODEL=glm-4.5\n");
        assert_eq!(env.missing_required(), vec!["OPENAI_MODEL", "OPENAI_BASE_URL"]);
    }

    #[test]
    fn test_api_settings_defaults() {
        let env = parse("OPENAI_API_KEY=your_zai_api_key_here\n");
        let api = env.api_settings();
        assert_eq!(api.provider, "openai");
        assert!(api.api_key.is_none());
        assert_eq!(api.model, DEFAULT_MODEL);
        assert_eq!(api.base_url, DEFAULT_BASE_URL);
        assert!(api.serper_api_key.is_none());
    }

    #[test]
    fn test_api_settings_debug_masks_keys() {
        let env = parse("OPENAI_API_KEY=sk-1234567890abcdefghij\nJINA_API_KEY=jina_abcdefghijkl\n");
        let debug = format!("{:?}", env.api_settings());
        assert!(!debug.contains("1234567890abcdef"));
        assert!(debug.contains("sk-1...ghij"));
        assert!(!debug.contains("abcdefgh"));
    }

    #[test]
    fn test_set_replaces_in_place_and_keeps_comments() {
        let mut env = parse("# header\nOPENAI_API_KEY=your_zai_api_key_here\nOPENAI_MODEL=glm-4.5\n");
        env.set("OPENAI_API_KEY", "real.key");
        assert_eq!(
            env.render(),
            "# header\nOPENAI_API_KEY=real.key\nOPENAI_MODEL=glm-4.5\n"
        );
        assert_eq!(env.api_key_status(), KeyStatus::Configured);
    }

    #[test]
    fn test_set_uncomments_then_appends() {
        let mut env = parse("# SERPER_API_KEY=your_serper_api_key\n");
        env.set("SERPER_API_KEY", "serper-1");
        env.set("JINA_API_KEY", "jina 2");
        assert_eq!(env.render(), "SERPER_API_KEY=serper-1\nJINA_API_KEY='jina 2'\n");

        let reparsed = parse(env.render());
        assert_eq!(reparsed.get("JINA_API_KEY"), Some("jina 2"));
    }

    #[test]
    fn test_set_value_with_quote_and_dollar_survives_reload() {
        let mut env = parse("OPENAI_API_KEY=old\n");
        env.set("OPENAI_API_KEY", "it's$HOME\\x");
        assert_eq!(env.render(), "OPENAI_API_KEY=\"it's\\$HOME\\\\x\"\n");

        let reparsed = parse(env.render());
        assert_eq!(reparsed.get("OPENAI_API_KEY"), Some("it's$HOME\\x"));
    }

    #[test]
    fn test_set_does_not_match_key_prefix() {
        let mut env = parse("OPENAI_API_KEY_BACKUP=old\n");
        env.set("OPENAI_API_KEY", "new");
        assert!(env.render().contains("OPENAI_API_KEY_BACKUP=old"));
        assert!(env.render().contains("OPENAI_API_KEY=new"));
    }

    #[test]
    fn test_template_round_trip() {
        let env = EnvTemplate::default().into_env_file("configs/.env").unwrap();
        assert_eq!(env.api_key_status(), KeyStatus::Placeholder);
        assert!(env.missing_required().is_empty());
        assert!(!env.contains("SERPER_API_KEY"));

        let env = EnvTemplate {
            api_key: "zai.key.value".into(),
            jina_api_key: Some("jina_key".into()),
            ..EnvTemplate::default()
        }
        .into_env_file("configs/.env")
        .unwrap();
        assert!(env.api_key_status().is_configured());
        assert_eq!(env.get("JINA_API_KEY"), Some("jina_key"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = EnvFile::load(temp.path().join("configs/.env")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("configs/.env");
        let mut env = EnvFile::empty(&path);
        env.set("OPENAI_API_KEY", "k");
        env.save().unwrap();

        let loaded = EnvFile::load(&path).unwrap();
        assert_eq!(loaded.get("OPENAI_API_KEY"), Some("k"));
    }
}
