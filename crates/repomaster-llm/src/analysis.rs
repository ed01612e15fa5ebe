//! Repository self-analysis
//!
//! Scans a directory for source files and asks the model for a short
//! project summary.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::client::{ChatBackend, ChatRequest};
use crate::error::{Error, Result};
use crate::probe::ChatOutcome;

/// System prompt for the analysis request
pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are an expert code analyst. Analyze the repository structure and provide insights.";

/// Token limit for the analysis reply
pub const ANALYSIS_MAX_TOKENS: u32 = 200;

/// Sampling temperature for the analysis request
pub const ANALYSIS_TEMPERATURE: f32 = 0.7;

/// Number of file paths listed in the prompt
pub const LISTED_FILES: usize = 10;

/// Source files found under a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    /// Directory that was scanned
    pub root: PathBuf,
    /// Extension matched, without the dot
    pub extension: String,
    /// Matching files relative to `root`, sorted
    pub files: Vec<PathBuf>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

impl RepoSummary {
    /// Walk `root` for `*.<extension>` files, skipping hidden paths
    ///
    /// # Errors
    /// [`Error::Scan`] when `root` is not a readable directory.
    pub fn scan(root: &Path, extension: &str) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Scan(format!("{} is not a directory", root.display())));
        }
        let extension = extension.trim_start_matches('.').to_string();

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|x| x.to_str())
                    .is_some_and(|x| x == extension)
            })
            .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        files.sort();

        debug!(root = %root.display(), count = files.len(), "Scanned repository");
        Ok(Self {
            root: root.to_path_buf(),
            extension,
            files,
        })
    }

    /// Number of matching files
    #[must_use]
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Summary text sent to the model
    #[must_use]
    pub fn render(&self) -> String {
        let project = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repository");
        let listed: Vec<String> = self
            .files
            .iter()
            .take(LISTED_FILES)
            .map(|p| p.display().to_string())
            .collect();

        let mut text = format!("Repository analysis for {project}:\n\n");
        text.push_str(&format!("{} files found: {}\n", self.extension, self.count()));
        text.push_str(&format!("Key components: {}\n", listed.join(", ")));
        if self.count() > LISTED_FILES {
            text.push_str(&format!("(and {} more)\n", self.count() - LISTED_FILES));
        }
        text
    }

    /// Chat request asking for a brief project summary
    #[must_use]
    pub fn request(&self) -> ChatRequest {
        ChatRequest::user(
            format!(
                "Please analyze this repository structure and provide a brief summary of what this project does:\n\n{}",
                self.render()
            ),
            ANALYSIS_MAX_TOKENS,
        )
        .with_system(ANALYST_SYSTEM_PROMPT)
        .with_temperature(ANALYSIS_TEMPERATURE)
    }
}

/// Ask `backend` to summarize the scanned repository
pub async fn analyze(backend: &dyn ChatBackend, summary: &RepoSummary) -> ChatOutcome {
    ChatOutcome::from_result(backend.complete(summary.request()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChatReply, MockChatBackend};
    use crate::error::ApiErrorKind;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src/frontend")).unwrap();
        std::fs::create_dir_all(root.join(".venv/lib")).unwrap();
        std::fs::write(root.join("launcher.py"), "").unwrap();
        std::fs::write(root.join("src/frontend/app.py"), "").unwrap();
        std::fs::write(root.join("src/readme.md"), "").unwrap();
        std::fs::write(root.join(".venv/lib/site.py"), "").unwrap();
        std::fs::write(root.join(".hidden.py"), "").unwrap();
        temp
    }

    #[test]
    fn test_scan_skips_hidden_and_other_extensions() {
        let temp = fixture();
        let summary = RepoSummary::scan(temp.path(), "py").unwrap();
        assert_eq!(
            summary.files,
            vec![PathBuf::from("launcher.py"), PathBuf::from("src/frontend/app.py")]
        );
    }

    #[test]
    fn test_scan_rejects_file_root() {
        let temp = fixture();
        let err = RepoSummary::scan(&temp.path().join("launcher.py"), "py").unwrap_err();
        assert!(matches!(err, Error::Scan(_)));
    }

    #[test]
    fn test_render_limits_listing() {
        let summary = RepoSummary {
            root: PathBuf::from("/work/RepoMaster"),
            extension: "py".to_string(),
            files: (0..12).map(|i| PathBuf::from(format!("m{i:02}.py"))).collect(),
        };
        let text = summary.render();
        assert!(text.contains("Repository analysis for RepoMaster"));
        assert!(text.contains("py files found: 12"));
        assert!(text.contains("m09.py"));
        assert!(!text.contains("m10.py"));
        assert!(text.contains("(and 2 more)"));
    }

    #[tokio::test]
    async fn test_analyze_uses_analyst_prompt() {
        let temp = fixture();
        let summary = RepoSummary::scan(temp.path(), ".py").unwrap();

        let mut mock = MockChatBackend::new();
        mock.expect_complete()
            .withf(|req| {
                req.system.as_deref() == Some(ANALYST_SYSTEM_PROMPT)
                    && req.max_tokens == ANALYSIS_MAX_TOKENS
                    && req.temperature == Some(ANALYSIS_TEMPERATURE)
            })
            .returning(|_| {
                Ok(ChatReply {
                    content: "A launcher.".to_string(),
                    model: "glm-4.5".to_string(),
                })
            });
        assert!(matches!(analyze(&mock, &summary).await, ChatOutcome::Replied(_)));
    }

    #[tokio::test]
    async fn test_analyze_unfunded_is_configured() {
        let summary = RepoSummary {
            root: PathBuf::from("/work/RepoMaster"),
            extension: "py".to_string(),
            files: vec![],
        };
        let mut mock = MockChatBackend::new();
        mock.expect_complete().returning(|_| {
            Err(Error::Api {
                kind: ApiErrorKind::InsufficientBalance,
                message: "code 1113".to_string(),
            })
        });
        let outcome = analyze(&mock, &summary).await;
        assert!(matches!(outcome, ChatOutcome::InsufficientBalance(_)));
        assert!(outcome.is_configured());
    }
}
