//! Validation report types
//!
//! Checks produce [`CheckResult`]s; a [`ValidationReport`] aggregates them
//! into a success rate and a [`Verdict`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Check succeeded
    Pass,
    /// Works, but something should be looked at
    Warn,
    /// Check failed
    Fail,
}

impl CheckStatus {
    /// Status label used in terminal output
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

/// Remediation for a failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fix {
    /// Install the listed packages with pip
    PipInstall {
        /// Package names as given to pip
        packages: Vec<String>,
    },
    /// Copy a file into place
    CopyFile {
        /// Source file
        from: PathBuf,
        /// Destination
        to: PathBuf,
    },
    /// Something the user has to do by hand
    Manual {
        /// What to do
        hint: String,
    },
}

impl Fix {
    /// pip install of the given packages
    pub fn pip<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PipInstall {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// Manual instruction
    pub fn manual(hint: impl Into<String>) -> Self {
        Self::Manual { hint: hint.into() }
    }

    /// Whether the launcher can apply this fix itself
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Self::Manual { .. })
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PipInstall { packages } => write!(f, "pip install {}", packages.join(" ")),
            Self::CopyFile { from, to } => {
                write!(f, "cp {} {}", from.display(), to.display())
            }
            Self::Manual { hint } => f.write_str(hint),
        }
    }
}

/// Result of one validation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Outcome
    pub status: CheckStatus,
    /// Detail shown to the user
    pub message: String,
    /// Suggested remediation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl CheckResult {
    /// Passing check
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Pass,
            message: message.into(),
            fix: None,
        }
    }

    /// Warning
    pub fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warn,
            message: message.into(),
            fix: None,
        }
    }

    /// Failed check
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Fail,
            message: message.into(),
            fix: None,
        }
    }

    /// Attach a fix
    #[must_use]
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Whether the check passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Overall readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Success rate of 90% or more
    Ready,
    /// Success rate of 70% or more
    MostlyReady,
    /// Anything below
    NeedsAttention,
}

impl Verdict {
    /// Verdict for a success rate in percent
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 90.0 {
            Self::Ready
        } else if rate >= 70.0 {
            Self::MostlyReady
        } else {
            Self::NeedsAttention
        }
    }

    /// Whether the command should exit successfully
    #[must_use]
    pub fn is_success(self) -> bool {
        !matches!(self, Self::NeedsAttention)
    }

    /// Summary line
    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::Ready => "RepoMaster is ready to use!",
            Self::MostlyReady => "RepoMaster is mostly ready, a few optional items need attention",
            Self::NeedsAttention => "RepoMaster setup needs attention",
        }
    }
}

/// Ordered collection of check results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Results in the order the checks ran
    pub results: Vec<CheckResult>,
}

impl ValidationReport {
    /// Empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result
    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// Record several results
    pub fn extend(&mut self, results: impl IntoIterator<Item = CheckResult>) {
        self.results.extend(results);
    }

    /// Number of passing checks
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Number of checks with the given status
    #[must_use]
    pub fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Total number of checks
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Passed over total in percent; 0 for an empty report
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64 * 100.0
    }

    /// Verdict for the current success rate
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        Verdict::from_rate(self.success_rate())
    }

    /// Results that are not passing and carry a fix
    pub fn fixes(&self) -> impl Iterator<Item = (&CheckResult, &Fix)> {
        self.results
            .iter()
            .filter(|r| !r.passed())
            .filter_map(|r| r.fix.as_ref().map(|f| (r, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(pass: usize, fail: usize) -> ValidationReport {
        let mut report = ValidationReport::new();
        for i in 0..pass {
            report.push(CheckResult::pass(format!("ok-{i}"), "fine"));
        }
        for i in 0..fail {
            report.push(CheckResult::fail(format!("bad-{i}"), "broken"));
        }
        report
    }

    #[test]
    fn test_empty_report_is_zero() {
        let report = ValidationReport::new();
        assert_eq!(report.success_rate(), 0.0);
        assert_eq!(report.verdict(), Verdict::NeedsAttention);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(report_with(9, 1).verdict(), Verdict::Ready);
        assert_eq!(report_with(7, 3).verdict(), Verdict::MostlyReady);
        assert_eq!(report_with(6, 4).verdict(), Verdict::NeedsAttention);
        assert!(Verdict::MostlyReady.is_success());
        assert!(!Verdict::NeedsAttention.is_success());
    }

    #[test]
    fn test_warnings_do_not_count_as_passed() {
        let mut report = report_with(1, 0);
        report.push(CheckResult::warn("venv", "not in a virtual environment"));
        assert_eq!(report.passed(), 1);
        assert_eq!(report.count(CheckStatus::Warn), 1);
        assert_eq!(report.success_rate(), 50.0);
    }

    #[test]
    fn test_fix_display() {
        assert_eq!(Fix::pip(["pandas", "plotly"]).to_string(), "pip install pandas plotly");
        let copy = Fix::CopyFile {
            from: PathBuf::from("configs/env.example"),
            to: PathBuf::from("configs/.env"),
        };
        assert_eq!(copy.to_string(), "cp configs/env.example configs/.env");
        assert!(copy.is_automatic());
        assert!(!Fix::manual("set OPENAI_API_KEY").is_automatic());
    }

    #[test]
    fn test_fixes_skip_passing_results() {
        let mut report = ValidationReport::new();
        report.push(CheckResult::pass("a", "ok").with_fix(Fix::pip(["x"])));
        report.push(CheckResult::fail("b", "missing").with_fix(Fix::pip(["y"])));
        report.push(CheckResult::fail("c", "missing"));
        let fixes: Vec<_> = report.fixes().map(|(r, _)| r.name.as_str()).collect();
        assert_eq!(fixes, vec!["b"]);
    }

    #[test]
    fn test_json_shape() {
        let result = CheckResult::fail("pandas", "No module named 'pandas'")
            .with_fix(Fix::pip(["pandas"]));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["fix"]["kind"], "pip_install");
        assert_eq!(json["fix"]["packages"][0], "pandas");
    }
}
