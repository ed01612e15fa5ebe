//! Child process supervision
//!
//! Waits for the launched child and handles interrupts: the child gets a
//! grace period to exit on its own (it receives the terminal's SIGINT too),
//! after which it is killed.

use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::plan::LaunchPlan;

/// Exit code reported when the child was stopped by an interrupt
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// How the child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Child exited by itself; `None` when it died from a signal
    Exited {
        /// Exit code
        code: Option<i32>,
    },
    /// Interrupt received and the child stopped within the grace period
    Interrupted {
        /// Exit code, if the child reported one
        code: Option<i32>,
    },
    /// Interrupt received and the child was killed after the grace period
    Killed,
}

impl ExitOutcome {
    fn from_status(status: ExitStatus) -> Self {
        Self::Exited {
            code: status.code(),
        }
    }

    /// Whether the child stopped normally
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0) })
    }

    /// Code the launcher should exit with
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited { code: Some(code) } => *code,
            Self::Exited { code: None } => 1,
            Self::Interrupted { .. } | Self::Killed => INTERRUPTED_EXIT_CODE,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code: Some(0) } => f.write_str("stopped normally"),
            Self::Exited { code: Some(code) } => write!(f, "stopped with exit code {code}"),
            Self::Exited { code: None } => f.write_str("terminated by a signal"),
            Self::Interrupted { .. } => f.write_str("stopped by user interrupt"),
            Self::Killed => f.write_str("killed after the grace period expired"),
        }
    }
}

/// Wait for `child`, handling interrupts signalled through `shutdown`
///
/// # Errors
/// Returns an I/O error if waiting on or killing the child fails.
pub async fn supervise(
    mut child: Child,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<ExitOutcome> {
    tokio::select! {
        status = child.wait() => Ok(ExitOutcome::from_status(status?)),
        _ = shutdown.cancelled() => {
            info!(grace_secs = grace.as_secs(), "Interrupt received, waiting for child to exit");
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => Ok(ExitOutcome::Interrupted { code: status?.code() }),
                Err(_) => {
                    warn!("Child did not exit within the grace period, killing it");
                    child.kill().await?;
                    Ok(ExitOutcome::Killed)
                }
            }
        }
    }
}

/// Spawn `plan` and supervise it to completion
///
/// # Errors
/// Spawn failures and I/O errors while supervising.
pub async fn run(plan: &LaunchPlan, shutdown: CancellationToken, grace: Duration) -> Result<ExitOutcome> {
    let child = plan.spawn()?;
    let outcome = supervise(child, shutdown, grace).await?;
    info!(label = %plan.label, %outcome, "Child process finished");
    Ok(outcome)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    async fn test_exit_code_is_propagated() {
        let child = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
        let outcome = supervise(child, CancellationToken::new(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, ExitOutcome::Exited { code: Some(3) });
        assert_eq!(outcome.exit_code(), 3);
        assert!(!outcome.success());
    }

    #[tokio::test]
    async fn test_interrupt_kills_after_grace() {
        let child = Command::new("sleep").arg("30").kill_on_drop(true).spawn().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = supervise(child, token, Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Killed);
        assert_eq!(outcome.exit_code(), INTERRUPTED_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_interrupt_with_cooperative_child() {
        let child = Command::new("sh").args(["-c", "sleep 0.1"]).spawn().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = supervise(child, token, Duration::from_secs(5)).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Interrupted { code: Some(0) });
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(ExitOutcome::Exited { code: Some(0) }.to_string(), "stopped normally");
        assert_eq!(
            ExitOutcome::Exited { code: Some(2) }.to_string(),
            "stopped with exit code 2"
        );
        assert!(ExitOutcome::Exited { code: Some(0) }.success());
    }

    #[test]
    fn test_run_reports_spawn_failure() {
        let plan = LaunchPlan {
            label: "missing".to_string(),
            program: "/nonexistent/python-xyz".into(),
            args: vec![],
            cwd: std::env::temp_dir(),
            env: Default::default(),
        };
        let err = tokio_test::block_on(run(&plan, CancellationToken::new(), Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(err, crate::error::RuntimeError::Spawn { .. }));
    }
}
