//! RepoMaster Runtime - the process side of the launcher
//!
//! This crate provides:
//! - Python: interpreter discovery and version checks
//! - Deps: import probes and pip installs
//! - Ports: availability checks with nearby suggestions
//! - Plan: resolved commands for the dashboard and agent modes
//! - Supervisor: waiting on the child and handling interrupts
//! - Signal: Ctrl+C / SIGTERM as a cancellation token

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod deps;
pub mod error;
pub mod plan;
pub mod ports;
pub mod python;
pub mod signal;
pub mod supervisor;

pub use deps::{ImportStatus, InstallOutcome, ModuleProbe};
pub use error::{Result, RuntimeError};
pub use plan::{LaunchPlan, LaunchPlanner};
pub use python::{Interpreter, PythonVersion};
pub use signal::ShutdownListener;
pub use supervisor::ExitOutcome;
