//! RepoMaster Core - configuration and launch model
//!
//! This crate provides the data side of the launcher:
//! - Env: the `configs/.env` key/value file (load, validate, edit)
//! - Layout: where project files live relative to the root
//! - Mode: frontend and backend launch modes
//! - Settings: layered launcher settings (embedded defaults, file, environment)
//! - Streamlit: the `.streamlit/config.toml` written during setup
//! - Report: validation check results and the overall verdict

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod layout;
pub mod loader;
pub mod mode;
pub mod report;
pub mod settings;
pub mod streamlit;
pub mod util;

pub use env::{ApiSettings, EnvFile, EnvTemplate, KeyStatus};
pub use error::{Error, Result};
pub use layout::ProjectLayout;
pub use loader::{load_settings, load_settings_with_env};
pub use mode::{BackendMode, LaunchMode};
pub use report::{CheckResult, CheckStatus, Fix, ValidationReport, Verdict};
pub use settings::{
    BackendSettings, DependencySettings, DependencySpec, FrontendSettings, LauncherSettings, PythonSettings,
    SupervisorSettings,
};
pub use streamlit::StreamlitConfig;
pub use util::mask_api_key;
