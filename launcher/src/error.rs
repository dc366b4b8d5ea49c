//! Typed failure kinds for the launcher workflows.
//!
//! Orchestration code propagates these through `anyhow::Result`; callers that
//! need to branch on the kind use `err.downcast_ref::<LaunchError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error(
        "no project root found above {} (needs miaoma.py, src/ and assets/)",
        start.display()
    )]
    RootNotFound { start: PathBuf },

    #[error("config file not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("config file {} is missing required key {key}", path.display())]
    ConfigKeyMissing { path: PathBuf, key: &'static str },

    #[error("invalid TOOL_MODE value '{value}', must be 1 or 2")]
    InvalidMode { value: String },

    #[error("`{command}` failed ({status})")]
    ProcessFailure { command: String, status: String },

    #[error("{action} {}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}
