//! Stable exit codes for launcher CLI commands.

/// Workflow completed.
pub const OK: i32 = 0;
/// Any fatal error: missing root, missing/invalid config, invalid mode,
/// tool failure, or filesystem error.
pub const FAILURE: i32 = 1;
