//! I/O helpers for the launcher workflows.

pub mod config;
pub mod extract;
pub mod output_dir;
pub mod process;
pub mod root;
