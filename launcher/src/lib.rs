//! Configuration-driven front-ends for the `miaoma.py` code-generation tool.
//!
//! Both workflows locate the project root, read `tools/project.ini`, build an
//! invocation of the external tool, and run it as a child process. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (settings parsing, command
//!   building, marker parsing). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (root discovery, config files,
//!   process execution, log scraping, output directories).
//!
//! Orchestration modules ([`generate`], [`dump`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod core;
pub mod dump;
pub mod error;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
