//! Argument vectors for the external `miaoma.py` tool.
//!
//! Builders are pure: they read validated [`Settings`] plus caller options and
//! return an immutable [`CommandSpec`]. Flag order is fixed so rendered command
//! lines are reproducible in logs.

use std::fmt;

use crate::core::settings::{Required, SettingKey, Settings};
use crate::error::LaunchError;

/// Interpreter and entry point for the external tool.
pub const TOOL_PROGRAM: [&str; 2] = ["python3", "miaoma.py"];

/// Table dumped when the caller names none.
pub const DEFAULT_TABLE: &str = "t_merchant_store";

/// Settings the dump workflow cannot run without.
pub const DUMP_REQUIRED: &[Required] = &[Required::non_empty(SettingKey::ProjectPath)];

/// Settings the gen workflow cannot run without (both tool modes). Only
/// presence is checked; blank values are passed through to the tool.
pub const GEN_REQUIRED: &[Required] = &[
    Required::present(SettingKey::ProjectPath),
    Required::present(SettingKey::DatabaseFile),
];

/// Ordered, immutable token sequence for one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    tokens: Vec<String>,
}

impl CommandSpec {
    /// Build from raw tokens. The first token is the program.
    ///
    /// Returns `None` for an empty token list.
    #[cfg(test)]
    pub(crate) fn new<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            return None;
        }
        Some(Self { tokens })
    }

    fn tool(subcommand: &str) -> Self {
        let mut tokens: Vec<String> = TOOL_PROGRAM.iter().map(|s| s.to_string()).collect();
        tokens.push(subcommand.to_string());
        Self { tokens }
    }

    fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    fn push_flag(&mut self, flag: &str, value: impl Into<String>) {
        self.push(flag);
        self.push(value);
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// `--format` values accepted by `dump-table-meta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DumpFormat {
    Flat,
    Json,
}

impl DumpFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DumpFormat::Flat => "flat",
            DumpFormat::Json => "json",
        }
    }
}

/// Caller options for the dump workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Table to dump; [`DEFAULT_TABLE`] when `None` or empty.
    pub table: Option<String>,
    pub format: Option<DumpFormat>,
    pub filter_prefix: Option<String>,
    pub filter_include: Option<String>,
    pub filter_exclude: Option<String>,
    pub no_derived: bool,
    pub verbose: bool,
}

impl DumpOptions {
    pub fn table(&self) -> &str {
        match self.table.as_deref() {
            Some(table) if !table.is_empty() => table,
            _ => DEFAULT_TABLE,
        }
    }
}

/// Generation sub-command selected by `TOOL_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// `gen-code` driven by a single database file.
    SingleFile,
    /// `gen-project` driven by a database directory.
    Project,
}

impl ToolMode {
    pub fn parse(value: &str) -> Result<Self, LaunchError> {
        match value {
            "1" => Ok(ToolMode::SingleFile),
            "2" => Ok(ToolMode::Project),
            other => Err(LaunchError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }

    pub fn subcommand(self) -> &'static str {
        match self {
            ToolMode::SingleFile => "gen-code",
            ToolMode::Project => "gen-project",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ToolMode::SingleFile => "single-file mode",
            ToolMode::Project => "project mode",
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// `dump-table-meta` invocation.
pub fn build_dump_command(settings: &Settings, options: &DumpOptions) -> CommandSpec {
    let mut spec = CommandSpec::tool("dump-table-meta");
    spec.push_flag("--project-dir", settings.get_or_empty(SettingKey::ProjectPath));
    spec.push_flag("-n", options.table());

    if let Some(format) = options.format {
        spec.push_flag("--format", format.as_str());
    }
    if let Some(prefix) = non_empty(&options.filter_prefix) {
        spec.push_flag("--filter-prefix", prefix);
    }
    if let Some(include) = non_empty(&options.filter_include) {
        spec.push_flag("--filter-include", include);
    }
    if let Some(exclude) = non_empty(&options.filter_exclude) {
        spec.push_flag("--filter-exclude", exclude);
    }
    if options.no_derived {
        spec.push("--no-derived");
    }
    if options.verbose {
        spec.push("--verbose");
    }
    spec
}

/// `gen-code` / `gen-project` invocation, chosen by `TOOL_MODE`.
pub fn build_gen_command(settings: &Settings) -> Result<(ToolMode, CommandSpec), LaunchError> {
    let mode = ToolMode::parse(settings.tool_mode())?;
    let mut spec = CommandSpec::tool(mode.subcommand());
    spec.push_flag("--project-dir", settings.get_or_empty(SettingKey::ProjectPath));
    match mode {
        ToolMode::SingleFile => {
            spec.push_flag("-f", settings.get_or_empty(SettingKey::DatabaseFile));
        }
        ToolMode::Project => {
            // An unset path is passed through; the tool decides whether "" is valid.
            spec.push_flag("-d", settings.get_or_empty(SettingKey::DatabasePath));
        }
    }
    Ok((mode, spec))
}
