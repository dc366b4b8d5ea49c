//! Parsing for the `key=value` settings format shared by both workflows.
//!
//! The format is deliberately minimal: no sections, no quoting, no multi-line
//! values. Only keys in [`SettingKey`] are retained so unrelated entries in a
//! shared file never influence behavior.

use std::collections::BTreeMap;
use std::fmt;

/// Recognized settings keys (superset across both workflows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    ProjectPath,
    DatabaseFile,
    DatabasePath,
    OutputDir,
    ToolMode,
    ShowLogs,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::ProjectPath,
        SettingKey::DatabaseFile,
        SettingKey::DatabasePath,
        SettingKey::OutputDir,
        SettingKey::ToolMode,
        SettingKey::ShowLogs,
    ];

    /// Name as written in `project.ini`.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ProjectPath => "MIAOMA_CONFIG_PROJECT_PATH",
            SettingKey::DatabaseFile => "MIAOMA_DATABASE_FILE",
            SettingKey::DatabasePath => "MIAOMA_DATABASE_PATH",
            SettingKey::OutputDir => "OUTPUT_DIR",
            SettingKey::ToolMode => "TOOL_MODE",
            SettingKey::ShowLogs => "SHOW_PYTHON_LOGS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key a workflow cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Required {
    pub key: SettingKey,
    /// An empty value satisfies the requirement.
    pub allow_empty: bool,
}

impl Required {
    /// The key must appear; any value, including an empty one, is accepted.
    pub const fn present(key: SettingKey) -> Self {
        Self {
            key,
            allow_empty: true,
        }
    }

    /// The key must appear with a non-empty value.
    pub const fn non_empty(key: SettingKey) -> Self {
        Self {
            key,
            allow_empty: false,
        }
    }

    fn is_met(self, value: Option<&str>) -> bool {
        match value {
            None => false,
            Some(value) => self.allow_empty || !value.is_empty(),
        }
    }
}

/// Validated settings. Values are kept verbatim; callers coerce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<SettingKey, String>,
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Value for `key`, or `""` when unset.
    pub fn get_or_empty(&self, key: SettingKey) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn insert(&mut self, key: SettingKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    /// `SHOW_PYTHON_LOGS`, compared case-insensitively against `true`.
    pub fn show_logs(&self) -> bool {
        self.get(SettingKey::ShowLogs)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    /// `TOOL_MODE`, defaulting to `1` when unset.
    pub fn tool_mode(&self) -> &str {
        self.get(SettingKey::ToolMode).unwrap_or("1")
    }

    /// Key of the first requirement in `required` these settings do not meet.
    pub fn first_missing(&self, required: &[Required]) -> Option<SettingKey> {
        required
            .iter()
            .copied()
            .find(|req| !req.is_met(self.get(req.key)))
            .map(|req| req.key)
    }
}

/// Parse settings text. Never fails: malformed lines are skipped.
pub fn parse_settings(contents: &str) -> Settings {
    let mut settings = Settings::default();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if let Some(key) = SettingKey::from_name(key.trim()) {
            settings.insert(key, value.trim());
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_keys_and_skips_comments() {
        let settings = parse_settings(
            "# project settings\n\
             \n\
             MIAOMA_CONFIG_PROJECT_PATH = projects/demo \n\
             TOOL_MODE=2\n\
             UNRELATED_KEY=ignored\n\
             not a pair\n",
        );

        assert_eq!(settings.get(SettingKey::ProjectPath), Some("projects/demo"));
        assert_eq!(settings.tool_mode(), "2");
        assert_eq!(settings.get(SettingKey::DatabaseFile), None);
        assert_eq!(settings, {
            let mut expected = Settings::default();
            expected.insert(SettingKey::ProjectPath, "projects/demo");
            expected.insert(SettingKey::ToolMode, "2");
            expected
        });
    }

    #[test]
    fn splits_on_first_equals_only() {
        let settings = parse_settings("MIAOMA_DATABASE_FILE=db/a=b.sql\n");
        assert_eq!(settings.get(SettingKey::DatabaseFile), Some("db/a=b.sql"));
    }

    #[test]
    fn indented_comment_is_skipped() {
        let settings = parse_settings("   # TOOL_MODE=2\n");
        assert_eq!(settings.get(SettingKey::ToolMode), None);
    }

    #[test]
    fn show_logs_is_case_insensitive() {
        assert!(parse_settings("SHOW_PYTHON_LOGS=TRUE").show_logs());
        assert!(parse_settings("SHOW_PYTHON_LOGS=true").show_logs());
        assert!(!parse_settings("SHOW_PYTHON_LOGS=yes").show_logs());
        assert!(!parse_settings("").show_logs());
    }

    #[test]
    fn tool_mode_defaults_to_single_file() {
        assert_eq!(parse_settings("").tool_mode(), "1");
    }

    #[test]
    fn non_empty_requirement_rejects_blank_value() {
        let settings = parse_settings("MIAOMA_CONFIG_PROJECT_PATH=\nMIAOMA_DATABASE_FILE=x.sql");
        let missing = settings.first_missing(&[
            Required::non_empty(SettingKey::DatabaseFile),
            Required::non_empty(SettingKey::ProjectPath),
        ]);
        assert_eq!(missing, Some(SettingKey::ProjectPath));
        assert_eq!(
            settings.first_missing(&[Required::non_empty(SettingKey::DatabaseFile)]),
            None
        );
    }

    #[test]
    fn presence_requirement_accepts_blank_value() {
        let settings = parse_settings("MIAOMA_DATABASE_FILE=\n");
        assert_eq!(
            settings.first_missing(&[Required::present(SettingKey::DatabaseFile)]),
            None
        );
        assert_eq!(
            settings.first_missing(&[Required::present(SettingKey::ProjectPath)]),
            Some(SettingKey::ProjectPath)
        );
    }
}
