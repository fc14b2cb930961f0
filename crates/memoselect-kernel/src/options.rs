//! Per-selector options.
//!
//! Options are plain data: they can be built in code, or loaded from a TOML
//! table such as
//!
//! ```toml
//! name = "visible_todos"
//! input_stability_check = "once"
//! ```
//!
//! There is no process-wide default. A [`SelectorCreator`] carries the
//! options it stamps onto every selector it builds.
//!
//! [`SelectorCreator`]: crate::selector::SelectorCreator

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// How often a development check runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckFrequency {
    /// The check is disabled.
    #[default]
    Never,

    /// The check runs on the first invocation only.
    Once,

    /// The check runs on every invocation.
    Always,
}

impl std::fmt::Display for CheckFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Once => write!(f, "once"),
            Self::Always => write!(f, "always"),
        }
    }
}

impl std::str::FromStr for CheckFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" | "off" => Ok(Self::Never),
            "once" => Ok(Self::Once),
            "always" => Ok(Self::Always),
            _ => Err(format!("unknown check frequency: {s}")),
        }
    }
}

/// Options applied to one selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorOptions {
    /// Label used in log events and stats.
    pub name: Option<String>,

    /// Re-run the input list and warn when two evaluations with the same
    /// arguments disagree.
    pub input_stability_check: CheckFrequency,
}

impl SelectorOptions {
    /// Default options with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_input_stability_check(mut self, frequency: CheckFrequency) -> Self {
        self.input_stability_check = frequency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parse_and_display() {
        assert_eq!("once".parse::<CheckFrequency>().unwrap(), CheckFrequency::Once);
        assert_eq!(
            "ALWAYS".parse::<CheckFrequency>().unwrap(),
            CheckFrequency::Always
        );
        assert_eq!("off".parse::<CheckFrequency>().unwrap(), CheckFrequency::Never);
        assert!("sometimes".parse::<CheckFrequency>().is_err());
        assert_eq!(CheckFrequency::Always.to_string(), "always");
    }

    #[test]
    fn options_default_to_no_checks() {
        let options = SelectorOptions::default();
        assert_eq!(options.name, None);
        assert_eq!(options.input_stability_check, CheckFrequency::Never);
    }

    #[test]
    fn options_load_from_toml() {
        let options = SelectorOptions::from_toml_str(
            r#"
name = "visible_todos"
input_stability_check = "always"
"#,
        )
        .unwrap();
        assert_eq!(
            options,
            SelectorOptions::named("visible_todos")
                .with_input_stability_check(CheckFrequency::Always)
        );
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(
            SelectorOptions::from_toml_str("").unwrap(),
            SelectorOptions::default()
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SelectorOptions::from_toml_str("cache_size = 4").unwrap_err();
        assert!(matches!(err, ConfigurationError::Options(_)));
    }
}
