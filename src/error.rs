//! Error types.
//!
//! Two families of failure exist and they never mix:
//!
//! - **Fatal** errors stop immediately: an invalid schema
//!   ([`ConfigError::SchemaType`]) or a source that could not be constructed
//!   (missing file, malformed flag, unparsable file).
//! - **Field** errors are collected across the whole schema during a single
//!   bind and surfaced together as [`ConfigError::Fields`], so the caller sees
//!   every missing or invalid key at once.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config schema `{schema}`: {reason}")]
    SchemaType {
        schema: &'static str,
        reason: String,
    },

    #[error("Failed to load config fields: {0}")]
    Fields(#[from] FieldErrors),

    #[error("Config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {} (line {line}): {reason}", .path.display())]
    IniParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to interpolate [{section}] in {}: {reason}", .path.display())]
    IniInterpolation {
        path: PathBuf,
        section: String,
        reason: String,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Malformed command-line flag '{0}': expected --key=value")]
    MalformedFlag(String),

    #[error("Invalid config source: {0}")]
    InvalidSource(String),

    #[error("App name is required to search the platform config directory; call .app_name() on the builder")]
    AppNameRequired,

    #[error("Failed to construct `{schema}` from bound values: {reason}")]
    Construct {
        schema: &'static str,
        reason: String,
    },
}

/// Why a present raw value could not be converted to a field's type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error(
        "Invalid value `{value}` for the boolean type field, must be one of: \
         true, yes, on, 1, false, no, off, 0 (case insensitive)"
    )]
    InvalidBool { value: String },

    #[error(
        "Failed to convert value `{value}` to the type {type_name}, the value must be one of: {}",
        .variants.join(", ")
    )]
    InvalidVariant {
        value: String,
        type_name: &'static str,
        variants: Vec<&'static str>,
    },

    #[error("Failed to convert value `{value}` to the type {target}")]
    Conversion { value: String, target: String },

    #[error("Value `{value}` is out of range for the type {target}")]
    OutOfRange { value: String, target: String },
}

/// A single field's failure inside an aggregate [`FieldErrors`] report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Config key is missing")]
    Missing,

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Every field-level failure from one bind, in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    entries: Vec<(String, FieldError)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, error: FieldError) {
        self.entries.push((field.into(), error));
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, err)| err)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.entries.iter().map(|(name, err)| (name.as_str(), err))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, err)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "`{name}`: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_formats() {
        let err = ConfigError::FileNotFound("/etc/myapp/app.ini".into());
        let msg = err.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("app.ini"));
    }

    #[test]
    fn malformed_flag_names_token() {
        let err = ConfigError::MalformedFlag("--verbose".into());
        assert!(err.to_string().contains("--verbose"));
    }

    #[test]
    fn invalid_variant_lists_all_values() {
        let err = CoercionError::InvalidVariant {
            value: "c".into(),
            type_name: "SomeEnum",
            variants: vec!["a", "b"],
        };
        let msg = err.to_string();
        assert!(msg.contains("`c`"));
        assert!(msg.contains("a, b"));
    }

    #[test]
    fn invalid_bool_lists_accepted_tokens() {
        let err = CoercionError::InvalidBool {
            value: "maybe".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("maybe"));
        assert!(msg.contains("yes"));
        assert!(msg.contains("off"));
    }

    #[test]
    fn aggregate_lists_every_field() {
        let mut errors = FieldErrors::new();
        errors.push("host", FieldError::Missing);
        errors.push(
            "port",
            CoercionError::Conversion {
                value: "abc".into(),
                target: "integer (u16)".into(),
            }
            .into(),
        );
        let msg = ConfigError::from(errors).to_string();
        assert!(msg.contains("`host`"));
        assert!(msg.contains("`port`"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn field_errors_lookup_preserves_order() {
        let mut errors = FieldErrors::new();
        errors.push("b", FieldError::Missing);
        errors.push("a", FieldError::Missing);
        assert_eq!(errors.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(errors.contains("a"));
        assert!(!errors.contains("c"));
        assert_eq!(errors.len(), 2);
    }
}
