//! Flat TOML file source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::ConfigError;
use crate::source::Source;

/// Flat TOML file source: the TOML flavor of [`IniFileSource`](crate::IniFileSource).
///
/// Top-level scalars form the base layer; each `[table]` then overlays its
/// own scalars in document order, so a later table wins on collision. Values
/// keep their TOML types (`port = 8080` arrives as an integer). Tables nested
/// deeper than one level and arrays are ignored.
#[derive(Debug, Clone)]
pub struct TomlFileSource {
    path: PathBuf,
    values: HashMap<String, Value>,
}

impl TomlFileSource {
    /// Read and parse the file at `path`.
    ///
    /// Fails with [`ConfigError::FileNotFound`] before any reading if `path` is
    /// not a regular file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse TOML text. `path` is only used for error messages and logging.
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let table: Table = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
            path: path.clone(),
            source: e,
        })?;

        let values = flatten(table);
        tracing::debug!(path = %path.display(), keys = values.len(), "loaded toml file");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn flatten(table: Table) -> HashMap<String, Value> {
    let mut values = HashMap::new();
    let mut sections = Vec::new();

    for (key, value) in table {
        match value {
            Value::Table(section) => sections.push(section),
            Value::Array(_) => {}
            scalar => {
                values.insert(key, scalar);
            }
        }
    }
    for section in sections {
        values.extend(
            section
                .into_iter()
                .filter(|(_, v)| !matches!(v, Value::Table(_) | Value::Array(_))),
        );
    }
    values
}

impl Source for TomlFileSource {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn name(&self) -> String {
        format!("toml({})", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(content: &str) -> TomlFileSource {
        TomlFileSource::parse(content, "/test/config.toml").unwrap()
    }

    #[test]
    fn keeps_native_types() {
        let source = parse("port = 8080\nrate = 1.5\ndebug = true\nhost = \"x\"\n");
        assert_eq!(source.get_key("port"), Some(Value::Integer(8080)));
        assert_eq!(source.get_key("rate"), Some(Value::Float(1.5)));
        assert_eq!(source.get_key("debug"), Some(Value::Boolean(true)));
        assert_eq!(source.get_key("host"), Some(Value::String("x".into())));
    }

    #[test]
    fn tables_flatten_over_top_level() {
        let source = parse("port = 1\n[server]\nport = 2\nhost = \"h\"\n");
        assert_eq!(source.get_key("port"), Some(Value::Integer(2)));
        assert_eq!(source.get_key("host"), Some(Value::String("h".into())));
    }

    #[test]
    fn later_table_wins_in_document_order() {
        let source = parse("[zeta]\nport = 1\n[alpha]\nport = 2\n");
        assert_eq!(source.get_key("port"), Some(Value::Integer(2)));
    }

    #[test]
    fn deep_tables_and_arrays_ignored() {
        let source = parse("hosts = [\"a\"]\n[a]\n[a.b]\nport = 1\n");
        assert_eq!(source.get_key("hosts"), None);
        assert_eq!(source.get_key("port"), None);
        assert_eq!(source.get_key("b"), None);
    }

    #[test]
    fn parse_error_reports_path() {
        let err = TomlFileSource::parse("port = = 1", "/test/config.toml").unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = TomlFileSource::open(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn open_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "port = 3000\n").unwrap();
        let source = TomlFileSource::open(&path).unwrap();
        assert_eq!(source.get_key("port"), Some(Value::Integer(3000)));
        assert_eq!(source.path(), path.as_path());
    }
}
