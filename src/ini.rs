//! Flat INI file source.
//!
//! Reads an INI file once and flattens every section into a single key space:
//!
//! ```ini
//! [server]
//! host = 0.0.0.0
//! port: 8080
//!
//! [limits]
//! max_connections = 100
//! ```
//!
//! gives `host`, `port` and `max_connections`. Section names are only
//! structure for the reader. If two sections define the same key, the later
//! section wins.
//!
//! Keys in a `[DEFAULT]` section are copied into every named section, beneath
//! that section's own keys. So with `[a] port = 1`, `[b] x = 2` and
//! `[DEFAULT] port = 9`, section `b` carries `port = 9` and, being later,
//! wins. A file whose only section is `[DEFAULT]` yields no keys.
//!
//! Syntax accepted:
//!
//! - `key = value` or `key: value` (split at the first `=` or `:`)
//! - `key =` is the **empty string**. It counts as present, so a field default
//!   does not apply.
//! - a bare `key` line has **no value**. It reads as absent, so a field
//!   default does apply.
//! - full-line comments starting with `#` or `;`
//! - indented lines continue the previous value (joined with `\n`)
//! - `%(other)s` is replaced with the value of key `other` from the same
//!   section (or `[DEFAULT]`), and `%%` is a literal `%`. Any other `%` is an
//!   error, as is a reference to a missing key.
//!
//! Keys are case-insensitive; they are stored and looked up lowercased.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use toml::Value;

use crate::error::ConfigError;
use crate::source::Source;

const DEFAULT_SECTION: &str = "DEFAULT";

/// Source backed by a flattened INI file.
#[derive(Debug, Clone)]
pub struct IniFileSource {
    path: PathBuf,
    values: HashMap<String, Option<String>>,
}

impl IniFileSource {
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

    /// Parse INI text. `path` is only used for error messages and logging.
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let sections = parse_sections(content).map_err(|(line, reason)| ConfigError::IniParse {
            path: path.clone(),
            line,
            reason,
        })?;

        let values = flatten(sections).map_err(|(section, reason)| {
            ConfigError::IniInterpolation {
                path: path.clone(),
                section,
                reason,
            }
        })?;
        tracing::debug!(path = %path.display(), keys = values.len(), "loaded ini file");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for IniFileSource {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.values
            .get(&name.to_lowercase())
            .cloned()
            .flatten()
            .map(Value::String)
    }

    fn name(&self) -> String {
        format!("ini({})", self.path.display())
    }
}

struct Section {
    name: String,
    entries: Vec<(String, Option<String>)>,
}

/// Parse INI text into sections in document order.
///
/// Errors carry the 1-indexed line number.
fn parse_sections(content: &str) -> Result<Vec<Section>, (usize, String)> {
    let mut sections: Vec<Section> = Vec::new();
    // Whether the last entry of the current section may take continuation lines.
    let mut continuable = false;

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continuable = false;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if continuable && line.starts_with(char::is_whitespace) {
            let last_value = sections
                .last_mut()
                .and_then(|s| s.entries.last_mut())
                .and_then(|(_, value)| value.as_mut());
            if let Some(value) = last_value {
                value.push('\n');
                value.push_str(trimmed);
                continue;
            }
        }

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| (line_no, format!("unterminated section header '{trimmed}'")))?
                .trim();
            if name.is_empty() {
                return Err((line_no, "empty section name".into()));
            }
            sections.push(Section {
                name: name.to_string(),
                entries: Vec::new(),
            });
            continuable = false;
            continue;
        }

        let section = sections
            .last_mut()
            .ok_or_else(|| (line_no, format!("key '{trimmed}' appears before any [section] header")))?;

        let (key, value) = match trimmed.find(|c: char| c == '=' || c == ':') {
            Some(pos) => (
                trimmed[..pos].trim(),
                Some(trimmed[pos + 1..].trim().to_string()),
            ),
            None => (trimmed, None),
        };
        if key.is_empty() {
            return Err((line_no, format!("missing key in '{trimmed}'")));
        }

        continuable = value.is_some();
        section.entries.push((key.to_lowercase(), value));
    }

    Ok(sections)
}

/// Merge the named sections into one map in document order, later keys
/// replacing earlier ones. Each section is first laid over the `[DEFAULT]`
/// keys and its values interpolated.
///
/// Errors carry the section name.
fn flatten(sections: Vec<Section>) -> Result<HashMap<String, Option<String>>, (String, String)> {
    let (defaults, named): (Vec<_>, Vec<_>) = sections
        .into_iter()
        .partition(|s| s.name == DEFAULT_SECTION);
    let defaults: Vec<_> = defaults.into_iter().flat_map(|s| s.entries).collect();

    let mut values = HashMap::new();
    for section in named {
        let mut scope: HashMap<String, Option<String>> = defaults.iter().cloned().collect();
        scope.extend(section.entries);

        for (key, raw) in &scope {
            let value = match raw {
                Some(raw) => Some(
                    interpolate(key, raw, &scope, 1).map_err(|e| (section.name.clone(), e))?,
                ),
                None => None,
            };
            values.insert(key.clone(), value);
        }
    }
    Ok(values)
}

const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Expand `%(name)s` references and `%%` escapes in `value`.
fn interpolate(
    key: &str,
    value: &str,
    scope: &HashMap<String, Option<String>>,
    depth: usize,
) -> Result<String, String> {
    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(format!(
            "value of '{key}' nests references more than {MAX_INTERPOLATION_DEPTH} deep"
        ));
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('%') {
            out.push('%');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('(') {
            let reference = tail
                .find(')')
                .filter(|&end| end > 0 && tail[end + 1..].starts_with('s'))
                .ok_or_else(|| format!("bad reference syntax in '{key}': '{value}'"))?;
            let name = tail[..reference].to_lowercase();
            let referenced = scope
                .get(&name)
                .and_then(|v| v.as_deref())
                .ok_or_else(|| format!("'{key}' references missing key '{name}'"))?;

            if referenced.contains('%') {
                out.push_str(&interpolate(&name, referenced, scope, depth + 1)?);
            } else {
                out.push_str(referenced);
            }
            rest = &tail[reference + 2..];
        } else {
            return Err(format!(
                "'%' must be followed by '%' or '(' in '{key}': '{value}'"
            ));
        }
    }
    out.push_str(rest);
    Ok(out)
}
