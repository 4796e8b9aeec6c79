//! Command-line flag source.
//!
//! Recognizes `--key=value` tokens only. Positional arguments are ignored and
//! a bare `--` ends flag parsing. A `--flag` without `=` is rejected at
//! construction rather than silently dropped, since it almost always means the
//! user expected it to take effect.

use std::collections::HashMap;

use toml::Value;

use crate::error::ConfigError;
use crate::source::Source;

/// Source backed by `--key=value` command-line flags.
///
/// Keys are stored lowercased and looked up case-insensitively. Values keep
/// everything after the first `=`, so `--url=a=b` yields `a=b`. When a flag
/// repeats, the last occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    flags: HashMap<String, String>,
}

impl ArgsSource {
    /// Parse the process arguments, skipping the program name.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(
            std::env::args_os()
                .skip(1)
                .map(|a| a.to_string_lossy().into_owned()),
        )
    }

    /// Parse an explicit argument list. The list must not include the
    /// program name.
    pub fn parse<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut flags = HashMap::new();
        for arg in args {
            let arg = arg.as_ref();
            if arg == "--" {
                break;
            }
            let Some(flag) = arg.strip_prefix("--") else {
                continue;
            };
            match flag.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    flags.insert(key.to_lowercase(), value.to_string());
                }
                _ => return Err(ConfigError::MalformedFlag(arg.to_string())),
            }
        }
        tracing::debug!(flags = flags.len(), "parsed command-line flags");
        Ok(Self { flags })
    }
}

impl Source for ArgsSource {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.flags
            .get(&name.to_lowercase())
            .map(|v| Value::String(v.clone()))
    }

    fn name(&self) -> String {
        "args".into()
    }
}
