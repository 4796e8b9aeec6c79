//! The [`Source`] trait and the sources that are pure in-memory lookups.
//!
//! A source answers one question: "what is the raw value for this key?"
//! Every source does its I/O (reading env vars, argv, files) once, at
//! construction. Lookups afterwards never mutate, so one source can serve any
//! number of binds, from any thread.
//!
//! - [`MapSource`]: an explicit key/value table (overrides, tests, values from
//!   another parser).
//! - [`Interpolation`]: layers several sources, first present value wins.
//!
//! The I/O-backed sources live in their own modules: [`EnvSource`](crate::EnvSource),
//! [`ArgsSource`](crate::ArgsSource), [`IniFileSource`](crate::IniFileSource) and
//! [`TomlFileSource`](crate::TomlFileSource).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use toml::Value;

use crate::error::ConfigError;

/// A provider of raw configuration values.
pub trait Source: Send + Sync {
    /// Look up the raw value for `name`. `None` means the key is absent.
    fn get_key(&self, name: &str) -> Option<Value>;

    /// Short human-readable label, used in log events.
    fn name(&self) -> String {
        "custom".into()
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn get_key(&self, name: &str) -> Option<Value> {
        (**self).get_key(name)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn get_key(&self, name: &str) -> Option<Value> {
        (**self).get_key(name)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

impl<S: Source + ?Sized> Source for Arc<S> {
    fn get_key(&self, name: &str) -> Option<Value> {
        (**self).get_key(name)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// An in-memory table of raw values.
///
/// Values keep whatever type they were given, so a `MapSource` can hand the
/// binder native integers, floats and booleans as well as strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSource {
    values: HashMap<String, Value>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs. If a key repeats, the last one wins.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut source = Self::new();
        for (key, value) in pairs {
            source.insert(key, value);
        }
        source
    }

    /// Build from the top-level fields of any serializable value.
    ///
    /// `None` fields are skipped, so a clap-derived struct of `Option<T>`
    /// flags only contributes the flags the user actually passed. Nested
    /// structs, lists and maps are skipped too, since config fields are flat.
    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, ConfigError> {
        let value =
            Value::try_from(source).map_err(|e| ConfigError::InvalidSource(e.to_string()))?;
        let Value::Table(table) = value else {
            return Err(ConfigError::InvalidSource(
                "value did not serialize to a table of fields".into(),
            ));
        };

        let values = table
            .into_iter()
            .filter(|(_, v)| !matches!(v, Value::Table(_) | Value::Array(_)))
            .collect();
        Ok(Self { values })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Source for MapSource {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn name(&self) -> String {
        "map".into()
    }
}

/// Priority-ordered layering of sources.
///
/// `get_key` asks each source in list order and returns the first present
/// value. The **first** source listed therefore has the highest priority:
///
/// ```ignore
/// // CLI flags beat env vars, env vars beat the file.
/// let source = Interpolation::new(vec![
///     Box::new(ArgsSource::from_env()?),
///     Box::new(EnvSource::from_env()),
///     Box::new(IniFileSource::open("app.ini")?),
/// ]);
/// ```
#[derive(Default)]
pub struct Interpolation {
    sources: Vec<Box<dyn Source>>,
}

impl Interpolation {
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Append a source below every source already present.
    pub fn push<S: Source + 'static>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Source for Interpolation {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.sources.iter().find_map(|source| {
            let value = source.get_key(name)?;
            tracing::trace!(key = name, source = %source.name(), "key resolved");
            Some(value)
        })
    }

    fn name(&self) -> String {
        let names: Vec<String> = self.sources.iter().map(|s| s.name()).collect();
        format!("interpolation[{}]", names.join(", "))
    }
}
