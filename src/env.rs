//! Environment variable source.

use std::collections::HashMap;

use toml::Value;

use crate::source::Source;

/// A field named `pool_size` is looked up as `POOL_SIZE`. With a prefix the
/// lookup becomes `{PREFIX}__POOL_SIZE` (double underscore, so a single `_`
/// inside the field name stays literal).
///
/// The environment is snapshotted at construction. Values are always strings;
/// type conversion is left to the binder.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
    prefix: Option<String>,
}

impl EnvSource {
    /// Snapshot the process environment. Variables whose name or value is not
    /// valid UTF-8 are skipped.
    pub fn from_env() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(vars)
    }

    /// Build from explicit pairs, so tests can pass synthetic data instead of
    /// the real environment.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        tracing::debug!(vars = vars.len(), "loaded environment source");
        Self { vars, prefix: None }
    }

    /// Only consider variables named `{prefix}__{FIELD}`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_uppercase());
        self
    }

    fn var_name(&self, key: &str) -> String {
        let upper = key.to_uppercase();
        match &self.prefix {
            Some(prefix) => format!("{prefix}__{upper}"),
            None => upper,
        }
    }
}

impl Source for EnvSource {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.vars
            .get(&self.var_name(name))
            .map(|v| Value::String(v.clone()))
    }

    fn name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("env({prefix}__*)"),
            None => "env".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn looks_up_uppercased_name() {
        let source = EnvSource::from_vars(vars(&[("HOST", "0.0.0.0")]));
        assert_eq!(source.get_key("host"), Some(Value::String("0.0.0.0".into())));
    }

    #[test]
    fn single_underscore_preserved() {
        let source = EnvSource::from_vars(vars(&[("POOL_SIZE", "10")]));
        assert_eq!(source.get_key("pool_size"), Some(Value::String("10".into())));
    }

    #[test]
    fn lowercase_variable_not_matched() {
        let source = EnvSource::from_vars(vars(&[("host", "x")]));
        assert_eq!(source.get_key("host"), None);
    }

    #[test]
    fn unset_is_absent() {
        let source = EnvSource::from_vars(vars(&[]));
        assert_eq!(source.get_key("port"), None);
    }

    #[test]
    fn empty_value_is_present() {
        let source = EnvSource::from_vars(vars(&[("NAME", "")]));
        assert_eq!(source.get_key("name"), Some(Value::String(String::new())));
    }

    #[test]
    fn values_stay_strings() {
        let source = EnvSource::from_vars(vars(&[("PORT", "8080"), ("DEBUG", "true")]));
        assert_eq!(source.get_key("port"), Some(Value::String("8080".into())));
        assert_eq!(source.get_key("debug"), Some(Value::String("true".into())));
    }

    #[test]
    fn prefix_uses_double_underscore() {
        let source = EnvSource::from_vars(vars(&[
            ("MYAPP__HOST", "prefixed"),
            ("HOST", "bare"),
            ("MYAPP_PORT", "1"),
        ]))
        .with_prefix("myapp");
        assert_eq!(source.get_key("host"), Some(Value::String("prefixed".into())));
        assert_eq!(source.get_key("port"), None);
    }
}
