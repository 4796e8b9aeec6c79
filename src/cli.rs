//! Clap adapter.
//!
//! This module is the **optional integration layer** between simplecfg's
//! parser-agnostic core and the [clap](https://docs.rs/clap) CLI parser. It
//! is compiled only when the `clap` Cargo feature is enabled (on by default).
//!
//! [`ClapSource`] turns already-parsed [`ArgMatches`] into a [`Source`], so an
//! app that declares its flags with clap can layer them like any other source.
//! If you use a different CLI parser, skip this module and use
//! [`ArgsSource`](crate::ArgsSource) or
//! [`MapSource::from_serialize`](crate::MapSource::from_serialize) instead.

use std::collections::HashMap;

use clap::ArgMatches;
use clap::parser::ValueSource;
use toml::Value;

use crate::source::Source;

/// Source backed by the explicitly supplied values of a clap [`ArgMatches`].
///
/// Only values the user actually passed (on the command line, or through a
/// clap `env = ...` binding) are kept. Values coming from a clap
/// `default_value` are skipped so that files and env vars underneath can
/// still supply the key. Arg ids are lowercased and `-` becomes `_`, so
/// `--max-conn` binds to a `max_conn` field. A multi-value arg contributes
/// its last value.
#[derive(Debug, Clone, Default)]
pub struct ClapSource {
    values: HashMap<String, String>,
}

impl ClapSource {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut values = HashMap::new();
        for id in matches.ids() {
            let id = id.as_str();
            match matches.value_source(id) {
                Some(ValueSource::DefaultValue) | None => continue,
                Some(_) => {}
            }
            let Ok(Some(raw)) = matches.try_get_raw(id) else {
                continue;
            };
            if let Some(last) = raw.last() {
                values.insert(normalize_id(id), last.to_string_lossy().into_owned());
            }
        }
        tracing::debug!(values = values.len(), "loaded clap matches");
        Self { values }
    }
}

fn normalize_id(id: &str) -> String {
    id.to_lowercase().replace('-', "_")
}

impl Source for ClapSource {
    fn get_key(&self, name: &str) -> Option<Value> {
        self.values
            .get(&name.to_lowercase())
            .map(|v| Value::String(v.clone()))
    }

    fn name(&self) -> String {
        "clap".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::bind;
    use crate::fixtures::test::ServerConfig;
    use crate::source::{Interpolation, MapSource};
    use clap::{Arg, Command, CommandFactory, Parser};

    #[derive(Debug, Parser)]
    struct TestCli {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long)]
        debug: bool,
    }

    fn matches(args: &[&str]) -> ArgMatches {
        TestCli::command().try_get_matches_from(args).unwrap()
    }

    fn string(v: &str) -> Option<Value> {
        Some(Value::String(v.into()))
    }

    #[test]
    fn passed_values_present() {
        let source = ClapSource::from_matches(&matches(&["app", "--port", "3000"]));
        assert_eq!(source.get_key("port"), string("3000"));
    }

    #[test]
    fn clap_defaults_skipped() {
        let source = ClapSource::from_matches(&matches(&["app"]));
        assert_eq!(source.get_key("host"), None);
        assert_eq!(source.get_key("debug"), None);
        assert_eq!(source.get_key("port"), None);
    }

    #[test]
    fn explicit_flag_present() {
        let source = ClapSource::from_matches(&matches(&["app", "--debug", "--host", "0.0.0.0"]));
        assert_eq!(source.get_key("debug"), string("true"));
        assert_eq!(source.get_key("host"), string("0.0.0.0"));
    }

    #[test]
    fn dashed_ids_normalized() {
        let cmd = Command::new("app").arg(Arg::new("max-conn").long("max-conn"));
        let m = cmd.try_get_matches_from(["app", "--max-conn", "5"]).unwrap();
        let source = ClapSource::from_matches(&m);
        assert_eq!(source.get_key("max_conn"), string("5"));
    }

    #[test]
    fn layers_over_lower_sources() {
        let cli = ClapSource::from_matches(&matches(&["app", "--port", "3000"]));
        let file = MapSource::from_pairs([
            ("host", Value::String("file-host".into())),
            ("port", Value::Integer(1)),
        ]);
        let source = Interpolation::new(vec![Box::new(cli), Box::new(file)]);

        let config: ServerConfig = bind(&source).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "file-host");
    }
}
