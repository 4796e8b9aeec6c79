//! Bind environment variables, command-line flags, and INI files into typed
//! config structs. Define a struct, point at a source, and go.
//!
//! ```ignore
//! #[derive(Config, Deserialize)]
//! struct AppConfig {
//!     #[config(default = "localhost")]
//!     host: String,
//!     #[config(default = 8080)]
//!     port: u16,
//!     log_file: Option<String>,
//! }
//!
//! let config: AppConfig = simplecfg::bind(&EnvSource::from_env())?;
//! ```
//!
//! That call reads `HOST`, `PORT` and `LOG_FILE` from the environment,
//! converts each string to the field's type, fills in the
//! `#[config(default)]` values, and hands you a typed struct.
//!
//! # Design: struct as schema
//!
//! Your config struct is the only schema. It derives confique's `Config`
//! (field names, optionality, defaults) and serde's `Deserialize` (field
//! types, enum variant names). Supported field types are `String`, every
//! integer width up to 64 bits, `f32`/`f64`, `bool`, unit-variant enums, and
//! `Option` of any of those. Anything else, including `#[config(nested)]`
//! sections, fails with [`ConfigError::SchemaType`] before any source is read.
//!
//! - **`#[config(default = ...)]`** is used when no source has the key. The
//!   default is taken as written, without conversion.
//! - **`Option<T>` fields** become `None` when no source has the key.
//! - Every other field is required.
//!
//! # Sources
//!
//! A [`Source`] answers one question: what is the raw value for this key? All
//! I/O happens when a source is constructed, so a missing file or a
//! malformed flag fails right there, never halfway through a bind.
//!
//! | Source | Key `pool_size` is read from |
//! |--------|------------------------------|
//! | [`EnvSource`] | `POOL_SIZE` (or `PREFIX__POOL_SIZE`) |
//! | [`ArgsSource`] | `--pool_size=10` |
//! | [`IniFileSource`] | `pool_size = 10` in any section |
//! | [`TomlFileSource`] | `pool_size = 10` at top level or in any table |
//! | [`MapSource`] | an in-memory table |
//! | `ClapSource` | a clap arg with id `pool_size` or `pool-size` |
//!
//! [`Interpolation`] layers sources: the **first** source listed that has a
//! key wins. An empty string counts as present.
//!
//! ```ignore
//! let source = Interpolation::new(vec![
//!     Box::new(ArgsSource::from_env()?),
//!     Box::new(EnvSource::from_env()),
//!     Box::new(IniFileSource::open("/etc/myapp.ini")?),
//! ]);
//! let config: AppConfig = simplecfg::bind(&source)?;
//! ```
//!
//! # Value conversion
//!
//! Raw values are converted to each field's type:
//!
//! - **bool**: `true/yes/on/1` and `false/no/off/0`, case-insensitive
//! - **enums**: the exact serialized variant name
//! - **integers and floats**: parsed from the trimmed text, integers
//!   range-checked against the field's width
//! - **strings**: taken as is
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigError`]. Field problems are not
//! reported one at a time: a bind checks every field and returns
//! [`ConfigError::Fields`] listing each missing key and each bad value
//! together.
//!
//! # Builder
//!
//! [`Simplecfg::builder()`] wires the common layers for you:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Config files          search paths in order, then .ini_file()/.toml_file()
//!        ↑ overridden by
//! Environment vars      FIELD or PREFIX__FIELD
//!        ↑ overridden by
//! Command-line flags    --field=value (opt-in)
//!        ↑ overridden by
//! Custom sources        .source()
//!        ↑ overridden by
//! Overrides             .set_override() / .overrides_from()
//! ```
//!
//! ```ignore
//! let config: AppConfig = Simplecfg::builder()
//!     .app_name("myapp")
//!     .add_search_path(SearchPath::Cwd)
//!     .args_from_env()
//!     .load()?;
//! ```
//!
//! With an app name, the builder looks for `myapp.ini` in the platform
//! config directory and then the working directory. Missing discovered files
//! are skipped; files added explicitly must exist.
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), `ClapSource` turns clap
//! `ArgMatches` into a source. Only values the user passed are used; clap
//! `default_value`s are skipped so lower layers still apply. To drop clap:
//!
//! ```toml
//! simplecfg = { version = "...", default-features = false }
//! ```

pub mod error;
pub mod types;

mod args;
mod bind;
mod builder;
#[cfg(feature = "clap")]
mod cli;
mod coerce;
mod env;
mod file;
mod ini;
mod probe;
mod schema;
mod source;
mod toml_file;

#[cfg(test)]
mod fixtures;

pub use args::ArgsSource;
pub use bind::bind;
pub use builder::{Simplecfg, SimplecfgBuilder};
#[cfg(feature = "clap")]
pub use cli::ClapSource;
pub use coerce::{FALSE_VALUES, TRUE_VALUES};
pub use env::EnvSource;
pub use error::{CoercionError, ConfigError, FieldError, FieldErrors};
pub use file::locate_config_files;
pub use ini::IniFileSource;
pub use schema::{FieldDescriptor, IntKind, TypeTag, describe};
pub use source::{Interpolation, MapSource, Source};
pub use toml_file::TomlFileSource;
pub use types::{FileFormat, SearchPath};
