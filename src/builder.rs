use std::marker::PhantomData;
use std::path::PathBuf;

use confique::Config;
use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::Value;

use crate::args::ArgsSource;
use crate::bind::bind;
use crate::env::EnvSource;
use crate::error::ConfigError;
use crate::file;
use crate::ini::IniFileSource;
use crate::schema;
use crate::source::{Interpolation, MapSource, Source};
use crate::toml_file::TomlFileSource;
use crate::types::{FileFormat, SearchPath};

/// Entry point for building a layered simplecfg source.
pub struct Simplecfg;

impl Simplecfg {
    pub fn builder<C: Config>() -> SimplecfgBuilder<C> {
        SimplecfgBuilder::new()
    }
}

enum ArgsInput {
    Process,
    List(Vec<String>),
}

/// Builder that assembles the standard layers into one [`Interpolation`].
///
/// Layers, lowest to highest priority:
///
/// 1. `#[config(default = ...)]` values (applied by the binder)
/// 2. config files: discovered files in search-path order, then explicit
///    files in the order added, later files winning
/// 3. environment variables (on by default)
/// 4. `--key=value` command-line flags (opt-in)
/// 5. custom sources added with [`source()`](Self::source), later winning
/// 6. overrides from [`set_override()`](Self::set_override) and
///    [`overrides_from()`](Self::overrides_from)
///
/// File discovery runs only when [`app_name()`](Self::app_name) or
/// [`file_name()`](Self::file_name) is set.
pub struct SimplecfgBuilder<C: Config> {
    app_name: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    files: Vec<(PathBuf, FileFormat)>,
    env_enabled: bool,
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
    args: Option<ArgsInput>,
    sources: Vec<Box<dyn Source>>,
    overrides: MapSource,
    _phantom: PhantomData<C>,
}

impl<C: Config> SimplecfgBuilder<C> {
    fn new() -> Self {
        Self {
            app_name: None,
            file_name: None,
            search_paths: None,
            files: Vec::new(),
            env_enabled: true,
            env_prefix: None,
            env_vars: None,
            args: None,
            sources: Vec::new(),
            overrides: MapSource::new(),
            _phantom: PhantomData,
        }
    }

    /// Set the application name. This turns on file discovery with:
    /// - `file_name` → `"{app_name}.ini"`
    /// - `search_paths` → `[SearchPath::Platform]`
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the discovered file name (default: `"{app_name}.ini"`).
    ///
    /// A `.toml` extension reads the files as TOML; anything else as INI.
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    /// If no paths have been set yet, starts from the default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Add an INI file that must exist. Layered above discovered files.
    pub fn ini_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), FileFormat::Ini));
        self
    }

    /// Add a TOML file that must exist. Layered above discovered files.
    pub fn toml_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), FileFormat::Toml));
        self
    }

    /// Look env vars up as `{PREFIX}__{FIELD}` instead of `{FIELD}`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Read these variables instead of the process environment.
    pub fn env_vars<K, V, I>(mut self, vars: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Parse `--key=value` flags from an explicit argument list (without the
    /// program name).
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args = Some(ArgsInput::List(args.into_iter().map(Into::into).collect()));
        self
    }

    /// Parse `--key=value` flags from the process arguments.
    pub fn args_from_env(mut self) -> Self {
        self.args = Some(ArgsInput::Process);
        self
    }

    /// Layer a custom source above files, env and flags. Sources added later
    /// take precedence over earlier ones.
    pub fn source<S: Source + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Set an override. `None` values are ignored (useful for optional clap args).
    pub fn set_override<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides.insert(key, v);
        }
        self
    }

    /// Add overrides from any serializable value, auto-matching by field name.
    ///
    /// Serializes `source` into its top-level fields, skips `None` values, and
    /// keeps only keys that match fields of `C`. Non-matching keys are
    /// silently ignored, so clap-only fields like `command` or `verbose` are
    /// automatically excluded.
    ///
    /// Composes with [`set_override`](Self::set_override); later calls take
    /// precedence.
    pub fn overrides_from<S: Serialize>(mut self, source: &S) -> Result<Self, ConfigError> {
        let values = MapSource::from_serialize(source)?;
        for name in schema::field_names::<C>() {
            if let Some(v) = values.get_key(name) {
                self.overrides.insert(name, v);
            }
        }
        Ok(self)
    }

    /// The discovered file name, or `None` if discovery is off.
    fn effective_file_name(&self) -> Option<String> {
        if let Some(name) = &self.file_name {
            return Some(name.clone());
        }
        self.app_name.as_ref().map(|app| format!("{app}.ini"))
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        if let Some(paths) = &self.search_paths {
            return paths.clone();
        }
        vec![SearchPath::Platform]
    }

    /// Every file to open, lowest priority first.
    fn config_files(&self) -> Result<Vec<(PathBuf, FileFormat)>, ConfigError> {
        let mut files = Vec::new();
        if let Some(file_name) = self.effective_file_name() {
            let found = file::locate_config_files(
                &self.effective_search_paths(),
                &file_name,
                self.app_name.as_deref(),
            )?;
            files.extend(found.into_iter().map(|p| {
                let format = FileFormat::from_path(&p);
                (p, format)
            }));
        }
        files.extend(self.files.iter().cloned());
        Ok(files)
    }

    /// Construct every source and layer them by precedence.
    ///
    /// All I/O (file reads, env snapshot, argument parsing) happens here, so
    /// the returned [`Interpolation`] can be bound any number of times.
    pub fn build_source(self) -> Result<Interpolation, ConfigError> {
        let mut file_sources = Vec::new();
        for (path, format) in self.config_files()? {
            file_sources.push(open_file(&path, format)?);
        }

        let env = if self.env_enabled {
            let source = match self.env_vars {
                Some(vars) => EnvSource::from_vars(vars),
                None => EnvSource::from_env(),
            };
            Some(match &self.env_prefix {
                Some(prefix) => source.with_prefix(prefix),
                None => source,
            })
        } else {
            None
        };

        let args = match self.args {
            Some(ArgsInput::Process) => Some(ArgsSource::from_env()?),
            Some(ArgsInput::List(list)) => Some(ArgsSource::parse(list)?),
            None => None,
        };

        // Interpolation asks sources in order, so highest priority goes first.
        let mut layered = Interpolation::default();
        if !self.overrides.is_empty() {
            layered.push(self.overrides);
        }
        for source in self.sources.into_iter().rev() {
            layered.push(source);
        }
        if let Some(args) = args {
            layered.push(args);
        }
        if let Some(env) = env {
            layered.push(env);
        }
        for source in file_sources.into_iter().rev() {
            layered.push(source);
        }

        tracing::debug!(source = %layered.name(), "assembled config layers");
        Ok(layered)
    }

    /// Build every layer and bind `C` from them.
    pub fn load(self) -> Result<C, ConfigError>
    where
        C: DeserializeOwned,
    {
        let source = self.build_source()?;
        bind(&source)
    }
}

fn open_file(path: &std::path::Path, format: FileFormat) -> Result<Box<dyn Source>, ConfigError> {
    let source: Box<dyn Source> = match format {
        FileFormat::Ini => Box::new(IniFileSource::open(path)?),
        FileFormat::Toml => Box::new(TomlFileSource::open(path)?),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::fixtures::test::{Mode, ServerConfig};
    use std::fs;
    use tempfile::TempDir;

    fn builder() -> SimplecfgBuilder<ServerConfig> {
        Simplecfg::builder::<ServerConfig>()
    }

    #[test]
    fn app_name_sets_defaults() {
        let b = builder().app_name("myapp");
        assert_eq!(b.effective_file_name(), Some("myapp.ini".to_string()));
        assert_eq!(b.effective_search_paths(), vec![SearchPath::Platform]);
    }

    #[test]
    fn override_file_name() {
        let b = builder().app_name("myapp").file_name("custom.toml");
        assert_eq!(b.effective_file_name(), Some("custom.toml".to_string()));
    }

    #[test]
    fn no_discovery_without_names() {
        assert_eq!(builder().effective_file_name(), None);
        let config = builder().no_env().load().unwrap();
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn search_paths_replace() {
        let b = builder().search_paths(vec![SearchPath::Cwd]);
        assert_eq!(b.effective_search_paths(), vec![SearchPath::Cwd]);
    }

    #[test]
    fn add_search_path_appends_to_defaults() {
        let b = builder().add_search_path(SearchPath::Cwd);
        assert_eq!(
            b.effective_search_paths(),
            vec![SearchPath::Platform, SearchPath::Cwd]
        );
    }

    #[test]
    fn set_override_some_added() {
        let b = builder().set_override("port", Some(3000i64));
        assert_eq!(b.overrides.get_key("port"), Some(Value::Integer(3000)));
    }

    #[test]
    fn set_override_none_skipped() {
        let b = builder().set_override::<i64>("port", None);
        assert!(b.overrides.is_empty());
    }

    #[test]
    fn overrides_from_keeps_only_config_fields() {
        #[derive(Serialize)]
        struct Cli {
            port: Option<u16>,
            host: Option<String>,
            verbose: bool,
        }

        let cli = Cli {
            port: Some(9000),
            host: None,
            verbose: true,
        };
        let b = builder().overrides_from(&cli).unwrap();
        assert_eq!(b.overrides.len(), 1);
        assert_eq!(b.overrides.get_key("port"), Some(Value::Integer(9000)));
    }

    #[test]
    fn discovered_ini_file_loaded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("myapp.ini"), "[server]\nport = 3000\n").unwrap();

        let config = builder()
            .app_name("myapp")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn discovered_toml_file_by_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("myapp.toml"), "port = 4000\nmode = \"slow\"\n").unwrap();

        let config = builder()
            .file_name("myapp.toml")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.mode, Mode::Slow);
    }

    #[test]
    fn later_search_path_wins() {
        let global = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        fs::write(global.path().join("myapp.ini"), "[a]\nport = 1\nhost = g\n").unwrap();
        fs::write(local.path().join("myapp.ini"), "[a]\nport = 2\n").unwrap();

        let config = builder()
            .app_name("myapp")
            .search_paths(vec![
                SearchPath::Path(global.path().to_path_buf()),
                SearchPath::Path(local.path().to_path_buf()),
            ])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(config.port, 2);
        assert_eq!(config.host, "g");
    }

    #[test]
    fn explicit_file_beats_discovered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("myapp.ini"), "[a]\nport = 1\n").unwrap();
        let explicit = dir.path().join("override.toml");
        fs::write(&explicit, "port = 2\n").unwrap();

        let config = builder()
            .app_name("myapp")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .toml_file(&explicit)
            .no_env()
            .load()
            .unwrap();
        assert_eq!(config.port, 2);
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = builder()
            .ini_file(dir.path().join("missing.ini"))
            .no_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn platform_search_needs_app_name() {
        let err = builder().file_name("x.ini").no_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::AppNameRequired));
    }

    #[test]
    fn full_precedence_chain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(
            &path,
            "[a]\nhost = file\nport = 1\ndebug = false\nurl = file-url\nmode = slow\n",
        )
        .unwrap();

        let config = builder()
            .ini_file(&path)
            .env_vars([("PORT", "2"), ("DEBUG", "yes"), ("URL", "env-url")])
            .args(["--debug=no", "--url=arg-url"])
            .source(MapSource::from_pairs([("url", "custom-1")]))
            .source(MapSource::from_pairs([("url", "custom-2")]))
            .set_override("mode", Some("fast"))
            .load()
            .unwrap();

        assert_eq!(config.host, "file");
        assert_eq!(config.port, 2);
        assert!(!config.debug);
        assert_eq!(config.url.as_deref(), Some("custom-2"));
        assert_eq!(config.mode, Mode::Fast);
    }

    #[test]
    fn env_prefix_applies() {
        let config = builder()
            .env_vars([("MYAPP__PORT", "5000"), ("PORT", "1")])
            .env_prefix("myapp")
            .load()
            .unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn no_env_ignores_vars() {
        let config = builder()
            .env_vars([("PORT", "5000")])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn malformed_flag_fails_build() {
        let err = builder().no_env().args(["--port"]).load().unwrap_err();
        assert!(matches!(err, ConfigError::MalformedFlag(_)));
    }

    #[test]
    fn field_errors_surface_from_load() {
        let err = builder()
            .no_env()
            .args(["--port=abc", "--mode=medium"])
            .load()
            .unwrap_err();
        match err {
            ConfigError::Fields(errors) => {
                assert!(matches!(errors.get("port"), Some(FieldError::Coercion(_))));
                assert!(errors.contains("mode"));
                assert_eq!(errors.len(), 2);
            }
            other => panic!("Expected Fields, got: {other:?}"),
        }
    }

    #[test]
    fn built_source_is_reusable() {
        let source = builder()
            .no_env()
            .set_override("port", Some(7000i64))
            .build_source()
            .unwrap();
        let first: ServerConfig = bind(&source).unwrap();
        let second: ServerConfig = bind(&source).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.port, 7000);
    }
}
