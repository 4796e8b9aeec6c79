//! Config file discovery.
//!
//! Each [`SearchPath`] resolves to one directory. Every directory is checked for
//! `{dir}/{file_name}` and the files that exist are returned in the same
//! priority-ascending order as the search paths, so the caller can layer them
//! with later files winning. Missing files and unresolvable directories (no
//! home directory, say) are silently skipped.
//!
//! Discovery only locates files. Reading and parsing happen when the builder
//! opens each one as an [`IniFileSource`](crate::IniFileSource) or
//! [`TomlFileSource`](crate::TomlFileSource).

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::types::SearchPath;

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is needed by `SearchPath::Platform` to build the platform config
/// directory (e.g. `~/.config/{app_name}/` on Linux); without one it fails with
/// [`ConfigError::AppNameRequired`].
///
/// Returns `Ok(None)` if the directory cannot be determined on this system.
pub fn resolve_search_path(
    sp: &SearchPath,
    app_name: Option<&str>,
) -> Result<Option<PathBuf>, ConfigError> {
    let dir = match sp {
        SearchPath::Platform => {
            let app_name = app_name.ok_or(ConfigError::AppNameRequired)?;
            directories::ProjectDirs::from("", "", app_name).map(|p| p.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => directories::UserDirs::new().map(|u| u.home_dir().join(subdir)),
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    };
    Ok(dir)
}

/// Find every existing `{dir}/{file_name}` across `search_paths`,
/// priority-ascending (last = highest priority).
pub fn locate_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: Option<&str>,
) -> Result<Vec<PathBuf>, ConfigError> {
    let mut found = Vec::new();
    for sp in search_paths {
        let Some(dir) = resolve_search_path(sp, app_name)? else {
            tracing::trace!(search_path = ?sp, "search path unresolved");
            continue;
        };
        let path = dir.join(file_name);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "found config file");
            found.push(path);
        } else {
            tracing::trace!(path = %path.display(), "no config file");
        }
    }
    Ok(found)
}
