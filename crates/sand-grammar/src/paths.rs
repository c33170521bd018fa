//! Where compiled grammar libraries are looked up

use std::path::PathBuf;

/// Environment variable pointing at a Sand runtime directory
pub const RUNTIME_ENV: &str = "SAND_RUNTIME";

/// Platform-specific library filename for a grammar
#[must_use]
pub fn grammar_library_name(name: &str) -> String {
    let safe_name = name.replace('-', "_");
    #[cfg(target_os = "macos")]
    {
        format!("lib{safe_name}.dylib")
    }
    #[cfg(target_os = "windows")]
    {
        format!("{safe_name}.dll")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        format!("lib{safe_name}.so")
    }
}

/// Directories searched for compiled grammars, most specific first
#[must_use]
pub fn grammar_search_paths() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(runtime) = std::env::var_os(RUNTIME_ENV) {
        dirs.push(PathBuf::from(runtime).join("grammars"));
    }

    if let Some(config) = config_dir() {
        dirs.push(config.join("sand").join("grammars"));
    }

    if let Some(data) = data_local_dir() {
        dirs.push(data.join("sand").join("grammars"));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    {
        dirs.push(exe_dir.join("grammars"));
        dirs.push(exe_dir);
    }

    dirs
}

/// First existing library for `name` in the search paths
#[must_use]
pub fn find_library(name: &str) -> Option<PathBuf> {
    let lib_name = grammar_library_name(name);
    grammar_search_paths()
        .into_iter()
        .map(|dir| dir.join(&lib_name))
        .find(|path| path.is_file())
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
    #[cfg(windows)]
    {
        std::env::var_os("APPDATA").map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}

fn data_local_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })
    }
    #[cfg(windows)]
    {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
