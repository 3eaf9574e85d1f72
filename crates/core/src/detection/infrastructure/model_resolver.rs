use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{MODEL_DIR_ENV, SYSTEM_CASCADE_DIRS};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("cascade {name} not found in: {}", format_dirs(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

fn format_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a cascade file by name. Never touches the network.
///
/// Resolution order:
/// 1. Directory named by `FACECASCADE_MODEL_DIR`
/// 2. User cache directory (platform-specific)
/// 3. Current working directory
/// 4. OpenCV system data directories
pub fn resolve(name: &str) -> Result<PathBuf, ModelResolveError> {
    let searched = search_dirs();
    resolve_in(name, &searched)
}

/// Resolve `name` against an explicit list of directories, first match wins.
pub fn resolve_in(name: &str, dirs: &[PathBuf]) -> Result<PathBuf, ModelResolveError> {
    for dir in dirs {
        let candidate = dir.join(name);
        if candidate.is_file() {
            log::debug!("Resolved cascade {name} at {}", candidate.display());
            return Ok(candidate);
        }
    }
    Err(ModelResolveError::NotFound {
        name: name.to_string(),
        searched: dirs.to_vec(),
    })
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = env::var_os(MODEL_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    match model_cache_dir() {
        Ok(dir) => dirs.push(dir),
        Err(e) => log::debug!("Skipping cache directory: {e}"),
    }
    if let Ok(cwd) = env::current_dir() {
        dirs.push(cwd);
    }
    dirs.extend(SYSTEM_CASCADE_DIRS.iter().map(|d| Path::new(d).to_path_buf()));
    dirs
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/facecascade/models/`
/// - Linux: `$XDG_CACHE_HOME/facecascade/models/` or `~/.cache/facecascade/models/`
/// - Windows: `%LOCALAPPDATA%/facecascade/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("facecascade").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("facecascade").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}
