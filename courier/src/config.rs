//! Locating the configuration file

use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "COURIER_CONFIG";

/// Searched in order when [`CONFIG_ENV`] is unset
pub const DEFAULT_PATHS: [&str; 2] = ["./courier.config.ron", "/etc/courier/courier.config.ron"];

/// Find the configuration file using the following precedence:
/// 1. `from_env`, the value of [`CONFIG_ENV`], which must exist when set
/// 2. the first of `candidates` that exists
///
/// # Errors
///
/// If `from_env` names a missing file, or none of `candidates` exist.
pub fn locate<P: AsRef<Path>>(
    from_env: Option<&str>,
    candidates: &[P],
) -> anyhow::Result<PathBuf> {
    if let Some(env_path) = from_env {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("{CONFIG_ENV} points to non-existent file: {}", path.display());
    }

    for candidate in candidates {
        let path: &Path = candidate.as_ref();
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    let paths_tried = candidates
        .iter()
        .map(|p| format!("  - {}", p.as_ref().display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}

/// [`locate`] against the process environment and [`DEFAULT_PATHS`]
///
/// # Errors
///
/// See [`locate`].
pub fn find() -> anyhow::Result<PathBuf> {
    let from_env = std::env::var(CONFIG_ENV).ok();
    locate(from_env.as_deref(), &DEFAULT_PATHS)
}
