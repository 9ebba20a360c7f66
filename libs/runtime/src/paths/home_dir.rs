use anyhow::{Context, Result};
use std::path::PathBuf;

/// Resolve the application home directory to an absolute path.
///
/// - `explicit` wins when provided; a leading `~` expands to the platform
///   home and relative paths are anchored at the current directory.
/// - Otherwise the platform home joined with `default_subdir` is used
///   (Unix/macOS: `$HOME/<subdir>`, Windows: `%APPDATA%/<subdir>`).
/// - With `create` set the directory is created including parents.
pub fn resolve_home_dir(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let raw = match explicit {
        Some(p) => expand_tilde(&p)?,
        None => platform_home()?.join(default_subdir),
    };

    let abs = if raw.is_absolute() {
        raw
    } else {
        std::env::current_dir()
            .context("cannot determine current directory")?
            .join(raw)
    };

    if create {
        std::fs::create_dir_all(&abs)
            .with_context(|| format!("failed to create home dir '{}'", abs.display()))?;
    }

    Ok(abs)
}

fn platform_home() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .context("APPDATA is not set")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .context("HOME is not set")
    }
}

fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return platform_home();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return Ok(platform_home()?.join(rest));
    }
    Ok(PathBuf::from(path))
}
