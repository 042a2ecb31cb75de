//! Static asset directory resolution.
//!
//! Resolved once at startup. An explicit directory always wins; otherwise
//! production looks next to the executable (the deployed bundle layout) and
//! everything else looks under the working directory (local development).

use std::path::{Path, PathBuf};

use crate::config::{Environment, FrontendConfig};

const BUNDLE_DIR: [&str; 2] = ["frontend", "dist"];

/// Resolve the static directory for this process.
pub fn resolve_static_dir(config: &FrontendConfig, environment: Environment) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    resolve_static_dir_from(config.static_dir.as_deref(), environment, &cwd, exe_dir.as_deref())
}

/// Pure resolution rule, separated from process state.
pub fn resolve_static_dir_from(
    explicit: Option<&Path>,
    environment: Environment,
    cwd: &Path,
    exe_dir: Option<&Path>,
) -> PathBuf {
    if let Some(dir) = explicit {
        return if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            cwd.join(dir)
        };
    }

    let base = match (environment, exe_dir) {
        (Environment::Production, Some(exe_dir)) => exe_dir,
        _ => cwd,
    };
    BUNDLE_DIR.iter().fold(base.to_path_buf(), |path, part| path.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let dir = resolve_static_dir_from(
            Some(Path::new("/srv/www")),
            Environment::Production,
            Path::new("/work"),
            Some(Path::new("/opt/app")),
        );
        assert_eq!(dir, PathBuf::from("/srv/www"));

        let dir = resolve_static_dir_from(Some(Path::new("public")), Environment::Development, Path::new("/work"), None);
        assert_eq!(dir, PathBuf::from("/work/public"));
    }

    #[test]
    fn test_production_uses_executable_dir() {
        let dir = resolve_static_dir_from(None, Environment::Production, Path::new("/work"), Some(Path::new("/var/task")));
        assert_eq!(dir, PathBuf::from("/var/task/frontend/dist"));
    }

    #[test]
    fn test_development_uses_working_dir() {
        let dir = resolve_static_dir_from(None, Environment::Development, Path::new("/work"), Some(Path::new("/var/task")));
        assert_eq!(dir, PathBuf::from("/work/frontend/dist"));
    }

    #[test]
    fn test_production_without_executable_dir() {
        let dir = resolve_static_dir_from(None, Environment::Production, Path::new("/work"), None);
        assert_eq!(dir, PathBuf::from("/work/frontend/dist"));
    }
}
