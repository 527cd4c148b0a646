use convoy_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `CONVOY_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `gtd/` or `configs/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_fleet_root(&cwd).unwrap_or(cwd)
}

fn find_fleet_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::has_fleet_dir(dir))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_fleet_dir_above_start() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("gtd")).unwrap();
        let deep = dir.path().join("services/api/src");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_fleet_root(&deep).as_deref(), Some(dir.path()));
    }
}
