use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

/// Fleet files are looked up here first...
pub const FLEET_DIR: &str = "gtd";
/// ...then here.
pub const FALLBACK_FLEET_DIR: &str = "configs";

pub const SETTINGS_FILE: &str = ".convoy.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Candidate fleet files for an environment, in lookup order.
pub fn fleet_candidates(root: &Path, env: &str) -> [PathBuf; 2] {
    let file = format!("{env}.yaml");
    [
        root.join(FLEET_DIR).join(&file),
        root.join(FALLBACK_FLEET_DIR).join(&file),
    ]
}

/// The first existing fleet file for `env`, if any.
pub fn fleet_path(root: &Path, env: &str) -> Option<PathBuf> {
    fleet_candidates(root, env)
        .into_iter()
        .find(|p| p.is_file())
}

/// `true` when `dir` holds a fleet directory.
pub fn has_fleet_dir(dir: &Path) -> bool {
    dir.join(FLEET_DIR).is_dir() || dir.join(FALLBACK_FLEET_DIR).is_dir()
}

pub fn settings_path(home: &Path) -> PathBuf {
    home.join(SETTINGS_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn candidates_prefer_gtd_dir() {
        let root = Path::new("/srv/fleet");
        let [first, second] = fleet_candidates(root, "staging");
        assert_eq!(first, PathBuf::from("/srv/fleet/gtd/staging.yaml"));
        assert_eq!(second, PathBuf::from("/srv/fleet/configs/staging.yaml"));
    }

    #[test]
    fn fleet_path_falls_back_to_configs() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("configs")).unwrap();
        std::fs::write(dir.path().join("configs/prod.yaml"), "ecs_cluster: c\n").unwrap();
        assert_eq!(
            fleet_path(dir.path(), "prod"),
            Some(dir.path().join("configs/prod.yaml"))
        );
        assert!(fleet_path(dir.path(), "staging").is_none());
        assert!(has_fleet_dir(dir.path()));
    }

    #[test]
    fn fleet_path_prefers_gtd_when_both_exist() {
        let dir = TempDir::new().unwrap();
        for sub in ["gtd", "configs"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("prod.yaml"), "").unwrap();
        }
        assert_eq!(
            fleet_path(dir.path(), "prod"),
            Some(dir.path().join("gtd/prod.yaml"))
        );
    }
}
