//! Per-user settings in `~/.convoy.yaml`.
//!
//! ```yaml
//! default_env: staging
//! aws_profile: deploy
//! docker_login: ci-bot
//! docker_password: hunter2
//! ```

use crate::error::Result;
use crate::paths;
use crate::platform::RegistryAuth;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_password: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("default_env", &self.default_env)
            .field("aws_profile", &self.aws_profile)
            .field("docker_login", &self.docker_login)
            .field("docker_password", &self.docker_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `~/.convoy.yaml`, or `None` when the home directory is unknown.
pub fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|home| paths::settings_path(&home))
}

impl Settings {
    /// Read settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Read `~/.convoy.yaml` if there is one.
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Pull credentials for the source registry, when both halves are set.
    pub fn source_auth(&self) -> Option<RegistryAuth> {
        let login = self.docker_login.as_deref().filter(|s| !s.is_empty())?;
        let password = self.docker_password.as_deref().filter(|s| !s.is_empty())?;
        Some(RegistryAuth::new(login, password))
    }
}
