//! Per-invocation context: user settings, the chosen environment and its
//! fleet file.

use anyhow::Context;
use convoy_aws::AwsCli;
use convoy_core::config::FleetConfig;
use convoy_core::settings::Settings;
use convoy_core::ConvoyError;
use std::path::Path;

pub struct Session {
    pub env: String,
    pub settings: Settings,
    pub fleet: FleetConfig,
}

impl Session {
    /// Load `~/.convoy.yaml`, pick the environment (flag, then
    /// `default_env`) and read its fleet file.
    pub fn open(root: &Path, env: Option<&str>) -> anyhow::Result<Self> {
        let settings = Settings::load_default().context("failed to read ~/.convoy.yaml")?;
        let env = resolve_env(env, &settings)?;
        let fleet = FleetConfig::load(root, &env)
            .with_context(|| format!("failed to load fleet config for '{env}'"))?;
        tracing::debug!(env = %env, services = fleet.services.len(), "fleet loaded");
        Ok(Self {
            env,
            settings,
            fleet,
        })
    }

    /// The `aws` driver for this fleet's region and the effective profile.
    pub fn aws(&self, profile: Option<&str>) -> anyhow::Result<AwsCli> {
        let profile = profile
            .map(str::to_string)
            .or_else(|| self.settings.aws_profile.clone());
        let region = Some(self.fleet.ecs_region.clone());
        AwsCli::locate(profile, region).context("cannot drive the AWS control plane")
    }
}

pub fn resolve_env(flag: Option<&str>, settings: &Settings) -> Result<String, ConvoyError> {
    flag.or(settings.default_env.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .ok_or(ConvoyError::NoEnvironment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_default_env() {
        let settings = Settings {
            default_env: Some("staging".into()),
            ..Default::default()
        };
        assert_eq!(resolve_env(Some("prod"), &settings).unwrap(), "prod");
        assert_eq!(resolve_env(None, &settings).unwrap(), "staging");
        assert!(matches!(
            resolve_env(None, &Settings::default()),
            Err(ConvoyError::NoEnvironment)
        ));
        assert!(resolve_env(Some("  "), &Settings::default()).is_err());
    }
}
