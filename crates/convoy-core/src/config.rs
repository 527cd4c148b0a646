use crate::error::{ConvoyError, Result};
use crate::paths;
use crate::types::{ChildTask, Distribution, RegistryTarget, Service};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// FleetConfig
// ---------------------------------------------------------------------------

/// One environment's fleet file (`gtd/<env>.yaml` or `configs/<env>.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default)]
    pub ecs_cluster: String,
    #[serde(default)]
    pub ecs_region: String,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub repositories: Vec<RegistryTarget>,
    #[serde(default, alias = "childtasks")]
    pub child_tasks: Vec<ChildTask>,
    #[serde(default)]
    pub cloudfronts: Vec<Distribution>,
}

impl FleetConfig {
    pub fn load(root: &Path, env: &str) -> Result<Self> {
        let path = paths::fleet_path(root, env).ok_or_else(|| ConvoyError::ConfigNotFound {
            env: env.to_string(),
            searched: paths::fleet_candidates(root, env)
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
        tracing::debug!(path = %path.display(), "loading fleet config");
        let data = std::fs::read_to_string(&path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.is_named(name))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.ecs_cluster.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "ecs_cluster is not set".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for svc in &self.services {
            if !seen.insert(svc.name.to_ascii_lowercase()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("service '{}' is declared more than once", svc.name),
                });
            }
            let mut keys = HashSet::new();
            for label in &svc.labels {
                if !keys.insert(label.key.as_str()) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "service '{}' sets label '{}' more than once; every deploy will register a new revision",
                            svc.name, label.key
                        ),
                    });
                }
            }
            if let Some(target) = &svc.update_registry {
                if !self
                    .repositories
                    .iter()
                    .any(|r| r.name.eq_ignore_ascii_case(target))
                {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "service '{}' republishes to '{}', which is not in repositories",
                            svc.name, target
                        ),
                    });
                }
            }
            if svc.update_child_tasks
                && !self
                    .child_tasks
                    .iter()
                    .any(|c| svc.is_named(&c.parent_service))
            {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "service '{}' cascades to child tasks but none name it as parent",
                        svc.name
                    ),
                });
            }
        }

        for child in &self.child_tasks {
            if self.service(&child.parent_service).is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "child task '{}' has unknown parent '{}'",
                        child.name, child.parent_service
                    ),
                });
            }
        }

        for cf in &self.cloudfronts {
            if cf.id.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "cloudfront entry for '{}' has an empty id and is never invalidated",
                        cf.service
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
