use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Desired state (fleet file)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

/// A long-running service declared in the fleet file.
///
/// Everything except `live` is desired state and stays untouched for the
/// whole run. `live` is filled in by [`crate::inventory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Image repository deployed when no override is given (e.g. `acct.dkr/api`).
    #[serde(default)]
    pub registry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, rename = "ignore")]
    pub ignore_deploy: bool,
    /// Name of a [`RegistryTarget`] to republish the deployed image to.
    #[serde(default, rename = "update_ecr", skip_serializing_if = "Option::is_none")]
    pub update_registry: Option<String>,
    #[serde(default, rename = "update_child_task")]
    pub update_child_tasks: bool,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub task_role_arn: String,
    #[serde(default, rename = "task_execution_role_arn")]
    pub execution_role_arn: String,
    #[serde(skip)]
    pub live: LiveState,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Live attributes written once by the inventory fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveState {
    pub task_definition_arn: String,
    pub status: String,
    pub running_count: i64,
    pub task_definition: Option<TaskDefinition>,
}

/// A task definition family deployed with a parent service but not attached
/// to a service of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTask {
    pub name: String,
    #[serde(rename = "parent")]
    pub parent_service: String,
    #[serde(default, rename = "ignore")]
    pub ignore_deploy: bool,
}

/// A repository the deployed image is republished to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTarget {
    pub name: String,
    /// Repository name, optionally with a `:tag` suffix.
    pub repository_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, rename = "ignore")]
    pub ignore_deploy: bool,
}

/// A CDN distribution whose cache is invalidated on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default, rename = "ignore")]
    pub ignore_deploy: bool,
    #[serde(default)]
    pub service: String,
}

// ---------------------------------------------------------------------------
// Control-plane task definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub name: String,
    pub value_from: String,
}

/// One container of a task definition. Fields convoy never edits are kept in
/// `extra` so a cloned definition registers with its port mappings, log
/// configuration, etc. intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<KeyValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub docker_labels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A registered, immutable task definition revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,
    pub family: String,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub container_definitions: Vec<ContainerDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<serde_json::Value>,
}

impl TaskDefinition {
    /// `family:revision`, the form accepted by `UpdateService`.
    pub fn revision_id(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }

    /// The authoritative (first) container.
    pub fn primary_container(&self) -> Option<&ContainerDefinition> {
        self.container_definitions.first()
    }

    pub fn primary_image(&self) -> &str {
        self.primary_container()
            .map(|c| c.image.as_str())
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// DeploymentDecision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    ImageChanged,
    Forced,
    TaskRoleChanged,
    ExecutionRoleChanged,
    EnvFileApplied,
    LabelsChanged,
}

impl ChangeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeReason::ImageChanged => "image_changed",
            ChangeReason::Forced => "forced",
            ChangeReason::TaskRoleChanged => "task_role_changed",
            ChangeReason::ExecutionRoleChanged => "execution_role_changed",
            ChangeReason::EnvFileApplied => "env_file_applied",
            ChangeReason::LabelsChanged => "labels_changed",
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-service verdict of the differ. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentDecision {
    pub needs_new_revision: bool,
    pub reasons: std::collections::BTreeSet<ChangeReason>,
}

impl DeploymentDecision {
    pub fn has(&self, reason: ChangeReason) -> bool {
        self.reasons.contains(&reason)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
