//! Capabilities convoy needs from the outside world.
//!
//! The engine only talks to these traits. `convoy-aws` implements them on
//! top of the `aws` and `docker` command-line tools; tests use in-memory
//! fakes.

use crate::error::{ConvoyError, Result};
use crate::types::{ContainerDefinition, TaskDefinition};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Control plane
// ---------------------------------------------------------------------------

/// Live record returned by `DescribeServices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescription {
    pub service_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub running_count: i64,
    #[serde(default)]
    pub task_definition: Option<String>,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    #[serde(default)]
    pub task_definition: String,
}

impl ServiceDescription {
    /// Task definition of the first (most recent) deployment, falling back
    /// to the service-level definition.
    pub fn active_task_definition(&self) -> Option<&str> {
        self.deployments
            .first()
            .map(|d| d.task_definition.as_str())
            .filter(|arn| !arn.is_empty())
            .or(self.task_definition.as_deref())
    }
}

/// Payload of `RegisterTaskDefinition`: everything of a [`TaskDefinition`]
/// except the identity the control plane assigns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTaskDefinition {
    pub family: String,
    pub container_definitions: Vec<ContainerDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<serde_json::Value>,
}

impl From<&TaskDefinition> for RegisterTaskDefinition {
    fn from(td: &TaskDefinition) -> Self {
        Self {
            family: td.family.clone(),
            container_definitions: td.container_definitions.clone(),
            task_role_arn: td.task_role_arn.clone(),
            execution_role_arn: td.execution_role_arn.clone(),
            cpu: td.cpu.clone(),
            memory: td.memory.clone(),
            network_mode: td.network_mode.clone(),
            requires_compatibilities: td.requires_compatibilities.clone(),
            volumes: td.volumes.clone(),
        }
    }
}

impl RegisterTaskDefinition {
    pub fn primary_image(&self) -> &str {
        self.container_definitions
            .first()
            .map(|c| c.image.as_str())
            .unwrap_or("")
    }
}

pub trait ControlPlane {
    /// Describe at most ten services of `cluster`.
    fn describe_services(&self, cluster: &str, names: &[String])
        -> Result<Vec<ServiceDescription>>;

    /// Describe a task definition by ARN, `family:revision` or family.
    fn describe_task_definition(&self, task_definition: &str) -> Result<TaskDefinition>;

    fn register_task_definition(&self, request: &RegisterTaskDefinition)
        -> Result<TaskDefinition>;

    fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &str,
        force_new_deployment: bool,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub repository_name: String,
    pub repository_uri: String,
    pub registry_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationData {
    /// base64 of `user:password`.
    pub authorization_token: String,
    #[serde(default)]
    pub proxy_endpoint: String,
}

pub trait Registry {
    /// Describe a repository by name (without tag).
    fn describe_repository(&self, name: &str) -> Result<Repository>;

    /// Short-lived push credentials for a registry.
    fn authorization_token(&self, registry_id: &str) -> Result<AuthorizationData>;
}

// ---------------------------------------------------------------------------
// Container runtime
// ---------------------------------------------------------------------------

/// Credentials for a registry login.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    /// Registry to log in to; empty means "the host in the image reference".
    pub server_address: String,
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server_address", &self.server_address)
            .finish()
    }
}

impl RegistryAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            server_address: String::new(),
        }
    }

    /// Decode a registry authorization token (`base64(user:password)`).
    pub fn from_authorization(data: &AuthorizationData) -> Result<Self> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(data.authorization_token.trim())
            .map_err(|e| ConvoyError::RegistryToken(e.to_string()))?;
        let decoded =
            String::from_utf8(decoded).map_err(|e| ConvoyError::RegistryToken(e.to_string()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| ConvoyError::RegistryToken("expected user:password".to_string()))?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            server_address: data.proxy_endpoint.clone(),
        })
    }
}

pub trait ContainerRuntime {
    fn pull(&self, reference: &str, auth: Option<&RegistryAuth>) -> Result<()>;

    /// Local retag, no network.
    fn tag(&self, source: &str, target: &str) -> Result<()>;

    fn push(&self, reference: &str, auth: &RegistryAuth) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Edge cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invalidation {
    pub id: String,
    pub status: String,
    pub create_time: Option<DateTime<Utc>>,
    pub paths: Vec<String>,
}

pub trait EdgeCache {
    fn create_invalidation(
        &self,
        distribution_id: &str,
        pattern: &str,
        caller_reference: &str,
    ) -> Result<Invalidation>;

    /// Invalidation summaries; `paths` may be empty.
    fn list_invalidations(&self, distribution_id: &str) -> Result<Vec<Invalidation>>;

    fn get_invalidation(&self, distribution_id: &str, id: &str) -> Result<Invalidation>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_definition_prefers_first_deployment() {
        let desc: ServiceDescription = serde_json::from_str(
            r#"{
                "serviceName": "api",
                "status": "ACTIVE",
                "runningCount": 3,
                "taskDefinition": "arn:td/api:6",
                "deployments": [{"taskDefinition": "arn:td/api:7"}, {"taskDefinition": "arn:td/api:6"}]
            }"#,
        )
        .unwrap();
        assert_eq!(desc.active_task_definition(), Some("arn:td/api:7"));

        let bare = ServiceDescription {
            service_name: "api".into(),
            task_definition: Some("arn:td/api:6".into()),
            ..Default::default()
        };
        assert_eq!(bare.active_task_definition(), Some("arn:td/api:6"));
    }

    #[test]
    fn register_payload_drops_identity() {
        let td = TaskDefinition {
            task_definition_arn: Some("arn:td/api:7".into()),
            family: "api".into(),
            revision: 7,
            memory: Some("512".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(RegisterTaskDefinition::from(&td)).unwrap();
        assert_eq!(json["family"], "api");
        assert_eq!(json["memory"], "512");
        assert!(json.get("revision").is_none());
        assert!(json.get("taskDefinitionArn").is_none());
        assert!(json.get("cpu").is_none());
    }

    #[test]
    fn registry_token_decodes_user_and_password() {
        let data = AuthorizationData {
            // base64("AWS:s3cr:et")
            authorization_token: "QVdTOnMzY3I6ZXQ=".into(),
            proxy_endpoint: "https://1.dkr.ecr.eu-west-1.amazonaws.com".into(),
        };
        let auth = RegistryAuth::from_authorization(&data).unwrap();
        assert_eq!(auth.username, "AWS");
        assert_eq!(auth.password, "s3cr:et");
        assert_eq!(auth.server_address, data.proxy_endpoint);
        assert!(!format!("{auth:?}").contains("s3cr"));
    }

    #[test]
    fn registry_token_rejects_garbage() {
        let data = AuthorizationData {
            authorization_token: "!!not-base64!!".into(),
            proxy_endpoint: String::new(),
        };
        assert!(matches!(
            RegistryAuth::from_authorization(&data),
            Err(ConvoyError::RegistryToken(_))
        ));
    }
}
