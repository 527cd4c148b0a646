//! In-memory fakes for the platform traits. Test-only.

use crate::error::{ConvoyError, Result};
use crate::platform::{
    AuthorizationData, ContainerRuntime, ControlPlane, Deployment, EdgeCache, Invalidation,
    RegisterTaskDefinition, Registry, RegistryAuth, Repository, ServiceDescription,
};
use crate::types::{ContainerDefinition, Service, TaskDefinition};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

pub fn task_def(family: &str, revision: u32, image: &str) -> TaskDefinition {
    TaskDefinition {
        task_definition_arn: Some(arn(family, revision)),
        family: family.to_string(),
        revision,
        container_definitions: vec![ContainerDefinition {
            name: family.to_string(),
            image: image.to_string(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn arn(family: &str, revision: u32) -> String {
    format!("arn:aws:ecs:eu-west-1:1:task-definition/{family}:{revision}")
}

/// A service whose live state is already hydrated with `active`.
pub fn live_service(name: &str, registry: &str, active: TaskDefinition) -> Service {
    let mut svc = Service::new(name);
    svc.registry = registry.to_string();
    svc.live.task_definition_arn = active.task_definition_arn.clone().unwrap_or_default();
    svc.live.status = "ACTIVE".to_string();
    svc.live.running_count = 1;
    svc.live.task_definition = Some(active);
    svc
}

fn fail(what: &str) -> ConvoyError {
    ConvoyError::Platform(format!("{what}: injected failure"))
}

// ---------------------------------------------------------------------------
// ControlPlane
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeControlPlane {
    pub services: Vec<ServiceDescription>,
    pub definitions: RefCell<Vec<TaskDefinition>>,
    pub describe_calls: RefCell<Vec<Vec<String>>>,
    pub registered: RefCell<Vec<RegisterTaskDefinition>>,
    pub updates: RefCell<Vec<(String, String, bool)>>,
    pub fail_register: RefCell<HashSet<String>>,
    pub fail_update: RefCell<HashSet<String>>,
    pub fail_describe_definition: RefCell<HashSet<String>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live service running `active`.
    pub fn with_service(mut self, name: &str, active: TaskDefinition) -> Self {
        let arn = active.task_definition_arn.clone().unwrap_or_default();
        self.services.push(ServiceDescription {
            service_name: name.to_string(),
            status: "ACTIVE".to_string(),
            running_count: 2,
            task_definition: Some(arn.clone()),
            deployments: vec![Deployment {
                task_definition: arn,
            }],
        });
        self.definitions.borrow_mut().push(active);
        self
    }

    pub fn with_definition(self, td: TaskDefinition) -> Self {
        self.definitions.borrow_mut().push(td);
        self
    }

    pub fn register_count(&self) -> usize {
        self.registered.borrow().len()
    }
}

impl ControlPlane for FakeControlPlane {
    fn describe_services(
        &self,
        _cluster: &str,
        names: &[String],
    ) -> Result<Vec<ServiceDescription>> {
        assert!(names.len() <= 10, "describe window exceeded: {}", names.len());
        self.describe_calls.borrow_mut().push(names.to_vec());
        Ok(self
            .services
            .iter()
            .filter(|s| names.iter().any(|n| n.eq_ignore_ascii_case(&s.service_name)))
            .cloned()
            .collect())
    }

    fn describe_task_definition(&self, key: &str) -> Result<TaskDefinition> {
        if self.fail_describe_definition.borrow().contains(key) {
            return Err(fail("describe task definition"));
        }
        let defs = self.definitions.borrow();
        defs.iter()
            .find(|td| td.task_definition_arn.as_deref() == Some(key) || td.revision_id() == key)
            .or_else(|| {
                defs.iter()
                    .filter(|td| td.family == key)
                    .max_by_key(|td| td.revision)
            })
            .cloned()
            .ok_or_else(|| ConvoyError::Platform(format!("task definition '{key}' not found")))
    }

    fn register_task_definition(&self, request: &RegisterTaskDefinition) -> Result<TaskDefinition> {
        if self.fail_register.borrow().contains(&request.family) {
            return Err(fail("register task definition"));
        }
        self.registered.borrow_mut().push(request.clone());
        let mut defs = self.definitions.borrow_mut();
        let revision = defs
            .iter()
            .filter(|td| td.family == request.family)
            .map(|td| td.revision)
            .max()
            .unwrap_or(0)
            + 1;
        let td = TaskDefinition {
            task_definition_arn: Some(arn(&request.family, revision)),
            family: request.family.clone(),
            revision,
            container_definitions: request.container_definitions.clone(),
            task_role_arn: request.task_role_arn.clone(),
            execution_role_arn: request.execution_role_arn.clone(),
            cpu: request.cpu.clone(),
            memory: request.memory.clone(),
            network_mode: request.network_mode.clone(),
            requires_compatibilities: request.requires_compatibilities.clone(),
            volumes: request.volumes.clone(),
        };
        defs.push(td.clone());
        Ok(td)
    }

    fn update_service(
        &self,
        _cluster: &str,
        service: &str,
        task_definition: &str,
        force_new_deployment: bool,
    ) -> Result<()> {
        self.updates.borrow_mut().push((
            service.to_string(),
            task_definition.to_string(),
            force_new_deployment,
        ));
        if self.fail_update.borrow().contains(service) {
            return Err(fail("update service"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct FakeRegistry {
    pub repositories: Vec<Repository>,
    /// base64 of `AWS:token-password`.
    pub token: String,
    pub fail_describe: Cell<bool>,
    pub fail_token: Cell<bool>,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            token: "QVdTOnRva2VuLXBhc3N3b3Jk".to_string(),
            fail_describe: Cell::new(false),
            fail_token: Cell::new(false),
        }
    }
}

impl FakeRegistry {
    pub fn with_repository(mut self, name: &str, uri: &str) -> Self {
        self.repositories.push(Repository {
            repository_name: name.to_string(),
            repository_uri: uri.to_string(),
            registry_id: "123456789012".to_string(),
        });
        self
    }
}

impl Registry for FakeRegistry {
    fn describe_repository(&self, name: &str) -> Result<Repository> {
        if self.fail_describe.get() {
            return Err(fail("describe repository"));
        }
        self.repositories
            .iter()
            .find(|r| r.repository_name == name)
            .cloned()
            .ok_or_else(|| ConvoyError::Platform(format!("repository '{name}' not found")))
    }

    fn authorization_token(&self, _registry_id: &str) -> Result<AuthorizationData> {
        if self.fail_token.get() {
            return Err(fail("get authorization token"));
        }
        Ok(AuthorizationData {
            authorization_token: self.token.clone(),
            proxy_endpoint: "https://123456789012.dkr.ecr.eu-west-1.amazonaws.com".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// ContainerRuntime
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRuntime {
    /// `pull <ref>`, `tag <src> <dst>`, `push <ref>`
    pub calls: RefCell<Vec<String>>,
    pub pushed_with: RefCell<Vec<RegistryAuth>>,
    pub fail_pull: Cell<bool>,
    pub fail_tag: Cell<bool>,
    pub fail_push: Cell<bool>,
}

impl FakeRuntime {
    pub fn count(&self, verb: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .count()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn pull(&self, reference: &str, _auth: Option<&RegistryAuth>) -> Result<()> {
        self.calls.borrow_mut().push(format!("pull {reference}"));
        if self.fail_pull.get() {
            return Err(fail("pull"));
        }
        Ok(())
    }

    fn tag(&self, source: &str, target: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("tag {source} {target}"));
        if self.fail_tag.get() {
            return Err(fail("tag"));
        }
        Ok(())
    }

    fn push(&self, reference: &str, auth: &RegistryAuth) -> Result<()> {
        self.calls.borrow_mut().push(format!("push {reference}"));
        self.pushed_with.borrow_mut().push(auth.clone());
        if self.fail_push.get() {
            return Err(fail("push"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EdgeCache
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeEdgeCache {
    /// `(distribution, pattern, caller_reference)`
    pub created: RefCell<Vec<(String, String, String)>>,
    pub existing: Vec<(String, Invalidation)>,
    pub fail: Cell<bool>,
}

impl EdgeCache for FakeEdgeCache {
    fn create_invalidation(
        &self,
        distribution_id: &str,
        pattern: &str,
        caller_reference: &str,
    ) -> Result<Invalidation> {
        if self.fail.get() {
            return Err(fail("create invalidation"));
        }
        let mut created = self.created.borrow_mut();
        created.push((
            distribution_id.to_string(),
            pattern.to_string(),
            caller_reference.to_string(),
        ));
        Ok(Invalidation {
            id: format!("I{}", created.len()),
            status: "InProgress".to_string(),
            create_time: None,
            paths: vec![pattern.to_string()],
        })
    }

    fn list_invalidations(&self, distribution_id: &str) -> Result<Vec<Invalidation>> {
        if self.fail.get() {
            return Err(fail("list invalidations"));
        }
        Ok(self
            .existing
            .iter()
            .filter(|(d, _)| d == distribution_id)
            .map(|(_, inv)| Invalidation {
                paths: Vec::new(),
                ..inv.clone()
            })
            .collect())
    }

    fn get_invalidation(&self, distribution_id: &str, id: &str) -> Result<Invalidation> {
        self.existing
            .iter()
            .find(|(d, inv)| d == distribution_id && inv.id == id)
            .map(|(_, inv)| inv.clone())
            .ok_or_else(|| ConvoyError::Platform(format!("invalidation '{id}' not found")))
    }
}
