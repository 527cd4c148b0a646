//! Per-service deploy: diff, register a new revision when needed, activate
//! it, then republish the image and cascade it to child tasks.
//!
//! A failed registration stops the run. Everything after it (activation,
//! republish, cascade) is recorded on the report and the run moves on.

use crate::cascade;
use crate::config::FleetConfig;
use crate::differ;
use crate::env_file::TaskEnvironment;
use crate::error::{ConvoyError, Result};
use crate::image::{self, ImageRequest};
use crate::platform::{ContainerRuntime, ControlPlane, RegisterTaskDefinition, Registry, RegistryAuth};
use crate::report::{DeployReport, ReportRow, ServiceState, SkipReason, StepOutcome};
use crate::republish::Republisher;
use crate::types::{ChangeReason, DeploymentDecision, Service, TaskDefinition};

// ---------------------------------------------------------------------------
// DeployOptions
// ---------------------------------------------------------------------------

/// Run-level overrides. Applied to each service independently.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub image: Option<String>,
    pub tag: Option<String>,
    pub force: bool,
    pub environment: Option<TaskEnvironment>,
}

impl DeployOptions {
    /// Reject runs that cannot deploy anything before any remote call.
    pub fn validate(&self) -> Result<()> {
        let image = non_empty(self.image.as_deref());
        let tag = non_empty(self.tag.as_deref());
        if image.is_none() && tag.is_none() && !self.force {
            return Err(ConvoyError::NothingToDeploy);
        }
        if let (Some(image), Some(_)) = (image, tag) {
            if image::has_tag(image) {
                return Err(ConvoyError::AmbiguousImageReference(image.to_string()));
            }
        }
        Ok(())
    }

    fn image_request(&self) -> ImageRequest<'_> {
        ImageRequest {
            override_image: non_empty(self.image.as_deref()),
            tag: non_empty(self.tag.as_deref()),
            force: self.force,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler<'a> {
    control_plane: &'a dyn ControlPlane,
    registry: &'a dyn Registry,
    runtime: &'a dyn ContainerRuntime,
    fleet: &'a FleetConfig,
    options: &'a DeployOptions,
    source_auth: Option<&'a RegistryAuth>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        control_plane: &'a dyn ControlPlane,
        registry: &'a dyn Registry,
        runtime: &'a dyn ContainerRuntime,
        fleet: &'a FleetConfig,
        options: &'a DeployOptions,
    ) -> Self {
        Self {
            control_plane,
            registry,
            runtime,
            fleet,
            options,
            source_auth: None,
        }
    }

    /// Credentials for pulling from the source registry during republish.
    pub fn with_source_auth(mut self, auth: Option<&'a RegistryAuth>) -> Self {
        self.source_auth = auth;
        self
    }

    /// Reconcile `services` in order, appending to `report`. On a fatal
    /// error the rows recorded so far stay in `report`.
    pub fn run(&self, services: &[&Service], report: &mut DeployReport) -> Result<()> {
        for service in services {
            self.reconcile_service(service, report)?;
        }
        tracing::info!(
            rows = report.rows.len(),
            skipped = report.skipped.len(),
            errors = report.error_count(),
            "deploy finished"
        );
        Ok(())
    }

    fn reconcile_service(&self, service: &Service, report: &mut DeployReport) -> Result<()> {
        if service.ignore_deploy {
            report.skip(&service.name, SkipReason::Ignored);
            return Ok(());
        }
        let Some(active) = service.live.task_definition.as_ref() else {
            report.skip(&service.name, SkipReason::NoActiveDefinition);
            return Ok(());
        };

        let target_image = image::resolve_target_image(
            &service.name,
            &service.registry,
            active.primary_image(),
            self.options.image_request(),
        )?;
        let decision = differ::diff(
            service,
            active,
            &target_image,
            self.options.environment.as_ref(),
            self.options.force,
        );
        let mut row = ReportRow::service(service, active, &target_image);
        row.reasons = decision.reasons.iter().copied().collect();
        advance(&service.name, ServiceState::Evaluated);

        if !decision.needs_new_revision {
            row.new_revision = active.revision_id();
            row.state = Some(advance(&service.name, ServiceState::Unchanged));
            row.outcome = StepOutcome::Unchanged;
            report.push(row);
            return Ok(());
        }

        advance(&service.name, ServiceState::Registering);
        let request = self.build_revision(service, active, &target_image, &decision);
        let registered = self
            .control_plane
            .register_task_definition(&request)
            .map_err(|e| ConvoyError::Registration {
                family: request.family.clone(),
                detail: e.to_string(),
            })?;
        let revision = registered.revision_id();
        row.new_revision = revision.clone();
        advance(&service.name, ServiceState::Registered);

        advance(&service.name, ServiceState::ServiceUpdating);
        let updated = self.control_plane.update_service(
            &self.fleet.ecs_cluster,
            &service.name,
            &revision,
            self.options.force,
        );
        match updated {
            Ok(()) => {
                row.state = Some(advance(&service.name, ServiceState::Updated));
                row.outcome = StepOutcome::Updated;
            }
            Err(e) => {
                let err = ConvoyError::Activation {
                    service: service.name.clone(),
                    detail: e.to_string(),
                };
                tracing::warn!(error = %err, "service update failed");
                row.state = Some(advance(&service.name, ServiceState::UpdateFailed));
                row.outcome = StepOutcome::error(&service.name, e);
            }
        }
        report.push(row);

        if let Some(target) = service.update_registry.as_deref() {
            advance(&service.name, ServiceState::RegistryRepublishing);
            let republisher = Republisher::new(self.registry, self.runtime, self.source_auth);
            for row in republisher.run(target, &target_image, &self.fleet.repositories) {
                report.push(row);
            }
        }
        if service.update_child_tasks {
            for row in cascade::cascade(
                self.control_plane,
                &service.name,
                &target_image,
                &self.fleet.child_tasks,
            ) {
                report.push(row);
            }
        }
        advance(&service.name, ServiceState::Done);
        Ok(())
    }

    /// Clone the active definition and apply the desired state.
    fn build_revision(
        &self,
        service: &Service,
        active: &TaskDefinition,
        target_image: &str,
        decision: &DeploymentDecision,
    ) -> RegisterTaskDefinition {
        let mut request = RegisterTaskDefinition::from(active);

        // Desired roles are (re)applied on every new revision; an empty one
        // keeps the active value. Secrets need the execution role.
        if !service.task_role_arn.is_empty() {
            request.task_role_arn = Some(service.task_role_arn.clone());
        }
        if !service.execution_role_arn.is_empty() {
            request.execution_role_arn = Some(service.execution_role_arn.clone());
        }

        if let Some(container) = request.container_definitions.first_mut() {
            container.image = target_image.to_string();
            if let Some(env) = self.options.environment.as_ref() {
                if env.has_secrets() && request.execution_role_arn.is_none() {
                    tracing::warn!(
                        service = %service.name,
                        "env file has secrets but no execution role is set"
                    );
                }
                container.environment = env.environment.clone();
                container.secrets = env.secrets.clone();
            }
            if decision.has(ChangeReason::LabelsChanged) {
                container.docker_labels = differ::labels_to_map(&service.labels);
            }
        }
        request
    }
}

fn advance(service: &str, state: ServiceState) -> ServiceState {
    tracing::debug!(service = %service, state = %state, "state");
    state
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
